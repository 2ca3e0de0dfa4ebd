/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The subroutine call stack.

/// The number of return addresses the stack can hold.
pub const STACK_SIZE: usize = 16;

/// An error resulting from a `CALL` with a full stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "call stack overflowed (depth {})", _0)]
pub struct StackOverflowError(pub usize);

/// An error resulting from a `RET` with an empty stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "no subroutine to return from")]
pub struct StackUnderflowError;

/// A bounded stack of return addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    entries: [u16; STACK_SIZE],
    /// The number of entries in use.
    sp: usize,
}

impl Stack {
    /// Returns an empty stack.
    pub fn new() -> Self {
        Stack::default()
    }

    /// Pushes an address, leaving the stack untouched if it is full.
    pub fn push(&mut self, addr: u16) -> Result<(), StackOverflowError> {
        if self.sp == STACK_SIZE {
            return Err(StackOverflowError(self.sp));
        }
        self.entries[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pops the most recently pushed address.
    pub fn pop(&mut self) -> Result<u16, StackUnderflowError> {
        if self.sp == 0 {
            return Err(StackUnderflowError);
        }
        self.sp -= 1;
        Ok(self.entries[self.sp])
    }

    /// Returns the number of addresses on the stack.
    pub fn depth(&self) -> usize {
        self.sp
    }

    /// Empties the stack and zeroes its storage.
    pub fn clear(&mut self) {
        *self = Stack::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_order() {
        let mut stack = Stack::new();
        stack.push(0x202).unwrap();
        stack.push(0x404).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(), Ok(0x404));
        assert_eq!(stack.pop(), Ok(0x202));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn overflow_drops_push() {
        let mut stack = Stack::new();
        for i in 0..STACK_SIZE {
            stack.push(i as u16 * 2).unwrap();
        }
        assert_eq!(stack.push(0xABC), Err(StackOverflowError(STACK_SIZE)));
        assert_eq!(stack.depth(), STACK_SIZE);
        assert_eq!(stack.pop(), Ok((STACK_SIZE as u16 - 1) * 2));
    }

    #[test]
    fn underflow_is_reported() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(StackUnderflowError));
        assert_eq!(stack.depth(), 0);
    }
}
