// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! Chip-8 instructions and opcodes.
//!
//! Decoding happens in two levels: the top nibble of an opcode selects a
//! family, and the families `0`, `8`, `E` and `F` then look at the low byte
//! or low nibble to pick the actual operation.  The result is an
//! `Instruction`, which the interpreter can execute without having to pick
//! the opcode apart again.

use std::fmt;

use enum_primitive::FromPrimitive;

use MEM_SIZE;

/// An error resulting from an out-of-bounds address.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "address out of bounds: {:#05X}", _0)]
pub struct AddressOutOfBoundsError(pub usize);

/// An error resulting from an opcode outside of the base instruction set.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "unknown opcode: {}", _0)]
pub struct InvalidOpcodeError(pub Opcode);

enum_from_primitive! {
/// A Chip-8 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

impl Register {
    /// Returns the register named by the lowest four bits of the given byte.
    pub fn from_nibble(n: u8) -> Register {
        // Every 4-bit value names a register.
        Register::from_u8(n & 0xF).unwrap()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// A Chip-8 opcode.
///
/// Having this as a wrapper around an ordinary `u16` allows for some nice
/// helper methods to be implemented, which make decoding opcodes much easier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Composes an opcode from the two bytes it is stored as in memory.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode((high as u16) << 8 | low as u16)
    }

    /// Returns the top nibble, which selects the instruction family.
    fn family(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Returns the `Vx` register corresponding to this opcode.
    ///
    /// This does not guarantee that the result is actually meaningful.
    fn vx(&self) -> Register {
        Register::from_nibble((self.0 >> 8) as u8)
    }

    /// Returns the `Vy` register corresponding to this opcode.
    ///
    /// This does not guarantee that the result is actually meaningful.
    fn vy(&self) -> Register {
        Register::from_nibble((self.0 >> 4) as u8)
    }

    /// Returns the `nibble` corresponding to this opcode.
    fn nibble(&self) -> u8 {
        self.0 as u8 & 0xF
    }

    /// Returns the `byte` corresponding to this opcode.
    fn byte(&self) -> u8 {
        self.0 as u8
    }

    /// Returns the `addr` corresponding to this opcode.
    fn addr(&self) -> Address {
        Address(self.0 & 0xFFF)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:04X}", self.0)
    }
}

/// A 12-bit address pointing to a Chip-8 memory location.
///
/// # Examples
///
/// ```
/// use chip8vm::Address;
///
/// let addr = Address::from_u16(0x204).unwrap();
/// assert_eq!(addr.addr(), 0x204);
/// assert!(Address::from_u16(0x1000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(u16);

impl Address {
    /// Verifies whether the given `u16` address value is valid, returning the
    /// corresponding `Address` if it is.
    pub fn from_u16(addr: u16) -> Result<Self, AddressOutOfBoundsError> {
        if addr as usize >= MEM_SIZE {
            Err(AddressOutOfBoundsError(addr as usize))
        } else {
            Ok(Address(addr))
        }
    }

    /// Returns the value of the address.
    pub fn addr(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#05X}", self.0)
    }
}

/// A Chip-8 instruction from the base instruction set.
///
/// # Examples
///
/// ```
/// use chip8vm::{Instruction, Opcode, Register};
///
/// let instr = Instruction::from_opcode(Opcode(0x7510)).unwrap();
/// assert_eq!(instr, Instruction::AddByte(Register::V5, 0x10));
/// ```
///
/// Opcodes outside of the base set are rejected:
///
/// ```
/// use chip8vm::{Instruction, Opcode};
///
/// assert!(Instruction::from_opcode(Opcode(0x00FF)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `CLS` (`00E0`).
    Cls,
    /// `RET` (`00EE`).
    Ret,
    /// `JP addr` (`1nnn`).
    Jp(Address),
    /// `CALL addr` (`2nnn`).
    Call(Address),
    /// `SE Vx, byte` (`3xkk`).
    SeByte(Register, u8),
    /// `SNE Vx, byte` (`4xkk`).
    SneByte(Register, u8),
    /// `SE Vx, Vy` (`5xy0`).
    SeReg(Register, Register),
    /// `LD Vx, byte` (`6xkk`).
    LdByte(Register, u8),
    /// `ADD Vx, byte` (`7xkk`).
    AddByte(Register, u8),
    /// `LD Vx, Vy` (`8xy0`).
    LdReg(Register, Register),
    /// `OR Vx, Vy` (`8xy1`).
    Or(Register, Register),
    /// `AND Vx, Vy` (`8xy2`).
    And(Register, Register),
    /// `XOR Vx, Vy` (`8xy3`).
    Xor(Register, Register),
    /// `ADD Vx, Vy` (`8xy4`).
    AddReg(Register, Register),
    /// `SUB Vx, Vy` (`8xy5`).
    Sub(Register, Register),
    /// `SHR Vx, Vy` (`8xy6`).
    Shr(Register, Register),
    /// `SUBN Vx, Vy` (`8xy7`).
    Subn(Register, Register),
    /// `SHL Vx, Vy` (`8xyE`).
    Shl(Register, Register),
    /// `SNE Vx, Vy` (`9xy0`).
    SneReg(Register, Register),
    /// `LD I, addr` (`Annn`).
    LdI(Address),
    /// `JP V0, addr` (`Bnnn`).
    JpV0(Address),
    /// `RND Vx, byte` (`Cxkk`).
    Rnd(Register, u8),
    /// `DRW Vx, Vy, nibble` (`Dxyn`).
    Drw(Register, Register, u8),
    /// `SKP Vx` (`Ex9E`).
    Skp(Register),
    /// `SKNP Vx` (`ExA1`).
    Sknp(Register),
    /// `LD Vx, DT` (`Fx07`).
    LdRegDt(Register),
    /// `LD Vx, K` (`Fx0A`).
    LdKey(Register),
    /// `LD DT, Vx` (`Fx15`).
    LdDtReg(Register),
    /// `LD ST, Vx` (`Fx18`).
    LdSt(Register),
    /// `ADD I, Vx` (`Fx1E`).
    AddI(Register),
    /// `LD F, Vx` (`Fx29`).
    LdF(Register),
    /// `LD B, Vx` (`Fx33`).
    LdB(Register),
    /// `LD [I], Vx` (`Fx55`).
    LdDerefIReg(Register),
    /// `LD Vx, [I]` (`Fx65`).
    LdRegDerefI(Register),
}

impl Instruction {
    /// Returns the instruction corresponding to the given opcode.
    pub fn from_opcode(opcode: Opcode) -> Result<Self, InvalidOpcodeError> {
        use self::Instruction::*;

        let (vx, vy) = (opcode.vx(), opcode.vy());
        Ok(match opcode.family() {
            0x0 => match opcode.byte() {
                0xE0 if opcode.0 == 0x00E0 => Cls,
                0xEE if opcode.0 == 0x00EE => Ret,
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            0x1 => Jp(opcode.addr()),
            0x2 => Call(opcode.addr()),
            0x3 => SeByte(vx, opcode.byte()),
            0x4 => SneByte(vx, opcode.byte()),
            0x5 if opcode.nibble() == 0 => SeReg(vx, vy),
            0x6 => LdByte(vx, opcode.byte()),
            0x7 => AddByte(vx, opcode.byte()),
            0x8 => match opcode.nibble() {
                0x0 => LdReg(vx, vy),
                0x1 => Or(vx, vy),
                0x2 => And(vx, vy),
                0x3 => Xor(vx, vy),
                0x4 => AddReg(vx, vy),
                0x5 => Sub(vx, vy),
                0x6 => Shr(vx, vy),
                0x7 => Subn(vx, vy),
                0xE => Shl(vx, vy),
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            0x9 if opcode.nibble() == 0 => SneReg(vx, vy),
            0xA => LdI(opcode.addr()),
            0xB => JpV0(opcode.addr()),
            0xC => Rnd(vx, opcode.byte()),
            0xD => Drw(vx, vy, opcode.nibble()),
            0xE => match opcode.byte() {
                0x9E => Skp(vx),
                0xA1 => Sknp(vx),
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            0xF => match opcode.byte() {
                0x07 => LdRegDt(vx),
                0x0A => LdKey(vx),
                0x15 => LdDtReg(vx),
                0x18 => LdSt(vx),
                0x1E => AddI(vx),
                0x29 => LdF(vx),
                0x33 => LdB(vx),
                0x55 => LdDerefIReg(vx),
                0x65 => LdRegDerefI(vx),
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            _ => return Err(InvalidOpcodeError(opcode)),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(addr) => write!(f, "JP {}", addr),
            Call(addr) => write!(f, "CALL {}", addr),
            SeByte(reg, b) => write!(f, "SE {}, #{:02X}", reg, b),
            SneByte(reg, b) => write!(f, "SNE {}, #{:02X}", reg, b),
            SeReg(reg1, reg2) => write!(f, "SE {}, {}", reg1, reg2),
            LdByte(reg, b) => write!(f, "LD {}, #{:02X}", reg, b),
            AddByte(reg, b) => write!(f, "ADD {}, #{:02X}", reg, b),
            LdReg(reg1, reg2) => write!(f, "LD {}, {}", reg1, reg2),
            Or(reg1, reg2) => write!(f, "OR {}, {}", reg1, reg2),
            And(reg1, reg2) => write!(f, "AND {}, {}", reg1, reg2),
            Xor(reg1, reg2) => write!(f, "XOR {}, {}", reg1, reg2),
            AddReg(reg1, reg2) => write!(f, "ADD {}, {}", reg1, reg2),
            Sub(reg1, reg2) => write!(f, "SUB {}, {}", reg1, reg2),
            Shr(reg1, reg2) => write!(f, "SHR {}, {}", reg1, reg2),
            Subn(reg1, reg2) => write!(f, "SUBN {}, {}", reg1, reg2),
            Shl(reg1, reg2) => write!(f, "SHL {}, {}", reg1, reg2),
            SneReg(reg1, reg2) => write!(f, "SNE {}, {}", reg1, reg2),
            LdI(addr) => write!(f, "LD I, {}", addr),
            JpV0(addr) => write!(f, "JP V0, {}", addr),
            Rnd(reg, b) => write!(f, "RND {}, #{:02X}", reg, b),
            Drw(reg1, reg2, n) => write!(f, "DRW {}, {}, {}", reg1, reg2, n),
            Skp(reg) => write!(f, "SKP {}", reg),
            Sknp(reg) => write!(f, "SKNP {}", reg),
            LdRegDt(reg) => write!(f, "LD {}, DT", reg),
            LdKey(reg) => write!(f, "LD {}, K", reg),
            LdDtReg(reg) => write!(f, "LD DT, {}", reg),
            LdSt(reg) => write!(f, "LD ST, {}", reg),
            AddI(reg) => write!(f, "ADD I, {}", reg),
            LdF(reg) => write!(f, "LD F, {}", reg),
            LdB(reg) => write!(f, "LD B, {}", reg),
            LdDerefIReg(reg) => write!(f, "LD [I], {}", reg),
            LdRegDerefI(reg) => write!(f, "LD {}, [I]", reg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that every family decodes to the expected instruction.
    #[test]
    fn decode_families() {
        use self::Instruction::*;
        use Register::*;

        let addr = |a| Address::from_u16(a).unwrap();
        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x1ABC, Jp(addr(0xABC))),
            (0x2345, Call(addr(0x345))),
            (0x3A12, SeByte(VA, 0x12)),
            (0x4B34, SneByte(VB, 0x34)),
            (0x5120, SeReg(V1, V2)),
            (0x63FF, LdByte(V3, 0xFF)),
            (0x7401, AddByte(V4, 0x01)),
            (0x8560, LdReg(V5, V6)),
            (0x8561, Or(V5, V6)),
            (0x8562, And(V5, V6)),
            (0x8563, Xor(V5, V6)),
            (0x8564, AddReg(V5, V6)),
            (0x8565, Sub(V5, V6)),
            (0x8566, Shr(V5, V6)),
            (0x8567, Subn(V5, V6)),
            (0x856E, Shl(V5, V6)),
            (0x9780, SneReg(V7, V8)),
            (0xA123, LdI(addr(0x123))),
            (0xB456, JpV0(addr(0x456))),
            (0xC90F, Rnd(V9, 0x0F)),
            (0xDAB5, Drw(VA, VB, 5)),
            (0xEC9E, Skp(VC)),
            (0xEDA1, Sknp(VD)),
            (0xFE07, LdRegDt(VE)),
            (0xFF0A, LdKey(VF)),
            (0xF015, LdDtReg(V0)),
            (0xF118, LdSt(V1)),
            (0xF21E, AddI(V2)),
            (0xF329, LdF(V3)),
            (0xF433, LdB(V4)),
            (0xF555, LdDerefIReg(V5)),
            (0xF665, LdRegDerefI(V6)),
        ];

        for &(op, ins) in cases.iter() {
            assert_eq!(
                Instruction::from_opcode(Opcode(op)),
                Ok(ins),
                "case {:#06X}",
                op
            );
        }
    }

    /// Tests that opcodes outside the base set are rejected.
    #[test]
    fn decode_unknown() {
        let cases = [
            0x0000, 0x00E1, 0x0123, 0x01E0, 0x00FF, 0x5121, 0x8008, 0x800F, 0x9001, 0xE000,
            0xE09F, 0xF000, 0xF030, 0xF075, 0xFFFF,
        ];

        for &op in cases.iter() {
            assert_eq!(
                Instruction::from_opcode(Opcode(op)),
                Err(InvalidOpcodeError(Opcode(op))),
                "case {:#06X}",
                op
            );
        }
    }

    #[test]
    fn address_bounds() {
        assert_eq!(Address::from_u16(0x000).map(|a| a.addr()), Ok(0x000));
        assert_eq!(Address::from_u16(0xFFF).map(|a| a.addr()), Ok(0xFFF));
        assert_eq!(
            Address::from_u16(0x1000),
            Err(AddressOutOfBoundsError(0x1000))
        );
        assert_eq!(
            Address::from_u16(0xFFFF),
            Err(AddressOutOfBoundsError(0xFFFF))
        );
    }

    #[test]
    fn opcode_from_bytes() {
        assert_eq!(Opcode::from_bytes(0xD1, 0x25), Opcode(0xD125));
    }

    #[test]
    fn display_instruction() {
        let ins = Instruction::from_opcode(Opcode(0x2345)).unwrap();
        assert_eq!(ins.to_string(), "CALL 0x345");
        let ins = Instruction::from_opcode(Opcode(0x6A0F)).unwrap();
        assert_eq!(ins.to_string(), "LD VA, #0F");
    }
}
