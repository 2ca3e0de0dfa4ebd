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

//! The Chip-8 interpreter.
//!
//! The main focus of this module is the `Interpreter` struct, which contains
//! the state of a Chip-8 machine and provides the main interface to be used
//! by the front-end.  Behaviour that differs between historical
//! implementations (the "quirks") is selected at runtime through the
//! `Options` struct.
//!
//! Faults caused by the running program (unknown opcodes, returning with an
//! empty call stack, calling with a full one) are logged and otherwise
//! ignored: `step` never fails, and the program keeps running.

use std::default::Default;
use std::io::Read;
use std::num::Wrapping;
use std::u8;

use failure::{Error, ResultExt};
use rand::{self, Rng, SeedableRng, XorShiftRng};

use FONT_START;
use MEM_SIZE;
use PROG_SIZE;
use PROG_START;
use Register;
use display::{self, HEX_HEIGHT, HEX_SPRITES};
use input::{self, Key};
use instruction::{Instruction, Opcode};
use stack::Stack;

/// Mask applied to every memory address; accesses past the end wrap around.
const ADDR_MASK: usize = MEM_SIZE - 1;

/// An error resulting from an input program being too large.
#[derive(Debug, Fail)]
#[fail(display = "input program is too large (at most {} bytes fit)", _0)]
pub struct ProgramTooLargeError(pub usize);

/// Options for the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Whether `OR`, `AND` and `XOR` reset `VF` to 0 (default `true`).
    pub logic_resets_vf: bool,
    /// Whether `SHR` and `SHL` copy `Vy` into `Vx` before shifting (default
    /// `true`).
    pub shift_copies_vy: bool,
    /// Whether `LD [I], Vx` and `LD Vx, [I]` leave `I` pointing just past the
    /// transferred block (default `true`).
    pub load_store_increments_i: bool,
    /// Whether `ADD I, Vx` sets `VF` when `I` leaves the 12-bit address space
    /// (default `false`).
    pub add_i_sets_vf: bool,
    /// Whether sprites wrap around the edges of the display instead of being
    /// clipped (default `false`).
    pub wrap_sprites: bool,
    /// A fixed seed for the random number generator (default `None`, meaning
    /// a fresh seed on every run).  An all-zero seed is not usable and is
    /// treated as `None`.
    pub seed: Option<[u32; 4]>,
}

impl Options {
    /// Returns the default set of options, matching the original COSMAC VIP
    /// interpreter.
    pub fn new() -> Self {
        Options {
            logic_resets_vf: true,
            shift_copies_vy: true,
            load_store_increments_i: true,
            add_i_sets_vf: false,
            wrap_sprites: false,
            seed: None,
        }
    }

    /// Returns the set of options most later interpreters (and most ROMs
    /// written for them) expect.
    pub fn modern() -> Self {
        Options {
            logic_resets_vf: false,
            shift_copies_vy: false,
            load_store_increments_i: false,
            ..Options::new()
        }
    }

    /// Returns a set of options useful for testing (e.g. a fixed seed).
    pub fn testing() -> Self {
        Options {
            seed: Some([0x1234_5678, 0x9ABC_DEF0, 0x0F1E_2D3C, 0x4B5A_6978]),
            ..Options::new()
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// The outcome of a single call to `Interpreter::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The given instruction was fetched and executed.
    Executed(Instruction),
    /// The interpreter is waiting for a key press; nothing was done.
    WaitingForKey,
    /// The fetched opcode is not part of the instruction set and was skipped.
    Unknown(Opcode),
}

/// A Chip-8 interpreter.
///
/// This struct contains the entire state of a Chip-8 machine and provides
/// all the expected methods for interacting with it, such as stepping
/// through execution and inspecting the internal state.
///
/// # Examples
///
/// ```
/// use chip8vm::{Interpreter, Register, Step};
///
/// let mut interpreter = Interpreter::new();
/// // LD V3, #2A
/// interpreter.load_program(&mut &[0x63u8, 0x2A][..]).unwrap();
/// match interpreter.step() {
///     Step::Executed(_) => {}
///     other => panic!("unexpected {:?}", other),
/// }
/// assert_eq!(interpreter.register(Register::V3), 0x2A);
/// assert_eq!(interpreter.pc(), 0x202);
/// ```
pub struct Interpreter {
    /// The internal memory.
    mem: [u8; MEM_SIZE],
    /// The display buffer.
    display: display::Buffer,
    /// The input state.
    input: input::State,
    /// The general-purpose registers `V0`-`VF`.
    regs: [Wrapping<u8>; 16],
    /// The special register `I`.
    reg_i: u16,
    /// The delay timer.
    reg_dt: u8,
    /// The sound timer.
    reg_st: u8,
    /// The program counter.
    pc: u16,
    /// The call stack (for returning from subroutines).
    call_stack: Stack,
    /// The register waiting to receive the next key press, if any.
    key_wait: Option<Register>,
    /// The source of `RND` values.
    rng: XorShiftRng,

    /// Whether to reset `VF` on logical operations.
    logic_resets_vf: bool,
    /// Whether shifts read from `Vy`.
    shift_copies_vy: bool,
    /// Whether block loads and stores advance `I`.
    load_store_increments_i: bool,
    /// Whether `ADD I, Vx` reports overflow in `VF`.
    add_i_sets_vf: bool,
    /// Whether sprites wrap around the display.
    wrap_sprites: bool,
}

impl Interpreter {
    /// Returns a new interpreter with the default options.
    pub fn new() -> Self {
        Interpreter::with_options(Options::default())
    }

    /// Returns a new interpreter using the given options.
    pub fn with_options(options: Options) -> Self {
        let rng = match options.seed {
            Some(seed) if seed != [0; 4] => XorShiftRng::from_seed(seed),
            _ => rand::weak_rng(),
        };
        let mut interpreter = Interpreter {
            mem: [0; MEM_SIZE],
            display: display::Buffer::new(),
            input: input::State::new(),
            regs: [Wrapping(0); 16],
            reg_i: 0,
            reg_dt: 0,
            reg_st: 0,
            pc: PROG_START as u16,
            call_stack: Stack::new(),
            key_wait: None,
            rng,

            logic_resets_vf: options.logic_resets_vf,
            shift_copies_vy: options.shift_copies_vy,
            load_store_increments_i: options.load_store_increments_i,
            add_i_sets_vf: options.add_i_sets_vf,
            wrap_sprites: options.wrap_sprites,
        };
        interpreter.reset();
        interpreter
    }

    /// Puts the machine back into its power-on state.
    ///
    /// Memory is cleared apart from the hex digit font, so any program must
    /// be (re)loaded afterwards.
    pub fn reset(&mut self) {
        self.mem = [0; MEM_SIZE];
        for (i, sprite) in HEX_SPRITES.iter().enumerate() {
            let start = FONT_START + i * HEX_HEIGHT;
            self.mem[start..start + HEX_HEIGHT].copy_from_slice(sprite);
        }

        self.display = display::Buffer::new();
        self.input.clear();
        self.regs = [Wrapping(0); 16];
        self.reg_i = 0;
        self.reg_dt = 0;
        self.reg_st = 0;
        self.pc = PROG_START as u16;
        self.call_stack.clear();
        self.key_wait = None;
    }

    /// Loads program data from the specified source, returning its size.
    pub fn load_program<R: Read>(&mut self, input: &mut R) -> Result<usize, Error> {
        let mut program = Vec::with_capacity(PROG_SIZE);
        input
            .take(PROG_SIZE as u64 + 1)
            .read_to_end(&mut program)
            .context("could not read program")?;
        if program.len() > PROG_SIZE {
            return Err(ProgramTooLargeError(PROG_SIZE).into());
        }

        self.mem[PROG_START..PROG_START + program.len()].copy_from_slice(&program);
        info!("loaded {} byte program", program.len());
        Ok(program.len())
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Returns a mutable reference to the display buffer.
    pub fn display_mut(&mut self) -> &mut display::Buffer {
        &mut self.display
    }

    /// Returns a reference to the input state.
    pub fn input(&self) -> &input::State {
        &self.input
    }

    /// Returns a mutable reference to the input state.
    pub fn input_mut(&mut self) -> &mut input::State {
        &mut self.input
    }

    /// Returns a reference to the internal memory.
    pub fn mem(&self) -> &[u8; MEM_SIZE] {
        &self.mem
    }

    /// Returns a mutable reference to the internal memory.
    pub fn mem_mut(&mut self) -> &mut [u8; MEM_SIZE] {
        &mut self.mem
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> u16 {
        self.reg_i
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: u16) {
        self.reg_i = val;
    }

    /// Returns the value of the delay timer.
    pub fn dt(&self) -> u8 {
        self.reg_dt
    }

    /// Sets the value of the delay timer.
    pub fn set_dt(&mut self, val: u8) {
        self.reg_dt = val;
    }

    /// Returns the value of the sound timer.
    pub fn st(&self) -> u8 {
        self.reg_st
    }

    /// Sets the value of the sound timer.
    pub fn set_st(&mut self, val: u8) {
        self.reg_st = val;
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize].0
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg as usize].0 = val
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the value of the program counter.
    pub fn set_pc(&mut self, val: u16) {
        self.pc = val;
    }

    /// Returns the number of return addresses on the call stack.
    pub fn stack_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Returns the register waiting for a key press, if the interpreter is
    /// suspended on `LD Vx, K`.
    pub fn waiting_for_key(&self) -> Option<Register> {
        self.key_wait
    }

    /// Returns whether the buzzer should currently be sounding.
    pub fn sound_active(&self) -> bool {
        self.reg_st != 0
    }

    /// Returns the opcode at the program counter.
    pub fn current_opcode(&self) -> Opcode {
        let high = self.read(self.pc as usize);
        let low = self.read(self.pc as usize + 1);
        Opcode::from_bytes(high, low)
    }

    /// Counts both timers down by the given number of 60 Hz ticks, stopping
    /// at zero.
    pub fn tick_timers(&mut self, ticks: u32) {
        let ticks = if ticks > u8::MAX as u32 {
            u8::MAX
        } else {
            ticks as u8
        };
        self.reg_dt = self.reg_dt.saturating_sub(ticks);
        self.reg_st = self.reg_st.saturating_sub(ticks);
    }

    /// Performs a single execution step.
    ///
    /// While waiting for a key press, this does nothing until one of the key
    /// lines is pressed; the lowest pressed key is then stored and the next
    /// instruction is executed right away.
    pub fn step(&mut self) -> Step {
        if let Some(reg) = self.key_wait {
            match self.input.lowest_pressed() {
                Some(key) => {
                    debug!("got key {:?} for {}", key, reg);
                    self.set_register(reg, key as u8);
                    self.key_wait = None;
                }
                None => return Step::WaitingForKey,
            }
        }

        let addr = self.pc;
        let opcode = self.current_opcode();
        self.pc = self.pc.wrapping_add(2);

        match Instruction::from_opcode(opcode) {
            Ok(ins) => {
                trace!("{:#05X}: {}", addr, ins);
                if let Err(e) = self.execute(ins) {
                    warn!("{:#05X}: {}", addr, e);
                    for cause in e.iter_causes() {
                        warn!("caused by: {}", cause);
                    }
                }
                Step::Executed(ins)
            }
            Err(e) => {
                warn!("{:#05X}: {}; skipping", addr, e);
                Step::Unknown(opcode)
            }
        }
    }

    /// Executes the given instruction in the current interpreter context.
    ///
    /// The program counter is expected to already point past the instruction,
    /// as it does after a fetch.  On error the instruction has been abandoned
    /// without changing any state.
    pub fn execute(&mut self, ins: Instruction) -> Result<(), Error> {
        use self::Instruction::*;

        match ins {
            Cls => self.display.clear(),
            Ret => {
                self.pc = self.call_stack
                    .pop()
                    .with_context(|_| format!("error executing {}", ins))?;
            }
            Jp(addr) => self.pc = addr.addr(),
            Call(addr) => {
                self.call_stack
                    .push(self.pc)
                    .with_context(|_| format!("error executing {}", ins))?;
                self.pc = addr.addr();
            }
            SeByte(reg, b) => if self.register(reg) == b {
                self.skip();
            },
            SneByte(reg, b) => if self.register(reg) != b {
                self.skip();
            },
            SeReg(reg1, reg2) => if self.register(reg1) == self.register(reg2) {
                self.skip();
            },
            LdByte(reg, b) => self.set_register(reg, b),
            AddByte(reg, b) => self.regs[reg as usize] += Wrapping(b),
            LdReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.set_register(reg1, r2);
            }
            Or(reg1, reg2) => self.logic(reg1, reg2, |a, b| a | b),
            And(reg1, reg2) => self.logic(reg1, reg2, |a, b| a & b),
            Xor(reg1, reg2) => self.logic(reg1, reg2, |a, b| a ^ b),
            AddReg(reg1, reg2) => self.add(reg1, reg2),
            Sub(reg1, reg2) => {
                let (r1, r2) = (self.register(reg1), self.register(reg2));
                self.sub(reg1, r1, r2);
            }
            Shr(reg1, reg2) => self.shr(reg1, reg2),
            Subn(reg1, reg2) => {
                let (r1, r2) = (self.register(reg1), self.register(reg2));
                self.sub(reg1, r2, r1);
            }
            Shl(reg1, reg2) => self.shl(reg1, reg2),
            SneReg(reg1, reg2) => if self.register(reg1) != self.register(reg2) {
                self.skip();
            },
            LdI(addr) => self.reg_i = addr.addr(),
            JpV0(addr) => {
                self.pc = addr.addr() + self.register(Register::V0) as u16;
            }
            Rnd(reg, b) => {
                let r = self.rng.gen::<u8>();
                self.set_register(reg, r & b);
            }
            Drw(reg1, reg2, n) => self.drw(reg1, reg2, n),
            Skp(reg) => if self.input.is_pressed(Key::from_byte(self.register(reg))) {
                self.skip();
            },
            Sknp(reg) => if !self.input.is_pressed(Key::from_byte(self.register(reg))) {
                self.skip();
            },
            LdRegDt(reg) => {
                let dt = self.dt();
                self.set_register(reg, dt);
            }
            LdKey(reg) => {
                debug!("waiting for key press into {}", reg);
                self.key_wait = Some(reg);
            }
            LdDtReg(reg) => {
                let r = self.register(reg);
                self.set_dt(r);
            }
            LdSt(reg) => {
                let r = self.register(reg);
                self.set_st(r);
            }
            AddI(reg) => self.add_i(reg),
            LdF(reg) => {
                let digit = self.register(reg) as usize;
                self.reg_i = (FONT_START + HEX_HEIGHT * digit) as u16;
            }
            LdB(reg) => self.ld_b(reg),
            LdDerefIReg(reg) => self.ld_deref_i_reg(reg),
            LdRegDerefI(reg) => self.ld_reg_deref_i(reg),
        }

        Ok(())
    }

    /// Reads the byte at the given address, wrapping around the end of
    /// memory.
    fn read(&self, addr: usize) -> u8 {
        self.mem[addr & ADDR_MASK]
    }

    /// Writes the byte at the given address, wrapping around the end of
    /// memory.
    fn write(&mut self, addr: usize, val: u8) {
        self.mem[addr & ADDR_MASK] = val;
    }

    /// Skips over the next instruction.
    fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Sets `reg1` to `reg1 + reg2`, setting `VF` to 1 on carry or 0
    /// otherwise.
    fn add(&mut self, reg1: Register, reg2: Register) {
        let sum = self.register(reg1) as u16 + self.register(reg2) as u16;
        self.set_register(reg1, sum as u8);
        self.set_register(Register::VF, (sum > u8::MAX as u16) as u8);
    }

    /// Implements `ADD I, Vx`.
    fn add_i(&mut self, reg: Register) {
        let sum = self.reg_i as u32 + self.register(reg) as u32;
        self.reg_i = sum as u16;
        if self.add_i_sets_vf {
            self.set_register(Register::VF, (sum > ADDR_MASK as u32) as u8);
        }
    }

    /// Combines `reg1` and `reg2` into `reg1` using `op`, then clears `VF` if
    /// the interpreter is configured to do so.
    fn logic<F>(&mut self, reg1: Register, reg2: Register, op: F)
    where
        F: FnOnce(u8, u8) -> u8,
    {
        let val = op(self.register(reg1), self.register(reg2));
        self.set_register(reg1, val);
        if self.logic_resets_vf {
            self.set_register(Register::VF, 0);
        }
    }

    /// Stores `a - b` in `reg`, setting `VF` to 1 if `a` is strictly greater
    /// than `b` or 0 otherwise.
    fn sub(&mut self, reg: Register, a: u8, b: u8) {
        self.set_register(reg, a.wrapping_sub(b));
        self.set_register(Register::VF, (a > b) as u8);
    }

    /// Returns the value a shift of `reg1` operates on.
    fn shift_source(&self, reg1: Register, reg2: Register) -> u8 {
        if self.shift_copies_vy {
            self.register(reg2)
        } else {
            self.register(reg1)
        }
    }

    /// Shifts left into `reg1`, setting `VF` to the old highest bit.
    fn shl(&mut self, reg1: Register, reg2: Register) {
        let val = self.shift_source(reg1, reg2);
        self.set_register(reg1, val << 1);
        self.set_register(Register::VF, val >> 7);
    }

    /// Shifts right into `reg1`, setting `VF` to the old lowest bit.
    fn shr(&mut self, reg1: Register, reg2: Register) {
        let val = self.shift_source(reg1, reg2);
        self.set_register(reg1, val >> 1);
        self.set_register(Register::VF, val & 1);
    }

    /// Implements the `DRW` operation.
    fn drw(&mut self, reg1: Register, reg2: Register, n: u8) {
        let start = self.reg_i as usize;
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;

        let mut sprite = [0u8; 15];
        let rows = &mut sprite[..n as usize];
        for (j, row) in rows.iter_mut().enumerate() {
            *row = self.read(start + j);
        }

        let collision = self.display.draw_sprite(rows, x, y, self.wrap_sprites);
        self.set_register(Register::VF, collision as u8);
    }

    /// Implements the `LD B, Vx` operation.
    fn ld_b(&mut self, reg: Register) {
        let val = self.register(reg);
        let addr = self.reg_i as usize;

        self.write(addr, val / 100);
        self.write(addr + 1, val % 100 / 10);
        self.write(addr + 2, val % 10);
    }

    /// Implements the `LD [I], Vx` operation.
    fn ld_deref_i_reg(&mut self, reg: Register) {
        let last = reg as usize;
        let start = self.reg_i as usize;

        for n in 0..last + 1 {
            let val = self.regs[n].0;
            self.write(start + n, val);
        }
        if self.load_store_increments_i {
            self.reg_i = self.reg_i.wrapping_add(last as u16 + 1);
        }
    }

    /// Implements the `LD Vx, [I]` operation.
    fn ld_reg_deref_i(&mut self, reg: Register) {
        let last = reg as usize;
        let start = self.reg_i as usize;

        for n in 0..last + 1 {
            self.regs[n] = Wrapping(self.read(start + n));
        }
        if self.load_store_increments_i {
            self.reg_i = self.reg_i.wrapping_add(last as u16 + 1);
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
