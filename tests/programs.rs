/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Runs small hand-assembled programs from start to finish.

extern crate chip8vm;

use std::io::Cursor;

use chip8vm::display::{HEX_SPRITES, WIDTH};
use chip8vm::input::N_KEYS;
use chip8vm::{Instruction, Interpreter, Options, Register, Step};

/// Assembles the given opcodes into program bytes.
fn assemble(opcodes: &[u16]) -> Vec<u8> {
    opcodes
        .iter()
        .flat_map(|&op| vec![(op >> 8) as u8, op as u8])
        .collect()
}

fn load(options: Options, opcodes: &[u16]) -> Interpreter {
    let mut interpreter = Interpreter::with_options(options);
    let program = assemble(opcodes);
    let size = interpreter
        .load_program(&mut Cursor::new(program))
        .unwrap();
    assert_eq!(size, 2 * opcodes.len());
    interpreter
}

/// Steps until the program counter reaches `end` (a jump-to-self loop).
fn run_until(interpreter: &mut Interpreter, end: u16) {
    for _ in 0..1000 {
        if interpreter.pc() == end {
            return;
        }
        interpreter.step();
    }
    panic!("program never reached {:#05X}", end);
}

#[test]
fn counting_loop() {
    let mut interpreter = load(
        Options::testing(),
        &[
            0x6005, // LD V0, #05
            0x6100, // LD V1, #00
            0x7101, // ADD V1, #01
            0x70FF, // ADD V0, #FF
            0x3000, // SE V0, #00
            0x1204, // JP 0x204
            0x120C, // JP 0x20C
        ],
    );

    run_until(&mut interpreter, 0x20C);
    assert_eq!(interpreter.register(Register::V0), 0);
    assert_eq!(interpreter.register(Register::V1), 5);
    assert_eq!(interpreter.register(Register::VF), 0);
}

#[test]
fn bcd_digit_drawing() {
    let mut interpreter = load(
        Options::testing(),
        &[
            0x6A9C, // LD VA, #9C
            0xA300, // LD I, 0x300
            0xFA33, // LD B, VA
            0xF265, // LD V2, [I]
            0xF129, // LD F, V1
            0x6300, // LD V3, #00
            0xD335, // DRW V3, V3, 5
            0x120E, // JP 0x20E
        ],
    );

    run_until(&mut interpreter, 0x20E);
    assert_eq!(interpreter.register(Register::V0), 1);
    assert_eq!(interpreter.register(Register::V1), 5);
    assert_eq!(interpreter.register(Register::V2), 6);
    assert_eq!(interpreter.register(Register::VF), 0);

    let display = interpreter.display();
    for (y, row) in HEX_SPRITES[5].iter().enumerate() {
        for x in 0..8 {
            let expected = row & (0x80 >> x) != 0;
            assert_eq!(display.pixel(x, y), expected, "pixel ({}, {})", x, y);
        }
    }
    assert!(!display.pixel(WIDTH - 1, 0));
}

#[test]
fn nested_subroutines() {
    let mut interpreter = load(
        Options::modern(),
        &[
            0x2206, // CALL 0x206
            0x6B01, // LD VB, #01
            0x1204, // JP 0x204
            0x220C, // CALL 0x20C
            0x7C01, // ADD VC, #01
            0x00EE, // RET
            0x7C10, // ADD VC, #10
            0x00EE, // RET
        ],
    );

    run_until(&mut interpreter, 0x204);
    assert_eq!(interpreter.register(Register::VB), 1);
    assert_eq!(interpreter.register(Register::VC), 0x11);
    assert_eq!(interpreter.stack_depth(), 0);
}

#[test]
fn waits_for_key_then_resumes() {
    let mut interpreter = load(
        Options::testing(),
        &[
            0xF50A, // LD V5, K
            0xE59E, // SKP V5
            0x6601, // LD V6, #01
            0x6701, // LD V7, #01
            0x1208, // JP 0x208
        ],
    );

    assert_eq!(
        interpreter.step(),
        Step::Executed(Instruction::LdKey(Register::V5))
    );
    for _ in 0..10 {
        assert_eq!(interpreter.step(), Step::WaitingForKey);
    }
    assert_eq!(interpreter.pc(), 0x202);

    let mut keys = [false; N_KEYS];
    keys[0xD] = true;
    keys[0xE] = true;
    interpreter.input_mut().set_all(keys);

    run_until(&mut interpreter, 0x208);
    assert_eq!(interpreter.register(Register::V5), 0xD);
    // The key is still held, so the SKP skipped the LD V6.
    assert_eq!(interpreter.register(Register::V6), 0);
    assert_eq!(interpreter.register(Register::V7), 1);
}

#[test]
fn unknown_opcodes_do_not_halt() {
    let mut interpreter = load(
        Options::testing(),
        &[
            0x0123, // SYS 0x123 (unsupported)
            0x00FF, // HIGH (SCHIP only)
            0x6401, // LD V4, #01
            0x1206, // JP 0x206
        ],
    );

    run_until(&mut interpreter, 0x206);
    assert_eq!(interpreter.register(Register::V4), 1);
}
