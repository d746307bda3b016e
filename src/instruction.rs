use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::error::VmError;
use crate::tape::Tape;

/// The operation selected by the two low decimal digits of an instruction
/// word.
///
/// Opcodes:
/// - 1 (ADD):  [c] = a + b
/// - 2 (MUL):  [c] = a * b
/// - 3 (IN):   [a] = configured input
/// - 4 (OUT):  emit a
/// - 5 (JT):   if a != 0, pointer = b
/// - 6 (JF):   if a == 0, pointer = b
/// - 99 (HALT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Multiply,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    Halt,
}

/// Whether a parameter slot is read as an operand or names a cell to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Input,
    Output,
}

/// Static shape of an opcode: its mnemonic and parameter slots in order.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub mnemonic: &'static str,
    pub slots: &'static [Slot],
}

impl Descriptor {
    pub fn param_count(&self) -> usize {
        self.slots.len()
    }

    /// Cells occupied by the instruction, opcode word included.
    pub fn width(&self) -> usize {
        1 + self.slots.len()
    }

    pub fn input_count(&self) -> usize {
        self.slots.iter().filter(|&&s| s == Slot::Input).count()
    }

    pub fn output_count(&self) -> usize {
        self.slots.iter().filter(|&&s| s == Slot::Output).count()
    }
}

use Slot::{Input as I, Output as O};

const ADD: Descriptor = Descriptor { mnemonic: "ADD", slots: &[I, I, O] };
const MUL: Descriptor = Descriptor { mnemonic: "MUL", slots: &[I, I, O] };
const IN: Descriptor = Descriptor { mnemonic: "IN", slots: &[O] };
const OUT: Descriptor = Descriptor { mnemonic: "OUT", slots: &[I] };
// Jump targets are ordinary inputs: they follow their own mode.
const JT: Descriptor = Descriptor { mnemonic: "JT", slots: &[I, I] };
const JF: Descriptor = Descriptor { mnemonic: "JF", slots: &[I, I] };
const HALT: Descriptor = Descriptor { mnemonic: "HALT", slots: &[] };

impl Opcode {
    pub const ALL: [Opcode; 7] = [
        Opcode::Add,
        Opcode::Multiply,
        Opcode::Input,
        Opcode::Output,
        Opcode::JumpIfTrue,
        Opcode::JumpIfFalse,
        Opcode::Halt,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Multiply),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            99 => Some(Opcode::Halt),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Multiply => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::Halt => 99,
        }
    }

    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            Opcode::Add => &ADD,
            Opcode::Multiply => &MUL,
            Opcode::Input => &IN,
            Opcode::Output => &OUT,
            Opcode::JumpIfTrue => &JT,
            Opcode::JumpIfFalse => &JF,
            Opcode::Halt => &HALT,
        }
    }
}

/// Addressing mode of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The parameter is an index; the operand is the cell it names.
    Position,
    /// The parameter is the operand.
    Immediate,
}

/// A decoded instruction word: opcode plus one mode per parameter slot.
///
/// Output slots always carry `Mode::Position` regardless of the digit in the
/// word, since their raw value is a destination index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: Vec<Mode>,
}

impl Instruction {
    /// Decode the word found at `address`.
    ///
    /// The opcode is `word % 100`. The mode of parameter `i` is the decimal
    /// digit `i + 2` places from the right; missing digits are 0.
    pub fn decode(word: &BigInt, address: usize) -> Result<Self, VmError> {
        // |word % 100| < 100, so the conversion cannot fail.
        let code = (word % 100i32).to_i64().unwrap_or_default();
        let opcode = Opcode::from_code(code).ok_or(VmError::UnknownOpcode {
            opcode: code,
            address,
        })?;

        let descriptor = opcode.descriptor();
        let mut digits = word.abs() / 100i32;
        let mut modes = Vec::with_capacity(descriptor.param_count());
        for (param, &slot) in descriptor.slots.iter().enumerate() {
            let digit = (&digits % 10i32).to_u8().unwrap_or(u8::MAX);
            digits /= 10i32;
            let mode = match (slot, digit) {
                (Slot::Output, _) => Mode::Position,
                (Slot::Input, 0) => Mode::Position,
                (Slot::Input, 1) => Mode::Immediate,
                (Slot::Input, mode) => {
                    return Err(VmError::UnknownMode {
                        mode,
                        param,
                        opcode: code,
                        address,
                    });
                }
            };
            modes.push(mode);
        }

        Ok(Self { opcode, modes })
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        self.opcode.descriptor()
    }

    pub fn width(&self) -> usize {
        self.descriptor().width()
    }
}

/// Pretty-print a disassembly of the given tape for human inspection.
///
/// The tape is walked linearly from address 0. Cells that do not decode, or
/// whose parameters would run past the end of the tape, are shown as data.
pub fn disassemble(tape: &Tape) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let mut pc = 0;
    while pc < tape.len() {
        let word = &tape[pc];
        let decoded = Instruction::decode(word, pc)
            .ok()
            .filter(|instr| pc + instr.width() <= tape.len());
        let Some(instr) = decoded else {
            let _ = writeln!(out, "{pc:04}: {word}  DATA");
            pc += 1;
            continue;
        };

        let descriptor = instr.descriptor();
        let raw: Vec<String> = (pc..pc + instr.width())
            .map(|i| tape[i].to_string())
            .collect();
        let operands: Vec<String> = descriptor
            .slots
            .iter()
            .zip(&instr.modes)
            .enumerate()
            .map(|(i, (slot, mode))| {
                let value = &tape[pc + 1 + i];
                match (slot, mode) {
                    (Slot::Output, _) => format!("->[{value}]"),
                    (Slot::Input, Mode::Position) => format!("[{value}]"),
                    (Slot::Input, Mode::Immediate) => format!("#{value}"),
                }
            })
            .collect();
        let _ = write!(out, "{pc:04}: {}  {}", raw.join(","), descriptor.mnemonic);
        if !operands.is_empty() {
            let _ = write!(out, " {}", operands.join(" "));
        }
        out.push('\n');
        pc += instr.width();
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn opcode_is_low_two_digits(high in 0i64..1000, op in prop::sample::select(vec![1i64, 2, 3, 4, 5, 6, 99])) {
            let word = BigInt::from(high * 100 + op);
            match Instruction::decode(&word, 0) {
                Ok(instr) => prop_assert_eq!(instr.opcode.code(), op),
                Err(VmError::UnknownMode { opcode, .. }) => prop_assert_eq!(opcode, op),
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }

        #[test]
        fn binary_mode_digits_decode(m1 in 0i64..2, m2 in 0i64..2, m3 in 0i64..2) {
            let word = BigInt::from(m3 * 10000 + m2 * 1000 + m1 * 100 + 1);
            let instr = Instruction::decode(&word, 0).unwrap();
            let mode = |m| if m == 1 { Mode::Immediate } else { Mode::Position };
            prop_assert_eq!(instr.modes, vec![mode(m1), mode(m2), Mode::Position]);
        }

        #[test]
        fn disassemble_never_panics(cells in prop::collection::vec(-200i64..2000, 0..64)) {
            let values: Vec<BigInt> = cells.into_iter().map(BigInt::from).collect();
            let tape = Tape::load(&values);
            let dis = disassemble(&tape);
            prop_assert!(dis.lines().count() <= tape.len());
        }
    }
}
