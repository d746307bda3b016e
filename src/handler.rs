use num_bigint::BigInt;
use num_traits::Zero;

use crate::instruction::Opcode;

/// Operands of one instruction after mode resolution.
///
/// `inputs` holds the resolved value of every Input slot in declaration
/// order; `dest` holds the bounds-checked index named by the Output slot, if
/// the opcode has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operands {
    pub inputs: Vec<BigInt>,
    pub dest: Option<usize>,
}

/// What executing an instruction does to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Write { index: usize, value: BigInt },
    /// Move the pointer to exactly this value instead of advancing.
    Jump(BigInt),
    Emit(BigInt),
    /// Nothing to apply; the pointer advances past the instruction.
    Continue,
    Halt,
}

/// Run the handler for `opcode`.
///
/// Handlers are pure: they see only resolved operands and the configured
/// input value, and describe their effect instead of applying it.
pub fn execute(opcode: Opcode, operands: Operands, input: &BigInt) -> Effect {
    let Operands { inputs, dest } = operands;
    match (opcode, inputs.as_slice(), dest) {
        (Opcode::Add, [a, b], Some(index)) => Effect::Write {
            index,
            value: a + b,
        },
        (Opcode::Multiply, [a, b], Some(index)) => Effect::Write {
            index,
            value: a * b,
        },
        (Opcode::Input, [], Some(index)) => Effect::Write {
            index,
            value: input.clone(),
        },
        (Opcode::Output, [a], None) => Effect::Emit(a.clone()),
        (Opcode::JumpIfTrue, [cond, target], None) => {
            if cond.is_zero() {
                Effect::Continue
            } else {
                Effect::Jump(target.clone())
            }
        }
        (Opcode::JumpIfFalse, [cond, target], None) => {
            if cond.is_zero() {
                Effect::Jump(target.clone())
            } else {
                Effect::Continue
            }
        }
        (Opcode::Halt, [], None) => Effect::Halt,
        // Operands are built from the opcode's Descriptor, so no other shape reaches here.
        (op, inputs, dest) => unreachable!(
            "operands {inputs:?} -> {dest:?} do not match the descriptor of {op:?}"
        ),
    }
}
