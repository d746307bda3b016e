use num_bigint::BigInt;
use thiserror::Error;

/// Conditions that stop a run before it reaches Halt.
///
/// None of these are repaired by the machine. A caller running many
/// candidate programs (see [`crate::search`]) matches on the variant to
/// decide what to do with the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("unknown opcode {opcode} at address {address}")]
    UnknownOpcode { opcode: i64, address: usize },
    #[error("unknown parameter mode {mode} for parameter {param} of opcode {opcode} at address {address}")]
    UnknownMode {
        mode: u8,
        param: usize,
        opcode: i64,
        address: usize,
    },
    #[error("index {index} is outside the program")]
    EndOfProgram { index: BigInt },
}

impl VmError {
    pub(crate) fn out_of_bounds(index: impl Into<BigInt>) -> Self {
        VmError::EndOfProgram {
            index: index.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("program text contains no values")]
    Empty,
    #[error("invalid value '{token}' at position {position}")]
    InvalidValue { position: usize, token: String },
}
