use std::ops::Index;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{ParseError, VmError};

/// The machine's memory: a fixed-length run of signed integers holding both
/// code and data.
///
/// Cells are overwritten in place but never appended, so every index that is
/// valid at load time stays valid for the whole run and nothing else is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<BigInt>,
}

impl Tape {
    /// Copy `program` into a fresh tape. The caller's slice is never touched
    /// by a run.
    pub fn load(program: &[BigInt]) -> Self {
        Self {
            cells: program.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[BigInt] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<BigInt> {
        self.cells
    }

    /// Read the cell at `index`.
    pub fn get(&self, index: usize) -> Result<&BigInt, VmError> {
        self.cells
            .get(index)
            .ok_or_else(|| VmError::out_of_bounds(index))
    }

    /// Overwrite the cell at `index`.
    pub fn set(&mut self, index: usize, value: BigInt) -> Result<(), VmError> {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(VmError::out_of_bounds(index)),
        }
    }

    /// Interpret a cell value as an index into this tape.
    ///
    /// Negative values and values past the end are both out of bounds.
    pub fn address(&self, value: &BigInt) -> Result<usize, VmError> {
        match value.to_usize() {
            Some(index) if index < self.cells.len() => Ok(index),
            _ => Err(VmError::out_of_bounds(value.clone())),
        }
    }

    /// Read the cell that `pointer` (a cell value) points at.
    pub fn fetch(&self, pointer: &BigInt) -> Result<&BigInt, VmError> {
        let index = self.address(pointer)?;
        Ok(&self.cells[index])
    }
}

impl Index<usize> for Tape {
    type Output = BigInt;

    fn index(&self, index: usize) -> &BigInt {
        &self.cells[index]
    }
}

/// Parse comma-separated program text such as `"1,0,0,3,99\n"`.
///
/// Whitespace around each value is ignored, as is a single empty token after
/// a trailing comma.
pub fn parse_program(text: &str) -> Result<Vec<BigInt>, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);

    trimmed
        .split(',')
        .enumerate()
        .map(|(position, token)| {
            let token = token.trim();
            token
                .parse::<BigInt>()
                .map_err(|_| ParseError::InvalidValue {
                    position,
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Build a program from machine-word literals. Mostly useful in tests.
pub fn program_from(values: &[i64]) -> Vec<BigInt> {
    values.iter().map(|&v| BigInt::from(v)).collect()
}
