use num_bigint::BigInt;
use num_traits::ToPrimitive;
use tracing::{debug, trace};

use crate::error::VmError;
use crate::handler::{self, Effect, Operands};
use crate::instruction::{Instruction, Mode, Slot};
use crate::sink::OutputSink;
use crate::tape::Tape;

/// Configuration for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Value written by every Input instruction.
    pub input: BigInt,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: BigInt::from(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Failed(VmError),
}

/// An IntCode machine: a private copy of the program, an instruction
/// pointer, and the sink that receives Output values.
///
/// Each step decodes exactly one instruction at the pointer, resolves its
/// operands, runs the handler and applies the resulting effect. The pointer
/// then either advances by the instruction's width or, for a taken jump,
/// becomes the jump target; never both. A step that fails leaves the tape and
/// pointer as they were.
///
/// `run` has no step limit: a program that neither halts nor leaves the tape
/// runs forever. Use `run_bounded` when that matters.
pub struct Machine<S = Vec<BigInt>> {
    tape: Tape,
    pointer: usize,
    state: State,
    input: BigInt,
    sink: S,
    steps: usize,
}

impl Machine<Vec<BigInt>> {
    /// Create a machine that collects its output values.
    pub fn new(program: &[BigInt], config: &RunConfig) -> Self {
        Self::with_sink(program, config, Vec::new())
    }

    pub fn outputs(&self) -> &[BigInt] {
        &self.sink
    }
}

impl<S: OutputSink> Machine<S> {
    pub fn with_sink(program: &[BigInt], config: &RunConfig, sink: S) -> Self {
        Self::from_tape(Tape::load(program), config, sink)
    }

    /// Create a machine that runs directly on `tape`, which it takes over.
    pub fn from_tape(tape: Tape, config: &RunConfig, sink: S) -> Self {
        Self {
            tape,
            pointer: 0,
            state: State::Running,
            input: config.input.clone(),
            sink,
            steps: 0,
        }
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Number of instructions executed so far, Halt included.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (Tape, S) {
        (self.tape, self.sink)
    }

    /// Execute one instruction.
    ///
    /// Stepping a halted machine does nothing. Stepping a failed machine
    /// reports the original failure again.
    pub fn step(&mut self) -> Result<(), VmError> {
        match &self.state {
            State::Running => {}
            State::Halted => return Ok(()),
            State::Failed(e) => return Err(e.clone()),
        }

        if let Err(e) = self.execute_one() {
            debug!(pointer = self.pointer, steps = self.steps, "run failed: {e}");
            self.state = State::Failed(e.clone());
            return Err(e);
        }
        if self.is_halted() {
            debug!(pointer = self.pointer, steps = self.steps, "halted");
        }
        Ok(())
    }

    /// Run until Halt and return the final tape.
    pub fn run(&mut self) -> Result<&Tape, VmError> {
        loop {
            match &self.state {
                State::Running => self.step()?,
                State::Halted => return Ok(&self.tape),
                State::Failed(e) => return Err(e.clone()),
            }
        }
    }

    /// Run until Halt or until `step_limit` steps have been executed by this
    /// call, whichever comes first.
    ///
    /// Returns the number of steps actually executed. Hitting the limit is not
    /// an error; the machine is left Running.
    pub fn run_bounded(&mut self, step_limit: usize) -> Result<usize, VmError> {
        let mut executed = 0;
        while executed < step_limit {
            match &self.state {
                State::Running => {
                    self.step()?;
                    executed += 1;
                }
                State::Halted => break,
                State::Failed(e) => return Err(e.clone()),
            }
        }
        Ok(executed)
    }

    fn execute_one(&mut self) -> Result<(), VmError> {
        let address = self.pointer;
        let instr = Instruction::decode(self.tape.get(address)?, address)?;
        let operands = self.resolve(&instr)?;
        trace!(address, opcode = ?instr.opcode, ?operands, "execute");

        let width = instr.width();
        match handler::execute(instr.opcode, operands, &self.input) {
            Effect::Write { index, value } => {
                self.tape.set(index, value)?;
                self.pointer += width;
            }
            Effect::Jump(target) => {
                self.pointer = target
                    .to_usize()
                    .ok_or_else(|| VmError::out_of_bounds(target.clone()))?;
            }
            Effect::Emit(value) => {
                self.sink.emit(&value);
                self.pointer += width;
            }
            Effect::Continue => self.pointer += width,
            Effect::Halt => self.state = State::Halted,
        }
        self.steps += 1;
        Ok(())
    }

    /// Turn the parameter cells following the opcode word into operands.
    fn resolve(&self, instr: &Instruction) -> Result<Operands, VmError> {
        let descriptor = instr.descriptor();
        let mut inputs = Vec::with_capacity(descriptor.input_count());
        let mut dest = None;
        for (i, (&slot, &mode)) in descriptor.slots.iter().zip(&instr.modes).enumerate() {
            let raw = self.tape.get(self.pointer + 1 + i)?;
            match (slot, mode) {
                (Slot::Input, Mode::Position) => inputs.push(self.tape.fetch(raw)?.clone()),
                (Slot::Input, Mode::Immediate) => inputs.push(raw.clone()),
                (Slot::Output, _) => dest = Some(self.tape.address(raw)?),
            }
        }
        Ok(Operands { inputs, dest })
    }
}
