use num_bigint::BigInt;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::VmError;
use crate::machine::{Machine, RunConfig};
use crate::tape::Tape;

/// A pair of seed values written to cells 1 and 2 before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seed {
    pub noun: u32,
    pub verb: u32,
}

impl Seed {
    pub fn new(noun: u32, verb: u32) -> Self {
        Self { noun, verb }
    }

    /// The conventional single-number form of a seed pair: `100 * noun + verb`.
    pub fn code(self) -> u64 {
        100 * u64::from(self.noun) + u64::from(self.verb)
    }
}

/// Configuration for a seed search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Value cell 0 must hold after Halt.
    pub target: BigInt,
    /// Nouns and verbs are both drawn from `0..max_seed`.
    pub max_seed: u32,
    /// Candidates still running after this many steps are dropped.
    pub step_limit: usize,
    pub run: RunConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target: BigInt::from(19_690_720),
            max_seed: 100,
            step_limit: 1 << 13, // 8192
            run: RunConfig::default(),
        }
    }
}

/// How a single candidate run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Halted normally; holds the final value of cell 0.
    Halted(BigInt),
    Failed(VmError),
    /// Still running when the step limit was reached.
    Exhausted,
}

fn seeded_tape(program: &[BigInt], seed: Seed) -> Result<Tape, VmError> {
    let mut tape = Tape::load(program);
    tape.set(1, BigInt::from(seed.noun))?;
    tape.set(2, BigInt::from(seed.verb))?;
    Ok(tape)
}

/// Run `program` with `seed` patched into cells 1 and 2 and return cell 0
/// after Halt.
///
/// There is no step limit: the program must terminate.
pub fn run_with_seeds(
    program: &[BigInt],
    seed: Seed,
    config: &RunConfig,
) -> Result<BigInt, VmError> {
    let mut machine = Machine::from_tape(seeded_tape(program, seed)?, config, Vec::new());
    let tape = machine.run()?;
    Ok(tape.get(0)?.clone())
}

/// Run one candidate on its own copy of `program`, giving up after
/// `config.step_limit` steps.
pub fn try_seed(program: &[BigInt], seed: Seed, config: &SearchConfig) -> Outcome {
    let tape = match seeded_tape(program, seed) {
        Ok(tape) => tape,
        Err(e) => return Outcome::Failed(e),
    };
    let mut machine = Machine::from_tape(tape, &config.run, Vec::new());
    if let Err(e) = machine.run_bounded(config.step_limit) {
        return Outcome::Failed(e);
    }
    if !machine.is_halted() {
        return Outcome::Exhausted;
    }
    Outcome::Halted(machine.tape()[0].clone())
}

fn is_match(program: &[BigInt], seed: Seed, config: &SearchConfig) -> bool {
    let Seed { noun, verb } = seed;
    match try_seed(program, seed, config) {
        Outcome::Halted(value) => value == config.target,
        Outcome::Failed(VmError::UnknownOpcode { opcode, address }) => {
            trace!(noun, verb, opcode, address, "pruned: unknown opcode");
            false
        }
        Outcome::Failed(VmError::UnknownMode { mode, address, .. }) => {
            trace!(noun, verb, mode, address, "pruned: unknown mode");
            false
        }
        Outcome::Failed(VmError::EndOfProgram { index }) => {
            trace!(noun, verb, %index, "pruned: left the program");
            false
        }
        Outcome::Exhausted => {
            trace!(noun, verb, step_limit = config.step_limit, "pruned: step limit");
            false
        }
    }
}

fn candidates(max_seed: u32) -> impl ParallelIterator<Item = Seed> {
    (0..max_seed)
        .into_par_iter()
        .flat_map_iter(move |noun| (0..max_seed).map(move |verb| Seed::new(noun, verb)))
}

/// Find the first seed pair, in (noun, verb) order, for which the program
/// halts with `config.target` in cell 0.
///
/// Candidates run in parallel, each on an independent copy of `program`.
/// Candidates that fail or exceed the step limit are skipped.
pub fn search(program: &[BigInt], config: &SearchConfig) -> Option<Seed> {
    let found = candidates(config.max_seed).find_first(|&seed| is_match(program, seed, config));
    match found {
        Some(seed) => debug!(noun = seed.noun, verb = seed.verb, "seed search matched"),
        None => debug!(wanted = %config.target, "no seed pair matched"),
    }
    found
}

/// Every seed pair that produces `config.target`, in (noun, verb) order.
pub fn matching_seeds(program: &[BigInt], config: &SearchConfig) -> Vec<Seed> {
    candidates(config.max_seed)
        .filter(|&seed| is_match(program, seed, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::program_from;

    /// Cell 0 ends up as `100 * noun + verb`:
    /// ADD #noun #verb ->[3]; MUL [1] #100 ->[0]; ADD [0] [2] ->[0]; HALT
    fn encoder() -> Vec<BigInt> {
        program_from(&[1101, 0, 0, 3, 1002, 1, 100, 0, 1, 0, 2, 0, 99])
    }

    /// Cell 0 ends up as `tape[noun] + tape[verb]`; most seeds read past the
    /// end of the seven-cell tape.
    fn short_adder() -> Vec<BigInt> {
        program_from(&[1, 0, 0, 0, 99, 10, 20])
    }

    fn config(target: i64) -> SearchConfig {
        SearchConfig {
            target: BigInt::from(target),
            ..Default::default()
        }
    }

    #[test]
    fn test_seed_code() {
        assert_eq!(Seed::new(12, 2).code(), 1202);
        assert_eq!(Seed::new(0, 0).code(), 0);
        assert_eq!(Seed::new(99, 99).code(), 9999);
    }

    #[test]
    fn test_run_with_seeds() {
        let value = run_with_seeds(&encoder(), Seed::new(12, 2), &RunConfig::default()).unwrap();
        assert_eq!(value, BigInt::from(1202));
    }

    #[test]
    fn test_run_with_seeds_leaves_program_alone() {
        let program = encoder();
        run_with_seeds(&program, Seed::new(5, 6), &RunConfig::default()).unwrap();
        assert_eq!(program, encoder());
    }

    #[test]
    fn test_run_with_seeds_reports_failure() {
        let err = run_with_seeds(&short_adder(), Seed::new(50, 0), &RunConfig::default());
        assert_eq!(err, Err(VmError::out_of_bounds(50)));
    }

    #[test]
    fn test_program_too_short_to_seed() {
        let program = program_from(&[99, 0]);
        assert_eq!(
            try_seed(&program, Seed::new(1, 1), &SearchConfig::default()),
            Outcome::Failed(VmError::out_of_bounds(2))
        );
    }

    #[test]
    fn test_search_finds_unique_pair() {
        let program = encoder();
        let config = config(1234);
        assert_eq!(search(&program, &config), Some(Seed::new(12, 34)));
        assert_eq!(matching_seeds(&program, &config), vec![Seed::new(12, 34)]);
    }

    #[test]
    fn test_search_prunes_failing_candidates() {
        let program = short_adder();
        let config = config(40);
        assert_eq!(search(&program, &config), Some(Seed::new(6, 6)));
        assert_eq!(matching_seeds(&program, &config), vec![Seed::new(6, 6)]);
        assert_eq!(
            try_seed(&program, Seed::new(7, 0), &config),
            Outcome::Failed(VmError::out_of_bounds(7))
        );
    }

    #[test]
    fn test_search_no_match() {
        let config = config(-1);
        assert_eq!(search(&encoder(), &config), None);
        assert!(matching_seeds(&encoder(), &config).is_empty());
    }

    #[test]
    fn test_search_returns_first_in_order() {
        // Cell 0 = noun + verb, so many pairs match; the smallest noun wins.
        let program = program_from(&[1101, 0, 0, 0, 99]);
        let config = config(10);
        assert_eq!(search(&program, &config), Some(Seed::new(0, 10)));
        assert_eq!(matching_seeds(&program, &config).len(), 11);
    }

    #[test]
    fn test_non_halting_candidates_are_exhausted() {
        // JT #noun #verb: a nonzero noun with verb 0 jumps back to itself forever.
        let program = program_from(&[1105, 0, 0, 99]);
        let config = SearchConfig {
            target: BigInt::from(1105),
            max_seed: 10,
            step_limit: 100,
            run: RunConfig::default(),
        };
        assert_eq!(try_seed(&program, Seed::new(3, 0), &config), Outcome::Exhausted);
        assert_eq!(
            try_seed(&program, Seed::new(0, 0), &config),
            Outcome::Halted(BigInt::from(1105))
        );
        assert_eq!(search(&program, &config), Some(Seed::new(0, 0)));
    }

    #[test]
    fn test_search_is_deterministic() {
        let program = encoder();
        let config = config(4711);
        let first = matching_seeds(&program, &config);
        let second = matching_seeds(&program, &config);
        assert_eq!(first, second);
        assert_eq!(first, vec![Seed::new(47, 11)]);
    }
}
