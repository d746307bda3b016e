use std::path::PathBuf;

use clap::Parser;
use intcode::instruction::disassemble;
use intcode::machine::{Machine, RunConfig};
use intcode::search::{SearchConfig, search};
use intcode::sink::StdoutSink;
use intcode::tape::{Tape, parse_program};
use num_bigint::BigInt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "intcode", about = "IntCode interpreter and seed-pair search")]
struct Cli {
    /// Path to a comma-separated IntCode program.
    program: PathBuf,

    /// Value supplied to every Input instruction.
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    input: BigInt,

    /// Write this value to cell 1 before running.
    #[arg(long, conflicts_with = "search")]
    noun: Option<u32>,

    /// Write this value to cell 2 before running.
    #[arg(long, conflicts_with = "search")]
    verb: Option<u32>,

    /// Search for the noun/verb pair that leaves this value in cell 0.
    #[arg(long, allow_hyphen_values = true)]
    search: Option<BigInt>,

    /// Nouns and verbs tried by --search are drawn from 0..max-seed.
    #[arg(long, default_value_t = 100)]
    max_seed: u32,

    /// Max steps per candidate run during --search.
    #[arg(long, default_value_t = 1 << 13)]
    step_limit: usize,

    /// Print a disassembly of the program instead of running it.
    #[arg(long)]
    disassemble: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let text = match std::fs::read_to_string(&cli.program) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Cannot read '{}': {e}", cli.program.display());
            std::process::exit(1);
        }
    };
    let program = match parse_program(&text) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Cannot parse '{}': {e}", cli.program.display());
            std::process::exit(1);
        }
    };
    tracing::info!(cells = program.len(), "loaded {}", cli.program.display());

    if cli.disassemble {
        print!("{}", disassemble(&Tape::load(&program)));
        return;
    }

    let run = RunConfig { input: cli.input.clone() };

    if let Some(target) = cli.search.clone() {
        let config = SearchConfig {
            target,
            max_seed: cli.max_seed,
            step_limit: cli.step_limit,
            run,
        };
        run_search(&program, &config);
    } else {
        run_program(&program, &cli, &run);
    }
}

fn run_program(program: &[BigInt], cli: &Cli, config: &RunConfig) {
    let mut tape = Tape::load(program);
    let patches = [(1, cli.noun), (2, cli.verb)];
    for (index, value) in patches {
        let Some(value) = value else { continue };
        if let Err(e) = tape.set(index, BigInt::from(value)) {
            eprintln!("Cannot seed cell {index}: {e}");
            std::process::exit(1);
        }
    }

    let mut machine = Machine::from_tape(tape, config, StdoutSink);
    let start = std::time::Instant::now();
    let result = machine.run().map(|tape| tape[0].clone());
    match result {
        Ok(cell0) => {
            let elapsed = start.elapsed();
            eprintln!("Halted:");
            eprintln!("  Steps:    {}", machine.steps());
            eprintln!("  Elapsed:  {elapsed:.2?}");
            eprintln!("  Cell 0:   {cell0}");
        }
        Err(e) => {
            eprintln!("Program failed after {} steps: {e}", machine.steps());
            std::process::exit(1);
        }
    }
}

fn run_search(program: &[BigInt], config: &SearchConfig) {
    let start = std::time::Instant::now();
    match search(program, config) {
        Some(seed) => {
            let elapsed = start.elapsed();
            println!("{}", seed.code());
            eprintln!("Found noun {} verb {} in {elapsed:.2?}", seed.noun, seed.verb);
        }
        None => {
            eprintln!(
                "No noun/verb pair in 0..{} leaves {} in cell 0",
                config.max_seed, config.target
            );
            std::process::exit(1);
        }
    }
}
