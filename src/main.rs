//! UE1 Emulator - CLI Entry Point
//!
//! Usage:
//! - `ue1-emu <tape>` - Run a tape interactively, prompting for inputs
//! - `ue1-emu <tape> <bits-A> <bits-B> [mul|div]` - Exhaustively verify a tape
//! - `ue1-emu asm <source>` - Assemble to a tape
//! - `ue1-emu disasm <tape>` - Disassemble a tape
//! - `ue1-emu bin2s <tape>` - Convert a tape to `.db` data directives

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use ue1::cpu::decode::encode;
use ue1::harness::MAX_OPERAND_BITS;
use ue1::{Cpu, Operation, RunEnd, Step, StepKind, Sweep, SweepConfig, Tape};

#[derive(Parser)]
#[command(name = "ue1-emu")]
#[command(version)]
#[command(about = "Emulator and exhaustive arithmetic tester for the UE1 one-bit computer")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    /// Program tape to execute (raw binary, one instruction per byte).
    /// A tape named like a subcommand must be given as a path, e.g. `./asm`
    tape: Option<PathBuf>,

    /// Width of operand A; 0 for both widths runs once, interactively
    #[arg(default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=MAX_OPERAND_BITS as i64))]
    bits_a: u8,

    /// Width of operand B
    #[arg(default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=MAX_OPERAND_BITS as i64))]
    bits_b: u8,

    /// What the tape computes
    #[arg(value_enum, default_value_t = Operation::Multiply)]
    operation: Operation,

    /// Trace every instruction on stderr
    #[arg(short, long)]
    trace: bool,

    /// Print results as JSON lines
    #[arg(long)]
    json: bool,

    /// Stop a run after this many instructions
    #[arg(long)]
    max_cycles: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble source to a tape
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output tape file (default: source with a .bin extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print a listing to stdout
        #[arg(short, long)]
        listing: bool,
    },
    /// Disassemble a tape to readable text
    Disasm {
        /// Path to the tape file
        tape: PathBuf,
    },
    /// Convert a tape to `.db` data directives
    Bin2s {
        /// Path to the tape file
        tape: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => exit_with(e),
    };

    match cli.command {
        Some(Commands::Asm { source, output, listing }) => {
            assemble_file(&source, output, listing);
        }
        Some(Commands::Disasm { tape }) => {
            disassemble_file(&tape);
        }
        Some(Commands::Bin2s { tape, output }) => {
            convert_to_data(&tape, output);
        }
        None => {
            let Some(path) = cli.run.tape.clone() else {
                let err = Cli::command().error(
                    ErrorKind::MissingRequiredArgument,
                    "the following required argument was not provided: <TAPE>",
                );
                exit_with(err);
            };
            run_tape(&path, &cli.run);
        }
    }
}

/// Print a clap error or help text. Usage errors exit with 1.
fn exit_with(err: clap::Error) -> ! {
    let code = if err.use_stderr() { 1 } else { 0 };
    let _ = err.print();
    std::process::exit(code);
}

fn load_or_exit(path: &Path) -> Tape {
    match ue1::load_tape(path) {
        Ok(tape) => tape,
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_tape(path: &Path, args: &RunArgs) {
    let tape = load_or_exit(path);

    let config = SweepConfig {
        bits_a: args.bits_a,
        bits_b: args.bits_b,
        operation: args.operation,
        max_cycles: args.max_cycles,
    };

    let trace = args.trace;
    let on_step = move |step: &Step, cpu: &Cpu| {
        if trace {
            trace_step(step, cpu);
        }
    };

    if config.is_sweep() {
        run_sweep(&tape, config, args.json, on_step);
    } else {
        run_interactive(&tape, config.max_cycles, args.json, on_step);
    }
}

fn run_sweep<S>(tape: &Tape, config: SweepConfig, json: bool, on_step: S)
where
    S: FnMut(&Step, &Cpu),
{
    let report = Sweep::new(tape, config).run(on_step, |outcome| {
        if json {
            print_json(outcome);
        } else {
            println!("{}", outcome);
        }
    });

    if json {
        print_json(&report);
    }
    if report.cycle_limited > 0 {
        eprintln!(
            "{} of {} runs stopped at the {}-instruction limit",
            report.cycle_limited,
            report.checked,
            config.max_cycles.unwrap_or_default()
        );
    }

    if !report.passed() {
        std::process::exit(1);
    }
}

fn run_interactive<S>(tape: &Tape, max_cycles: Option<u64>, json: bool, on_step: S)
where
    S: FnMut(&Step, &Cpu),
{
    let mut cpu = Cpu::new();
    let mut feed = ue1::InteractiveFeed::new(io::stdin().lock(), io::stdout());
    let end = cpu.run_with(tape, &mut feed, max_cycles, on_step);

    if end == RunEnd::CycleLimit {
        eprintln!("stopped after {} instructions", cpu.cycles);
    }

    if json {
        print_json(&cpu);
    } else {
        println!("{}", cpu.mem.register_dump());
    }
}

fn trace_step(step: &Step, cpu: &Cpu) {
    use ue1::asm::disasm::disassemble_instruction;

    let byte = encode(&step.instr);
    let note = match step.kind {
        StepKind::Executed => "",
        StepKind::Skipped => "  (skipped)",
        StepKind::InputRequest => "  <- input",
        StepKind::Halt => "  halt",
    };
    eprintln!(
        "{:04X}: {:02X}  {:<10} RR={} CAR={} IEN={} OEN={}{}",
        step.pc,
        byte,
        disassemble_instruction(byte),
        cpu.regs.rr as u8,
        cpu.regs.carry as u8,
        cpu.regs.ien as u8,
        cpu.regs.oen as u8,
        note,
    );
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => eprintln!("failed to encode JSON: {}", e),
    }
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>, listing: bool) {
    let out_path = output.unwrap_or_else(|| source_path.with_extension("bin"));

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", source_path.display(), e);
            std::process::exit(1);
        }
    };

    let assembly = match ue1::asm::assemble_with_listing(&source) {
        Ok(assembly) => assembly,
        Err(e) => {
            eprintln!("{}: {}", source_path.display(), e);
            std::process::exit(1);
        }
    };

    if listing {
        for line in &assembly.listing {
            println!("{}", line);
        }
    }

    if let Err(e) = ue1::asm::save_tape(&out_path, &assembly.bytes) {
        eprintln!("{}: {}", out_path.display(), e);
        std::process::exit(1);
    }

    eprintln!(
        "Assembled {} instructions: {} -> {}",
        assembly.bytes.len(),
        source_path.display(),
        out_path.display()
    );
}

fn disassemble_file(tape_path: &Path) {
    let tape = load_or_exit(tape_path);
    print!("{}", ue1::disassemble(tape.bytes()));
}

fn convert_to_data(tape_path: &Path, output: Option<PathBuf>) {
    // Unlike the emulator, the converter takes the whole file.
    let bytes = match std::fs::read(tape_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}: {}", tape_path.display(), e);
            std::process::exit(1);
        }
    };

    let text = ue1::asm::to_data_directives(&bytes);
    let result = match &output {
        Some(path) => std::fs::write(path, text),
        None => io::stdout().write_all(text.as_bytes()),
    };

    if let Err(e) = result {
        let target = output.as_deref().map_or("stdout".into(), |p| p.display().to_string());
        eprintln!("{}: {}", target, e);
        std::process::exit(1);
    }
}
