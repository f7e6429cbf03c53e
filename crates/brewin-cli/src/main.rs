use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use brewin_ast::ast::Program;
use brewin_cli::trace::TraceRecord;
use brewin_cli::{
    run_program, ErrorKind, ReplayConsole, RuntimeError, StdConsole, TraceEmitter, TraceReplayer,
    TracedConsole,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Maximum program file size in bytes (1MB)
const MAX_SOURCE_SIZE: u64 = 1_000_000;

#[derive(Parser, Debug)]
#[command(name = "brewin")]
#[command(about = "Brewin: tree-walking interpreter for parsed Brewin programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a Brewin program
    Run {
        /// Path to the program's JSON syntax tree
        file: PathBuf,

        /// Read program input from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write console trace to file (large values hashed)
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Write replay-capable trace (all values recorded)
        #[arg(long, conflicts_with = "trace")]
        trace_full: Option<PathBuf>,
    },

    /// Replay a recorded console trace
    Replay {
        /// Path to trace JSONL file
        trace_path: PathBuf,

        /// Program to replay against (omit for trace summary)
        file: Option<PathBuf>,
    },

    /// Load a program and dump its syntax tree
    Dump {
        /// Path to the program's JSON syntax tree
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum Format {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            trace,
            trace_full,
        } => cmd_run(&file, input.as_deref(), trace, trace_full),

        Commands::Replay { trace_path, file } => cmd_replay(&trace_path, file.as_deref()),

        Commands::Dump { file, format } => cmd_dump(&file, format),
    }
}

/// Diagnostics go to stderr and stay off unless `RUST_LOG` is set, so they
/// never mix with program output.
fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return;
    };
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn load_program(path: &Path) -> Result<Program> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("cannot read program '{}'", path.display()))?
        .len();
    if size > MAX_SOURCE_SIZE {
        bail!(
            "program file exceeds {}MB limit ({} bytes)",
            MAX_SOURCE_SIZE / 1_000_000,
            size
        );
    }
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read program '{}'", path.display()))?;
    let program: Program = serde_json::from_str(&src)
        .with_context(|| format!("'{}' is not a valid Brewin syntax tree", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        structs = program.structs.len(),
        functions = program.functions.len(),
        "loaded program"
    );
    Ok(program)
}

fn open_console(input: Option<&Path>) -> Result<StdConsole> {
    Ok(match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open input '{}'", path.display()))?;
            StdConsole::with_input(Box::new(BufReader::new(file)))
        }
        None => StdConsole::default(),
    })
}

fn cmd_run(
    file: &Path,
    input: Option<&Path>,
    trace: Option<PathBuf>,
    trace_full: Option<PathBuf>,
) -> Result<()> {
    let program = load_program(file)?;
    let console = open_console(input)?;

    let trace_target = match (trace_full, trace) {
        (Some(path), _) => Some((path, true)),
        (None, Some(path)) => Some((path, false)),
        (None, None) => None,
    };

    let outcome = match trace_target {
        Some((trace_path, full_values)) => {
            let writer = File::create(&trace_path)
                .with_context(|| format!("cannot create trace '{}'", trace_path.display()))?;
            let emitter = TraceEmitter::new(Box::new(BufWriter::new(writer)), full_values)?;
            let mut console = TracedConsole::new(console, emitter);
            let outcome = run_program(&program, &mut console);
            console.finalize(if outcome.is_ok() { "success" } else { "error" })?;
            eprintln!("Trace written to {}", trace_path.display());
            outcome
        }
        None => {
            let mut console = console;
            run_program(&program, &mut console)
        }
    };

    if let Err(e) = outcome {
        exit_with(&e);
    }
    Ok(())
}

fn cmd_replay(trace_path: &Path, file: Option<&Path>) -> Result<()> {
    let content = std::fs::read_to_string(trace_path)
        .with_context(|| format!("failed to read trace file '{}'", trace_path.display()))?;

    let Some(program_path) = file else {
        return print_trace_summary(&content);
    };

    let program = load_program(program_path)?;
    let replayer = TraceReplayer::from_jsonl(&content)?;
    if !replayer.is_trace_complete() {
        tracing::warn!("trace has no footer; the recorded run may have been cut short");
    }
    let effect_count = replayer.entries().len();

    let mut console = ReplayConsole::new(StdConsole::default(), replayer);
    let outcome = run_program(&program, &mut console);
    let status = match outcome {
        // A divergence surfaces as a console error.
        Err(e) if e.kind == ErrorKind::Io => exit_with(&e),
        Err(e) => {
            eprintln!("{}", e);
            "error"
        }
        Ok(_) => "success",
    };
    console.verify_complete()?;
    console.verify_program_status(status)?;

    eprintln!("Replay successful: {} effects replayed.", effect_count);
    Ok(())
}

fn print_trace_summary(content: &str) -> Result<()> {
    let mut effects = Vec::new();
    for (i, line) in content.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let record: TraceRecord = serde_json::from_str(line)
            .with_context(|| format!("invalid trace record at line {}", i + 1))?;
        match record {
            TraceRecord::Header(h) => println!(
                "Trace schema: v{}, mode: {}",
                h.schema_version,
                if h.full_values {
                    "full (replay-capable)"
                } else {
                    "audit (hashed)"
                }
            ),
            TraceRecord::Effect(entry) => effects.push(entry),
            TraceRecord::Footer(f) => {
                println!("Trace summary: {} effects", effects.len());
                for entry in effects.drain(..) {
                    let shown = entry
                        .value
                        .map(|v| format!("{:?}", v))
                        .unwrap_or_else(|| format!("<{} bytes, {}>", entry.value_size, entry.value_hash));
                    println!(
                        "  [{}] {} {} - {}ms",
                        entry.seq, entry.operation, shown, entry.duration_ms
                    );
                }
                println!("Program: {}, Trace: {}", f.program_status, f.trace_status);
                return Ok(());
            }
        }
    }

    println!("Trace summary: {} effects (incomplete, no footer)", effects.len());
    for entry in effects {
        println!("  [{}] {} - {}ms", entry.seq, entry.operation, entry.duration_ms);
    }
    Ok(())
}

fn cmd_dump(file: &Path, format: Format) -> Result<()> {
    let program = load_program(file)?;
    match format {
        Format::Pretty => println!("{:#?}", program),
        Format::Json => println!("{}", serde_json::to_string_pretty(&program)?),
    }
    Ok(())
}

/// Report a runtime error the way programs observe it and exit with status 1.
fn exit_with(e: &RuntimeError) -> ! {
    tracing::debug!(kind = %e.kind, "program aborted");
    eprintln!("{}", e);
    std::process::exit(1);
}
