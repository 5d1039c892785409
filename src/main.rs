//! `subc` — standalone binary.
//!
//! A thin wrapper around [`subc::compile`]: reads the source file named on
//! the command line, writes the generated assembly to `--output` (or
//! stdout), and turns a [`subc::diagnostic::CompileError`] into the
//! two-line diagnostic format on stderr plus a nonzero exit code. All
//! compiler logic lives in the library crate.
//!
//! # Exit codes
//!
//! - `0` — success
//! - `1` — usage error or compile error, reported on stderr

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use subc::diagnostic::{render, CompileError};

#[derive(Parser)]
#[command(name = "subc")]
#[command(about = "A single-pass compiler for a strict subset of C, targeting AArch64")]
#[command(version)]
struct Cli {
    /// The C source file to compile.
    source: PathBuf,

    /// Where to write the generated assembly. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.source) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}: {e}", cli.source.display());
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", render(&err, &cli.source.to_string_lossy(), &source));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, source: &str) -> Result<(), CompileError> {
    let asm = subc::compile(source)?;

    match &cli.output {
        Some(path) => fs::write(path, asm)
            .map_err(|e| CompileError::bare(format!("{}: {e}", path.display())))?,
        None => {
            std::io::stdout()
                .write_all(asm.as_bytes())
                .map_err(|e| CompileError::bare(e.to_string()))?;
        }
    }

    Ok(())
}
