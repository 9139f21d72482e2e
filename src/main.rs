use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gijigo::{
    manager::{Manager, ManagerConfig, describe},
    program::Program,
};
use tracing_subscriber::EnvFilter;

/// gijigo compiles algorithm-teaching pseudocode into labeled transition
/// systems and runs it, whole or one statement at a time.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Logs compilation and calls; `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compiles and runs a source file, then prints the final bindings.
    Run {
        /// The source file.
        file: PathBuf,
    },
    /// Compiles a source file into a program record.
    Compile {
        /// The source file.
        file:   PathBuf,
        /// Where to write the record; printed to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Advances a saved program by one statement and saves it again.
    Step {
        /// The program record.
        #[arg(short, long, default_value = "execution_info.json")]
        state:  PathBuf,
        /// Compiles this source file instead of loading the record.
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Starts the interactive menu.
    Interactive {
        /// The record used by save and restore when no path is entered.
        #[arg(short, long, default_value = "execution_info.json")]
        state: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match execute(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(io::stderr)
                             .init();
}

fn execute(command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Run { file } => {
            let mut program = compile_file(&file)?;
            let result = program.run()
                                .with_context(|| format!("Failed to run '{}'", file.display()))?;
            write!(out, "{}", program.main().store())?;
            if let Some(value) = result {
                writeln!(out, "return {value}")?;
            }
        },
        Command::Compile { file, output } => {
            let json = compile_file(&file)?.to_json()?;
            match output {
                Some(path) => fs::write(&path, json).with_context(|| {
                                                       format!("Failed to write '{}'", path.display())
                                                   })?,
                None => writeln!(out, "{json}")?,
            }
        },
        Command::Step { state, source } => {
            let mut program = match source {
                Some(file) => compile_file(&file)?,
                None => {
                    let json = fs::read_to_string(&state).with_context(|| {
                                   format!("Failed to read the program record '{}'. Perhaps this \
                                            file does not exist?",
                                           state.display())
                               })?;
                    Program::from_json(&json).with_context(|| {
                                                 format!("Invalid program record '{}'",
                                                         state.display())
                                             })?
                },
            };
            let outcome = program.step()?;
            writeln!(out, "{}", describe(&outcome))?;
            let frames = program.position().map(|p| p.call_stack()).unwrap_or_default();
            for (function, state) in frames {
                writeln!(out, "  {}:{state}", function.unwrap_or("main"))?;
            }
            fs::write(&state, program.to_json()?).with_context(|| {
                                                      format!("Failed to write '{}'",
                                                              state.display())
                                                  })?;
        },
        Command::Interactive { state } => {
            let mut manager = Manager::new(ManagerConfig { record_path: state });
            let stdin = io::stdin();
            manager.interactive(&mut stdin.lock(), &mut out)?;
        },
    }
    Ok(())
}

fn compile_file(path: &Path) -> Result<Program> {
    let source = fs::read_to_string(path).with_context(|| {
                                              format!("Failed to read the input file '{}'. \
                                                       Perhaps this file does not exist?",
                                                      path.display())
                                          })?;
    Program::compile(&source).with_context(|| format!("Failed to compile '{}'", path.display()))
}
