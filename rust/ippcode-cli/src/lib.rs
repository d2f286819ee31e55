//! IPPcode CLI library.
//!
//! Option handling, program and input files, the statistics report and
//! diagnostics rendering for the `ippcode` binary.

pub mod colors;
pub mod config;
pub mod error_chain;
pub mod logging;
pub mod stats_file;

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};
use ippcode_core::error_codes;
use ippcode_core::loader::load_program_from_reader;
use ippcode_core::LoadError;
use ippcode_vm::{LineSource, ReaderLines, RunStats, Sink, VmError, VM};
use thiserror::Error;
use tracing::debug;

use crate::colors::{gray, paint, red, yellow};
use crate::config::IppcodeConfig;
use crate::error_chain::chain_from_error;
use crate::stats_file::{write_stats, Counter};

#[derive(Parser, Debug)]
#[command(name = "ippcode", version, about = "Interpreter for IPPcode19 programs")]
pub struct Cli {
    /// Program document (JSON); read from stdin when omitted
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Lines consumed by READ; stdin when omitted
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Write the requested counters to FILE after the run
    #[arg(long, value_name = "FILE")]
    pub stats: Option<PathBuf>,

    /// Report the number of executed instructions
    #[arg(long)]
    pub insts: bool,

    /// Report the peak number of initialized variables
    #[arg(long)]
    pub vars: bool,
}

/// Parsed command line, with counters in the order the flags appeared.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    pub source: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub stats: Option<PathBuf>,
    pub counters: Vec<Counter>,
}

impl Invocation {
    pub fn parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Cli::command().try_get_matches_from(args)?;
        let cli = Cli::from_arg_matches(&matches)?;

        let mut counters = Vec::new();
        for (set, id, counter) in [
            (cli.insts, "insts", Counter::Insts),
            (cli.vars, "vars", Counter::Vars),
        ] {
            if set {
                counters.push((matches.index_of(id).unwrap_or(usize::MAX), counter));
            }
        }
        counters.sort_by_key(|(index, _)| *index);

        Ok(Self {
            source: cli.source,
            input: cli.input,
            stats: cli.stats,
            counters: counters.into_iter().map(|(_, c)| c).collect(),
        })
    }

    /// Check option combinations and pick the statistics file, if any.
    pub fn stats_path(&self, config: &IppcodeConfig) -> Result<Option<PathBuf>, CliError> {
        if self.source.is_none() && self.input.is_none() {
            return Err(CliError::Usage(
                "at least one of --source and --input is required".into(),
            ));
        }
        match (&self.stats, self.counters.is_empty()) {
            (Some(_), true) => Err(CliError::Usage(
                "--stats requires --insts or --vars".into(),
            )),
            (Some(path), false) => Ok(Some(path.clone())),
            (None, false) => match &config.stats.path {
                Some(path) => Ok(Some(path.clone())),
                None => Err(CliError::Usage(
                    "--insts and --vars require --stats".into(),
                )),
            },
            (None, true) => Ok(None),
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot read source file '{path}'")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot open input file '{path}'")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error("cannot write statistics to '{path}'")]
    Stats {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => error_codes::BAD_INVOCATION,
            CliError::Source { .. } | CliError::Input { .. } => error_codes::INPUT_FILE,
            CliError::Load(e) => e.exit_code(),
            CliError::Vm(e) => e.exit_code(),
            CliError::Stats { .. } => error_codes::OUTPUT_FILE,
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// 0 or the `EXIT` value.
    pub code: i32,
    pub stats: RunStats,
    pub output: Sink,
    pub diagnostics: Sink,
}

/// Load the program, run it and write the statistics report.
pub fn run(
    invocation: &Invocation,
    config: &IppcodeConfig,
    output: Sink,
    diagnostics: Sink,
) -> Result<RunReport, CliError> {
    let stats_path = invocation.stats_path(config)?;
    debug!(
        source = ?invocation.source,
        input = ?invocation.input,
        stats = ?stats_path,
        "starting run"
    );

    let program = match &invocation.source {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Source {
                path: path.clone(),
                source,
            })?;
            load_program_from_reader(BufReader::new(file))?
        }
        None => load_program_from_reader(io::stdin().lock())?,
    };

    let input: Box<dyn LineSource> = match &invocation.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            })?;
            Box::new(ReaderLines::new(BufReader::new(file)))
        }
        None => Box::new(ReaderLines::new(io::stdin().lock())),
    };

    let mut vm = VM::new();
    vm.set_input(input);
    vm.set_output(output);
    vm.set_diagnostics(diagnostics);
    vm.load(program);
    let code = vm.execute()?;
    let stats = vm.stats();

    if let Some(path) = stats_path {
        write_stats(&path, &invocation.counters, &stats)
            .map_err(|source| CliError::Stats { path, source })?;
    }

    Ok(RunReport {
        code,
        stats,
        output: std::mem::take(&mut vm.output),
        diagnostics: std::mem::take(&mut vm.diagnostics),
    })
}

/// `error: <message>` followed by the cause chain.
pub fn render_error(err: &CliError, color: bool) -> String {
    let chain = chain_from_error(err);
    let text = chain.format_with_prefix(&paint(color, red, "error:"));
    let code = format!("(exit code {}: {})", err.exit_code(), error_codes::describe(err.exit_code()));
    format!("{}\n{}", text, paint(color, gray, &code))
}

/// Full command-line entry point. Returns the process exit status.
pub fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let stderr_color = io::stderr().is_terminal();

    let invocation = match Invocation::parse_from(args) {
        Ok(invocation) => invocation,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                error_codes::BAD_INVOCATION
            } else {
                error_codes::SUCCESS
            };
        }
    };

    let config = IppcodeConfig::load().unwrap_or_else(|msg| {
        eprintln!("{} {}", paint(stderr_color, yellow, "warning:"), msg);
        IppcodeConfig::default()
    });
    logging::init(config.log.as_deref());

    let output = Sink::writer(BufWriter::new(io::stdout()));
    let diagnostics = Sink::writer(io::stderr());
    match run(&invocation, &config, output, diagnostics) {
        Ok(report) => report.code,
        Err(err) => {
            eprintln!("{}", render_error(&err, config.color && stderr_color));
            err.exit_code()
        }
    }
}
