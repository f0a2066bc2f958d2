// SPDX-License-Identifier: MIT
//
// kilo: a minimal terminal editor core.
//
// This is the main binary that wires the two crates together:
//
//   kilo-term   → raw mode, window size, key decoding, buffered output
//   kilo-editor → editor state, frame rendering, the session loop
//
// Startup and shutdown:
//
//   enable raw mode → probe window size → session loop → restore terminal
//
// Any fatal error erases the screen, homes the cursor, prints
// `kilo: <what failed>: <cause>` to stderr and exits with status 1. The
// raw-mode guard is dropped before the diagnostic is printed, so the shell
// gets its line discipline back no matter how the session ended.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use kilo_editor::inspect;
use kilo_editor::render;
use kilo_editor::session::Session;
use kilo_editor::state::EditorState;
use kilo_term::terminal::{self, RawMode};
use kilo_term::tty::{TtyReader, TtyWriter};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "KILO_LOG";

// ─── Command line ───────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "kilo", version, about = "A minimal terminal editor core")]
struct Cli {
    /// Raw-mode read timeout, rounded up to tenths of a second.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    read_timeout_ms: u64,

    /// Write logs to this file. Logging is off without it.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log filter used when KILO_LOG is unset.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Print each decoded key instead of running the editor. `q` stops.
    #[arg(long)]
    inspect_keys: bool,
}

impl Cli {
    const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Install a file subscriber if `--log-file` was given.
///
/// The terminal belongs to the editor, so logs never go to stdout or stderr.
fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level)
            .with_context(|| format!("invalid log level {:?}", cli.log_level))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("install log subscriber")
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Run the editor (or the key inspector) with the terminal in raw mode.
fn run(cli: &Cli) -> Result<()> {
    let mut input = TtyReader::stdin();
    let mut output = TtyWriter::stdout();

    if !terminal::is_tty(input.fd()) {
        bail!("standard input is not a terminal");
    }
    let raw = RawMode::enable(input.fd(), cli.read_timeout()).context("enable raw mode")?;

    let result = if cli.inspect_keys {
        tracing::info!("key inspector started");
        inspect::run(&mut input, &mut output).context("inspect keys")
    } else {
        edit(&mut input, &mut output)
    };

    let restored = raw.disable().context("restore terminal settings");
    result.and(restored)
}

fn edit(input: &mut TtyReader, output: &mut TtyWriter) -> Result<()> {
    let size =
        terminal::window_size(output.fd(), input, output).context("get window size")?;
    tracing::info!(rows = size.rows, cols = size.cols, "session started");

    let mut session = Session::new(EditorState::new(size), input, output);
    session.run().context("editor session")?;

    tracing::info!(cursor = ?session.state().cursor(), "session ended");
    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("kilo: {e:#}");
        return ExitCode::FAILURE;
    }

    finish(run(&cli), &mut TtyWriter::stdout(), &mut io::stderr())
}

/// Turn the outcome of a run into an exit code.
///
/// On error the screen is erased and the cursor homed, then the diagnostic
/// `kilo: <context>: <cause>` goes to `diag`. Success writes nothing.
fn finish(result: Result<()>, screen: &mut impl Write, diag: &mut impl Write) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            let _ = render::clear_screen(screen);
            let _ = writeln!(diag, "kilo: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
