mod debug_report;

use aimlite::{Bot, Error, Session, Settings};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "aimlite",
    version,
    about = "Answer questions from rule-based conversation markup",
    after_help = "Exit codes:\n  0  Success.\n  1  Runtime error (unreadable or malformed rule source, session file).\n  2  Invalid arguments or configuration."
)]
struct Cli {
    /// Configuration file (default: aimlite.toml in the working directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rule source to load; repeat to load several, in order
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Bot attribute, e.g. --bot name=Ada
    #[arg(long = "bot", value_name = "NAME=VALUE", value_parser = parse_attribute)]
    bot: Vec<(String, String)>,

    /// Session snapshot to restore before and save after answering
    #[arg(long, value_name = "FILE")]
    session: Option<PathBuf>,

    /// Seed for <random>
    #[arg(long)]
    seed: Option<u64>,

    /// Print a trace of every turn and enable info logging
    #[arg(short, long)]
    verbose: bool,

    /// Force ANSI color output
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output
    #[arg(long)]
    no_color: bool,

    /// Question to answer; reads one question per line from stdin when omitted
    #[arg(value_name = "INPUT")]
    input: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] Error),

    #[error("rule loader stopped unexpectedly: {0}")]
    Loader(#[from] tokio::task::JoinError),

    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),

    #[error("no rule sources given; pass --file or list `sources` in aimlite.toml")]
    NoSources,
}

impl CliError {
    fn status_code(&self) -> &'static str {
        match self {
            Self::Engine(err) => err.status_code(),
            Self::Loader(_) => "LOADER_ERROR",
            Self::Input(_) => "INPUT_ERROR",
            Self::NoSources => "NO_SOURCES",
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoSources | Self::Engine(Error::Config(_)) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.status_code());
            err.exit_code()
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    apply_overrides(&mut settings, &cli);
    if settings.sources.is_empty() {
        return Err(CliError::NoSources);
    }
    debug!(?settings, "effective settings");

    let color = !cli.no_color && (cli.color || io::stdout().is_terminal());
    let bot = Arc::new(Bot::new(settings.profile()));
    let mut loader = Loader { handle: Some(bot.spawn_load(settings.sources.clone())) };

    let mut session = Session::with_options(bot.clone(), settings.options());
    if let Some(path) = settings.session.as_deref().filter(|p| p.exists()) {
        session.restore_from(path)?;
        info!(path = %path.display(), "session restored");
    }

    let turn = Turn { verbose: cli.verbose, color };
    if cli.input.is_empty() {
        answer_lines(&mut session, &mut loader, &turn).await?;
    } else {
        let answer = session.resolve(&cli.input.join(" ")).await;
        loader.check().await?;
        turn.print(&answer, &bot);
    }

    loader.finish().await?;
    if cli.verbose {
        debug_report::print_load(&bot, color);
    }

    if let Some(path) = &settings.session {
        session.save_to(path)?;
        info!(path = %path.display(), "session saved");
    }
    Ok(())
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if !cli.files.is_empty() {
        settings.sources = cli.files.clone();
    }
    settings.bot.extend(cli.bot.iter().cloned());
    if cli.session.is_some() {
        settings.session = cli.session.clone();
    }
    if cli.seed.is_some() {
        settings.engine.seed = cli.seed;
    }
}

async fn answer_lines(session: &mut Session, loader: &mut Loader, turn: &Turn) -> Result<(), CliError> {
    let interactive = io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let answer = session.resolve(&line).await;
        loader.check().await?;
        turn.print(&answer, session.bot());
    }
    Ok(())
}

struct Turn {
    verbose: bool,
    color: bool,
}

impl Turn {
    fn print(&self, answer: &aimlite::Answer, bot: &Bot) {
        if self.verbose {
            debug_report::print_turn(answer, bot, self.color);
            return;
        }
        match &answer.answer {
            Some(text) => println!("{text}"),
            None => eprintln!("{}", debug_report::no_answer(answer, self.color)),
        }
    }
}

/// Background load of the configured rule sources.
struct Loader {
    handle: Option<JoinHandle<aimlite::Result<usize>>>,
}

impl Loader {
    /// Surface a load failure as soon as the task has ended.
    async fn check(&mut self) -> Result<(), CliError> {
        if self.handle.as_ref().is_some_and(JoinHandle::is_finished) {
            self.finish().await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), CliError> {
        if let Some(handle) = self.handle.take() {
            let categories = handle.await??;
            info!(categories, "rule sources loaded");
        }
        Ok(())
    }
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
