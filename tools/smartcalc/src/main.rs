//! SmartCalc - terminal calculator
//!
//! Standard and scientific keypads, multi-line formula scripts and
//! natural-language math questions, with history kept between runs.

mod keys;
mod output;
mod repl;
mod session;

use crate::output::{print_ai, print_history, print_script, print_state};
use crate::session::Session;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::logging::{self, LogConfig};
use common::SmartCalcConfig;
use smartcalc_core::{AiQueryState, ModeKind};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "smartcalc")]
#[command(about = "SmartCalc - calculator with scientific keys, formula scripts and AI answers")]
#[command(long_about = "SmartCalc - calculator with scientific keys, formula scripts and AI answers

Examples:
  smartcalc                          # interactive session
  smartcalc eval '7 + 5'             # evaluate through the keypad
  smartcalc eval 90 sin              # scientific key on a value
  smartcalc run area.calc            # run a formula script
  smartcalc ask 'what is 15% of 80'  # ask the AI solver
  smartcalc history --limit 25       # show history, keep the newest 25")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (default: $SMARTCALC_CONFIG or ./smartcalc.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State file holding theme and history (overrides the configuration)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Repl,

    /// Evaluate keypad input and print the display
    Eval {
        /// Keys, e.g. `7 + 5` or `2 × -3 =` or `90 sin`
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        expression: Vec<String>,
    },

    /// Run a formula script file and print every line result
    Run {
        file: PathBuf,
    },

    /// Ask the AI solver one question
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show, clear or resize the history
    History {
        /// Remove every entry
        #[arg(long)]
        clear: bool,

        /// Keep at most this many entries
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        limit: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config =
        SmartCalcConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(state) = cli.state {
        config.state_file = state;
    }

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log.level.clone()
    };
    logging::init_with_config(&LogConfig {
        app_name: "smartcalc".to_string(),
        level,
        log_dir: config.log.dir.clone(),
        console: true,
    })
    .context("Failed to initialize logging")?;

    let mut session = Session::open(&config).await?;

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl::run_repl(&mut session).await,
        Commands::Eval { expression } => eval(&mut session, &expression.join(" ")).await,
        Commands::Run { file } => run(&mut session, &file).await,
        Commands::Ask { query } => ask(&mut session, &query.join(" ")).await,
        Commands::History { clear, limit } => history(&mut session, clear, limit).await,
    }
}

async fn eval(session: &mut Session, expression: &str) -> Result<()> {
    let mut keys = keys::tokenize(expression);
    if !matches!(
        keys.last(),
        Some(keys::Key::Equals | keys::Key::Scientific(_))
    ) {
        keys.push(keys::Key::Equals);
    }

    let result = {
        let mut calc = session.calc().lock();
        let result = keys::press_all(&mut calc, &keys);
        print_state(&calc);
        result
    };
    session.persist().await?;
    result.with_context(|| format!("Failed to evaluate '{}'", expression))?;
    Ok(())
}

async fn run(session: &mut Session, file: &Path) -> Result<()> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read script {}", file.display()))?;

    let item = {
        let mut calc = session.calc().lock();
        calc.switch_mode(ModeKind::FormulaScript);
        calc.set_script(&source);
        let item = calc.run_script();
        print_script(calc.script_results());
        item
    };
    session.persist().await?;

    match item {
        Some(item) => println!("= {}", item.result),
        None => println!("(no value)"),
    }
    Ok(())
}

async fn ask(session: &mut Session, query: &str) -> Result<()> {
    let coordinator = session.coordinator()?;
    session.calc().lock().switch_mode(ModeKind::Ai);

    let state = session.ask(&coordinator, query).await?;
    session.persist().await?;

    print_ai(&state);
    if let AiQueryState::Failed(response) = state {
        bail!("{}", response.message().unwrap_or(response.result.as_str()));
    }
    Ok(())
}

async fn history(session: &mut Session, clear: bool, limit: Option<u16>) -> Result<()> {
    {
        let mut calc = session.calc().lock();
        if clear {
            calc.clear_history();
        }
        if let Some(limit) = limit {
            calc.set_history_limit(usize::from(limit));
        }
        print_history(calc.history().items(), calc.history().limit());
    }
    session.persist().await
}
