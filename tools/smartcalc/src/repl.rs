//! Interactive session

use crate::keys;
use crate::output::{print_ai, print_history, print_mode, print_script, print_state};
use crate::session::{Coordinator, Session};
use anyhow::{bail, Context, Result};
use colored::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use smartcalc_core::script::DEFAULT_SCRIPT;
use smartcalc_core::{AiQueryState, AngleUnit, ModeKind, ScientificKey, Theme};

type CalcEditor = Editor<CalcHelper, DefaultHistory>;

const COMMANDS: [&str; 18] = [
    ":mode", ":deg", ":rad", ":inv", ":clear", ":back", ":history", ":recall", ":limit",
    ":theme", ":script", ":run", ":ask", ":state", ":help", ":quit", ":exit", ":q",
];

/// Ends multi-line script entry
const SCRIPT_END: &str = ".";

enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// Tab Completion Helper
// ============================================================================

struct CalcHelper;

impl Helper for CalcHelper {}

impl Hinter for CalcHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for CalcHelper {}

impl Validator for CalcHelper {}

impl Completer for CalcHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let start = line.rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let word = &line[start..];

        if start == 0 && word.starts_with(':') {
            return Ok((0, candidates(COMMANDS.iter().copied(), word)));
        }
        if line.starts_with(":mode ") {
            let modes = ModeKind::ALL.iter().map(|m| m.as_str());
            return Ok((start, candidates(modes, word)));
        }
        if line.starts_with(":theme ") {
            return Ok((start, candidates(["light", "dark", "system"].into_iter(), word)));
        }
        if !word.is_empty() && !line.starts_with(':') {
            let names = [
                "sin", "cos", "tan", "sinh", "cosh", "tanh", "log", "ln", "sqrt", "square",
                "cube", "factorial", "abs", "recip", "pow10", "exp",
            ];
            return Ok((start, candidates(names.into_iter(), word)));
        }
        Ok((pos, vec![]))
    }
}

fn candidates<'a>(words: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<Pair> {
    words
        .filter(|w| w.starts_with(prefix))
        .map(|w| Pair {
            display: w.to_string(),
            replacement: w.to_string(),
        })
        .collect()
}

// ============================================================================
// REPL loop
// ============================================================================

pub async fn run_repl(session: &mut Session) -> Result<()> {
    let coordinator = session.coordinator()?;

    let config = rustyline::Config::builder()
        .completion_type(rustyline::CompletionType::List)
        .build();
    let mut rl: CalcEditor = Editor::with_config(config).context("Failed to initialize readline")?;
    rl.set_helper(Some(CalcHelper));

    println!("{}", "SmartCalc".bright_cyan().bold());
    println!(
        "Type keys like '{}' or '{}', '{}' for commands, {} for completion\n",
        "7 + 5 =".bright_yellow(),
        "90 sin".bright_yellow(),
        ":help".bright_yellow(),
        "Tab".bright_cyan()
    );
    print_state(&session.calc().lock());

    loop {
        let prompt = prompt(session);
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match execute(session, &coordinator, &mut rl, line).await {
                    Ok(Flow::Continue) => {},
                    Ok(Flow::Quit) => break,
                    Err(e) => eprintln!("{} {:#}", "Error:".red(), e),
                }
                if let Err(e) = session.persist().await {
                    eprintln!("{} {:#}", "Error:".red(), e);
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            },
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", "Readline error:".red(), e);
                break;
            },
        }
    }

    session.persist().await?;
    println!("Bye!");
    Ok(())
}

fn prompt(session: &Session) -> String {
    let calc = session.calc().lock();
    let scientific = calc.scientific();
    match calc.mode_kind() {
        ModeKind::Standard => "std> ".to_string(),
        ModeKind::Scientific => format!(
            "sci[{}{}]> ",
            scientific.angle_unit,
            if scientific.inverse_active { " inv" } else { "" }
        ),
        ModeKind::Ai => "ai> ".to_string(),
        ModeKind::FormulaScript => "formula> ".to_string(),
    }
}

async fn execute(
    session: &Session,
    coordinator: &Coordinator,
    rl: &mut CalcEditor,
    line: &str,
) -> Result<Flow> {
    if !line.starts_with(':') {
        if session.calc().lock().mode_kind() == ModeKind::Ai {
            ask(session, coordinator, line).await?;
        } else {
            press_keys(session, line)?;
        }
        return Ok(Flow::Continue);
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        ":quit" | ":exit" | ":q" => return Ok(Flow::Quit),
        ":help" | ":?" => print_help(),
        ":mode" => switch_mode(session, arg)?,
        ":deg" => set_angle_unit(session, AngleUnit::Degrees),
        ":rad" => set_angle_unit(session, AngleUnit::Radians),
        ":inv" => {
            let mut calc = session.calc().lock();
            calc.toggle_inverse();
            print_mode(&calc);
        },
        ":clear" => {
            let mut calc = session.calc().lock();
            calc.clear();
            print_state(&calc);
        },
        ":back" => {
            let mut calc = session.calc().lock();
            calc.backspace();
            print_state(&calc);
        },
        ":state" => {
            let calc = session.calc().lock();
            print_mode(&calc);
            print_state(&calc);
        },
        ":history" => {
            let mut calc = session.calc().lock();
            if arg == "clear" {
                calc.clear_history();
            }
            print_history(calc.history().items(), calc.history().limit());
        },
        ":recall" => {
            let index: usize = arg
                .parse()
                .with_context(|| format!("Usage: :recall <index>, got '{}'", arg))?;
            let mut calc = session.calc().lock();
            calc.recall(index)?;
            print_state(&calc);
        },
        ":limit" => {
            let mut calc = session.calc().lock();
            if !arg.is_empty() {
                let limit: usize = arg
                    .parse()
                    .with_context(|| format!("Usage: :limit <n>, got '{}'", arg))?;
                if limit == 0 {
                    bail!("History limit must be at least 1");
                }
                calc.set_history_limit(limit);
            }
            println!("History limit: {}", calc.history().limit());
        },
        ":theme" => {
            let mut calc = session.calc().lock();
            if !arg.is_empty() {
                calc.set_theme(arg.parse::<Theme>()?);
            }
            println!("Theme: {}", calc.theme());
        },
        ":script" => edit_script(session, rl)?,
        ":run" => run_script(session)?,
        ":ask" => ask(session, coordinator, arg).await?,
        unknown => println!(
            "Unknown command '{}'. Type '{}' for available commands.",
            unknown.red(),
            ":help".bright_yellow()
        ),
    }
    Ok(Flow::Continue)
}

fn press_keys(session: &Session, line: &str) -> Result<()> {
    let keys = keys::tokenize(line);
    let mut calc = session.calc().lock();
    let result = keys::press_all(&mut calc, &keys);
    print_state(&calc);
    result?;
    Ok(())
}

fn switch_mode(session: &Session, arg: &str) -> Result<()> {
    let mut calc = session.calc().lock();
    if !arg.is_empty() {
        let kind: ModeKind = arg.parse()?;
        calc.switch_mode(kind);
        // a fresh formula mode starts from the sample script
        let empty_script = calc.script().is_some_and(|s| s.source().trim().is_empty());
        if empty_script {
            calc.set_script(DEFAULT_SCRIPT);
        }
    }
    print_mode(&calc);
    if let Some(script) = calc.script() {
        println!("{}", script.source().dimmed());
    }
    Ok(())
}

fn set_angle_unit(session: &Session, unit: AngleUnit) {
    let mut calc = session.calc().lock();
    if calc.scientific().angle_unit != unit {
        calc.toggle_angle_unit();
    }
    print_mode(&calc);
}

/// Read script lines until a line holding only `.`
fn edit_script(session: &Session, rl: &mut CalcEditor) -> Result<()> {
    println!(
        "Enter the script, one statement per line; finish with '{}'",
        SCRIPT_END.bright_yellow()
    );
    let mut lines = Vec::new();
    loop {
        match rl.readline("... ") {
            Ok(line) if line.trim() == SCRIPT_END => break,
            Ok(line) => lines.push(line),
            Err(ReadlineError::Interrupted) => {
                println!("Script entry cancelled");
                return Ok(());
            },
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read script"),
        }
    }

    session.calc().lock().set_script(&lines.join("\n"));
    run_script(session)
}

fn run_script(session: &Session) -> Result<()> {
    let mut calc = session.calc().lock();
    if calc.script().is_none() {
        bail!("No script; switch with ':mode formula' or enter one with ':script'");
    }
    calc.run_script();
    print_script(calc.script_results());
    print_state(&calc);
    Ok(())
}

async fn ask(session: &Session, coordinator: &Coordinator, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Usage: :ask <question>");
    }
    print_ai(&AiQueryState::Pending);
    let state = session.ask(coordinator, query).await?;
    print_ai(&state);
    if matches!(state, AiQueryState::Succeeded(_)) {
        print_state(&session.calc().lock());
    }
    Ok(())
}

fn print_help() {
    println!("{}", "Keys".bright_cyan().bold());
    println!("  digits, . ( ) π e        operand input, e.g. '12.5' or '2π'");
    println!("  + - × ÷ * / ^ %          operators");
    println!("  =                        evaluate");
    let names: Vec<String> = ScientificKey::ALL
        .iter()
        .map(|k| k.resolve(false).label().to_string())
        .collect();
    println!("  {}", names.join(" "));
    println!("                           scientific keys apply to the displayed value");
    println!();
    println!("{}", "Commands".bright_cyan().bold());
    println!("  :mode [standard|scientific|ai|formula]   show or switch mode");
    println!("  :deg / :rad / :inv       angle unit and inverse toggle");
    println!("  :clear / :back           clear entry, delete last character");
    println!("  :state                   show mode, formula and display");
    println!("  :history [clear]         show or clear history");
    println!("  :recall <n>              load history entry n into the display");
    println!("  :limit [n]               show or set history size");
    println!("  :theme [light|dark|system]");
    println!("  :script                  enter a formula script, end with '.'");
    println!("  :run                     run the current script again");
    println!("  :ask <question>          ask the AI solver");
    println!("  :quit                    leave");
    println!();
    println!("In ai mode every line that is not a command is sent as a question.");
}
