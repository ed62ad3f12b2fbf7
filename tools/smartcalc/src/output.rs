//! Terminal rendering

use chrono::{DateTime, Local};
use colored::*;
use smartcalc_core::builder::ERROR_DISPLAY;
use smartcalc_core::{
    AiQueryState, AiResponse, Calculator, Evaluator, HistoryItem, LineOutcome, LineResult,
    ModeKind,
};

/// Formula line above the display, calculator style
pub fn print_state<E: Evaluator>(calc: &Calculator<E>) {
    if !calc.formula().is_empty() {
        println!("  {}", calc.formula().dimmed());
    }
    let display = if calc.display() == ERROR_DISPLAY {
        calc.display().red().bold()
    } else {
        calc.display().bright_white().bold()
    };
    println!("  {}", display);
}

/// Mode line shown when entering a mode
pub fn print_mode<E: Evaluator>(calc: &Calculator<E>) {
    let scientific = calc.scientific();
    let detail = match calc.mode_kind() {
        ModeKind::Scientific => format!(
            " ({}{})",
            scientific.angle_unit,
            if scientific.inverse_active { ", inverse" } else { "" }
        ),
        _ => String::new(),
    };
    println!("{} {}{}", "Mode:".bright_cyan(), calc.mode_kind(), detail);
}

pub fn print_script(results: &[LineResult]) {
    for (n, line) in results.iter().enumerate() {
        let text = match &line.outcome {
            LineOutcome::Blank => continue,
            LineOutcome::Defined => line.text().dimmed(),
            LineOutcome::Value(v) => v.green(),
            LineOutcome::Error(msg) => msg.red(),
        };
        println!(
            "{:>3} │ {:<30} {}",
            (n + 1).to_string().dimmed(),
            line.source_text,
            text
        );
    }
}

pub fn print_ai(state: &AiQueryState) {
    match state {
        AiQueryState::Idle => {},
        AiQueryState::Pending => println!("{}", "Thinking...".dimmed()),
        AiQueryState::Succeeded(response) => print_response(response, false),
        AiQueryState::Failed(response) => print_response(response, true),
    }
}

fn print_response(response: &AiResponse, failed: bool) {
    let result = if failed {
        response.result.red().bold()
    } else {
        response.result.bright_white().bold()
    };
    println!("  {} {}", "Result:".bright_cyan(), result);
    if let Some(formula) = &response.formula_used {
        println!("  {} {}", "Formula:".bright_cyan(), formula);
    }
    if !response.steps.is_empty() {
        println!("  {}", "Steps:".bright_cyan());
        for (i, step) in response.steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step);
        }
    }
    if !response.reasoning.is_empty() {
        println!("  {} {}", "Reasoning:".bright_cyan(), response.reasoning.dimmed());
    }
}

pub fn print_history(items: &[HistoryItem], limit: usize) {
    if items.is_empty() {
        println!("{}", "No history yet".dimmed());
        return;
    }
    println!(
        "{}",
        format!("History ({} of {})", items.len(), limit).bright_cyan()
    );
    for (i, item) in items.iter().enumerate() {
        let time = DateTime::from_timestamp_millis(item.timestamp)
            .map(|t| t.with_timezone(&Local).format("%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let tag = if item.is_ai { " AI".magenta().to_string() } else { String::new() };
        println!(
            "{:>4}  {}  {} = {}{}",
            i,
            time.dimmed(),
            item.expression,
            item.result.bright_white().bold(),
            tag
        );
    }
}
