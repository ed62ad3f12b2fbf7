//! Keypad input parsed from text

use smartcalc_core::{Calculator, Evaluator, HistoryItem, ScientificKey};

const OPERATOR_CHARS: [char; 8] = ['+', '-', '*', '/', '×', '÷', '^', '%'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Digits, decimal point, parentheses or a constant
    Operand(String),
    Operator(String),
    Equals,
    Scientific(ScientificKey),
}

/// Split a line into keypad presses
///
/// Whitespace-separated words naming a scientific key (`sin`, `√`, `1/x`)
/// or `=` are single keys. Anything else is split at operator characters.
/// A `-` with no operand before it is a sign.
pub fn tokenize(line: &str) -> Vec<Key> {
    let mut keys = Vec::new();

    for word in line.split_whitespace() {
        if word == "=" {
            keys.push(Key::Equals);
            continue;
        }
        if let Ok(key) = word.parse::<ScientificKey>() {
            keys.push(Key::Scientific(key));
            continue;
        }

        let mut operand = String::new();
        for c in word.chars() {
            if c == '=' {
                flush(&mut operand, &mut keys);
                keys.push(Key::Equals);
            } else if OPERATOR_CHARS.contains(&c) {
                let starts_operand = operand.is_empty()
                    && matches!(keys.last(), None | Some(Key::Operator(_)));
                if c == '-' && starts_operand {
                    operand.push(c);
                } else {
                    flush(&mut operand, &mut keys);
                    keys.push(Key::Operator(display_operator(c).to_string()));
                }
            } else {
                operand.push(c);
            }
        }
        flush(&mut operand, &mut keys);
    }
    keys
}

fn flush(operand: &mut String, keys: &mut Vec<Key>) {
    if !operand.is_empty() {
        keys.push(Key::Operand(std::mem::take(operand)));
    }
}

fn display_operator(c: char) -> char {
    match c {
        '*' => '×',
        '/' => '÷',
        other => other,
    }
}

/// Press one key; history-producing keys return the new entry
pub fn press<E: Evaluator>(
    calc: &mut Calculator<E>,
    key: &Key,
) -> smartcalc_core::Result<Option<HistoryItem>> {
    match key {
        Key::Operand(token) => {
            calc.press_digit(token);
            Ok(None)
        },
        Key::Operator(op) => {
            calc.press_operator(op);
            Ok(None)
        },
        Key::Equals => calc.evaluate().map(Some),
        Key::Scientific(key) => calc.apply_scientific(*key),
    }
}

/// Press every key, stopping at the first failure
pub fn press_all<E: Evaluator>(
    calc: &mut Calculator<E>,
    keys: &[Key],
) -> smartcalc_core::Result<Vec<HistoryItem>> {
    let mut items = Vec::new();
    for key in keys {
        if let Some(item) = press(calc, key)? {
            items.push(item);
        }
    }
    Ok(items)
}
