// ===============================
// src/prompt.rs
// ===============================
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Inputs {
    pub symbol: String,
    pub max_loss: f64,
}

/// Uppercase and suffix a user-entered symbol; `None` for blank input.
pub fn clean_symbol(raw: &str) -> Option<String> {
    let mut symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return None;
    }
    if !symbol.ends_with("USDT") {
        symbol.push_str("USDT");
    }
    Some(symbol)
}

pub fn parse_max_loss(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

fn read_line(label: &str) -> Option<String> {
    print!("{label}");
    io::stdout().flush().ok()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok()?;
    Some(buf)
}

fn try_prompt() -> Option<Inputs> {
    let symbol = clean_symbol(&read_line("Symbol (e.g. BTC): ")?)?;
    let max_loss = parse_max_loss(&read_line("Max loss in USDT: ")?)?;
    Some(Inputs { symbol, max_loss })
}

/// Ask for a symbol and a max-loss budget until both parse.
pub fn prompt_inputs() -> Inputs {
    loop {
        match try_prompt() {
            Some(inputs) => return inputs,
            None => {
                println!("Invalid input, try again.");
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}

/// Stdin is blocking; keep it off the async runtime.
pub async fn prompt_inputs_blocking() -> Inputs {
    tokio::task::spawn_blocking(prompt_inputs)
        .await
        .expect("prompt task panicked")
}
