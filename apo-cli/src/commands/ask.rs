//! `apo ask` command - one question, answered on stdout

use std::fmt::Write as _;
use std::sync::Arc;

use apo_core::agent::{Agent, AskResult, format_result};
use apo_core::source::DataSource;

/// Answer text as printed by `apo ask`.
pub fn render_answer(result: &AskResult) -> String {
    let mut out = String::new();
    if result.success {
        let _ = writeln!(out, "\n{}", result.message);
    } else {
        let _ = writeln!(out, "❌ {}", result.message);
    }

    if !result.suggestions.is_empty() {
        out.push('\n');
        for suggestion in &result.suggestions {
            let _ = writeln!(out, "  💡 {}", suggestion);
        }
    }

    if let Some(data) = &result.data {
        out.push('\n');
        out.push_str(&format_result(data));
    }
    out
}

pub async fn run_ask(source: Arc<dyn DataSource>, question: &str) -> AskResult {
    tracing::info!(source = source.name(), "answering question");
    let result = Agent::new(source).ask(question).await;
    println!("{}", render_answer(&result));
    result
}
