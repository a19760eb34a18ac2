//! CLI output formatting utilities.

use std::fmt::Write as _;
use std::time::Duration;

use colored::Colorize;
use serde_json::Value;

use crate::capsule::{Backend, ExpansionState, PanelView};

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &Value) {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    println!("{out}");
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    let closing = "  ".repeat(depth);

    match value {
        Value::Null => out.push_str(&"null".magenta().to_string()),
        Value::Bool(b) => out.push_str(&b.to_string().magenta().to_string()),
        Value::Number(n) => out.push_str(&n.to_string().yellow().to_string()),
        Value::String(s) => out.push_str(&format!("{s:?}").green().to_string()),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(items) => {
            out.push_str(&"[".bold().to_string());
            for (i, item) in items.iter().enumerate() {
                let _ = write!(out, "\n{indent}");
                write_value(out, item, depth + 1);
                if i + 1 < items.len() {
                    out.push(',');
                }
            }
            let _ = write!(out, "\n{closing}{}", "]".bold());
        }
        Value::Object(map) => {
            out.push_str(&"{".bold().to_string());
            for (i, (key, item)) in map.iter().enumerate() {
                let _ = write!(out, "\n{indent}{}: ", format!("{key:?}").cyan());
                write_value(out, item, depth + 1);
                if i + 1 < map.len() {
                    out.push(',');
                }
            }
            let _ = write!(out, "\n{closing}{}", "}".bold());
        }
    }
}

/// Colours an expansion state: settled states are bold, transient ones dimmed.
#[must_use]
pub fn format_state(state: ExpansionState) -> String {
    let label = format!("{state:<10}");
    match state {
        ExpansionState::Expanded => label.green().bold().to_string(),
        ExpansionState::Collapsed => label.blue().bold().to_string(),
        ExpansionState::Expanding | ExpansionState::Collapsing => label.yellow().to_string(),
    }
}

/// Formats a boolean as a colored check mark.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// One line describing a published panel view at `elapsed`.
#[must_use]
pub fn format_view(elapsed: Duration, view: &PanelView) -> String {
    let backend = match view.backend {
        Some(Backend::Native) => "native",
        Some(Backend::Fallback) => "fallback",
        None => "-",
    };
    let session = view.session.map_or_else(|| "-".to_string(), |id| id.to_string());

    format!(
        "[{:>6} ms] {} width={:<6} collapsed={} expanded={} focusable={} backend={backend} session={session}",
        elapsed.as_millis(),
        format_state(view.state),
        view.collapsed_width,
        format_bool(view.collapsed_content_visible),
        format_bool(view.expanded_content_visible),
        format_bool(view.focusable),
    )
}
