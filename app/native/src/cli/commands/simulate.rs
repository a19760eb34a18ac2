//! Hover script replay against a headless capsule.
//!
//! A script is a list of lines `<delay_ms> <command> [arg]`. Each delay is
//! measured from the previous step. Blank lines and lines starting with `#`
//! are ignored.
//!
//! ```text
//! # hover long enough to expand, then leave
//! 0    hover in
//! 400  hover out
//! 600  wait
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::time::Instant;

use super::super::output::{format_view, print_highlighted_json};
use crate::capsule::{CapsuleHandle, ExpansionController, Rect};
use crate::config::{self, CapsuleConfig};
use crate::error::CapsuleError;
use crate::platform::Platform;
use crate::platform::headless::{HeadlessNativeAnimator, HeadlessWindow};

/// Arguments for `capsule simulate`.
#[derive(Args, Debug)]
#[command(after_long_help = r"Commands:
  hover in|out      report the pointer entering or leaving the hover zone
  hold on|off       hold the panel open
  force on|off      pin the panel expanded
  expand            expand now
  collapse          collapse unless held
  force-collapse    collapse even if held
  width <px>|none   set the collapsed width hint
  wait              do nothing

Examples:
  capsule simulate --script hover.txt
  printf '0 hover in\n300 hover out\n' | capsule simulate --native")]
pub struct SimulateArgs {
    /// Script file to replay. Reads stdin when omitted.
    #[arg(long, short, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Override the expand delay in milliseconds.
    #[arg(long, value_name = "MS")]
    pub expand_delay: Option<u64>,

    /// Override the collapse delay in milliseconds.
    #[arg(long, value_name = "MS")]
    pub collapse_delay: Option<u64>,

    /// Animate with a simulated native mask layer instead of window resizes.
    #[arg(long)]
    pub native: bool,

    /// Make the simulated native layer refuse to start animations.
    #[arg(long, requires = "native")]
    pub native_fails: bool,

    /// Time to keep running after the last step, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub settle: u64,

    /// Print the final controller snapshot as plain JSON.
    #[arg(long)]
    pub json: bool,
}

/// A single scripted action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptAction {
    Hover(bool),
    Hold(bool),
    Force(bool),
    Expand,
    Collapse,
    ForceCollapse,
    Width(Option<f64>),
    Wait,
}

/// An action and the delay before it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub delay: Duration,
    pub action: ScriptAction,
}

fn parse_switch(line: usize, arg: Option<&str>, on: &str, off: &str) -> Result<bool, CapsuleError> {
    match arg {
        Some(value) if value == on => Ok(true),
        Some(value) if value == off => Ok(false),
        _ => Err(CapsuleError::InvalidArguments(format!(
            "line {line}: expected '{on}' or '{off}'"
        ))),
    }
}

/// Parses a hover script.
///
/// # Errors
///
/// Returns [`CapsuleError::InvalidArguments`] naming the first bad line.
pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>, CapsuleError> {
    let mut steps = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let mut parts = text.split_whitespace();
        let delay = parts
            .next()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .ok_or_else(|| {
                CapsuleError::InvalidArguments(format!("line {line}: expected a delay in ms"))
            })?;
        let command = parts.next().ok_or_else(|| {
            CapsuleError::InvalidArguments(format!("line {line}: missing command"))
        })?;
        let arg = parts.next();

        let action = match command {
            "hover" => ScriptAction::Hover(parse_switch(line, arg, "in", "out")?),
            "hold" => ScriptAction::Hold(parse_switch(line, arg, "on", "off")?),
            "force" => ScriptAction::Force(parse_switch(line, arg, "on", "off")?),
            "expand" => ScriptAction::Expand,
            "collapse" => ScriptAction::Collapse,
            "force-collapse" => ScriptAction::ForceCollapse,
            "wait" => ScriptAction::Wait,
            "width" => match arg {
                Some("none") => ScriptAction::Width(None),
                Some(value) => ScriptAction::Width(Some(
                    value
                        .parse::<f64>()
                        .ok()
                        .filter(|width| width.is_finite() && *width > 0.0)
                        .ok_or_else(|| {
                            CapsuleError::InvalidArguments(format!(
                                "line {line}: invalid width '{value}'"
                            ))
                        })?,
                )),
                None => {
                    return Err(CapsuleError::InvalidArguments(format!(
                        "line {line}: width needs a value"
                    )));
                }
            },
            other => {
                return Err(CapsuleError::InvalidArguments(format!(
                    "line {line}: unknown command '{other}'"
                )));
            }
        };

        steps.push(ScriptStep { delay, action });
    }

    Ok(steps)
}

fn read_script(path: Option<&Path>) -> Result<String, CapsuleError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            CapsuleError::IoError(format!("Failed to read script {}: {err}", path.display()))
        }),
        None => Ok(std::io::read_to_string(std::io::stdin())?),
    }
}

fn apply(handle: &CapsuleHandle, action: ScriptAction) -> Result<(), CapsuleError> {
    match action {
        ScriptAction::Hover(inside) => handle.hover(inside)?,
        ScriptAction::Hold(held) => handle.set_manual_hold(held)?,
        ScriptAction::Force(enabled) => handle.set_dev_force_expanded(enabled)?,
        ScriptAction::Expand => handle.request_expand()?,
        ScriptAction::Collapse => handle.request_collapse()?,
        ScriptAction::ForceCollapse => handle.force_collapse()?,
        ScriptAction::Width(width) => handle.set_collapsed_width_hint(width)?,
        ScriptAction::Wait => {}
    }
    Ok(())
}

/// Execute `capsule simulate`.
///
/// # Errors
///
/// Returns an error if the script cannot be read or parsed, or the runtime
/// fails to start.
pub fn execute(args: &SimulateArgs) -> Result<(), CapsuleError> {
    let steps = parse_script(&read_script(args.script.as_deref())?)?;

    // Loads the configuration once, before the controller starts
    let mut config = config::init().clone();
    if let Some(ms) = args.expand_delay {
        config.hover.expand_delay_ms = ms;
    }
    if let Some(ms) = args.collapse_delay {
        config.hover.collapse_delay_ms = ms;
    }

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    runtime.block_on(run(config, &steps, args))
}

async fn run(config: CapsuleConfig, steps: &[ScriptStep], args: &SimulateArgs) -> Result<(), CapsuleError> {
    let collapsed = crate::capsule::Size::new(
        config.dimensions.collapsed_width,
        config.dimensions.collapsed_height,
    );
    let work_area = Rect::new(0.0, 0.0, 1512.0, 982.0);
    let window = Arc::new(
        HeadlessWindow::new(Rect::centered_at_top(collapsed, work_area.center_x(), 0.0))
            .with_work_area(Some(work_area)),
    );

    let platform = if args.native {
        let (native, events) = HeadlessNativeAnimator::new();
        native.set_fail_starts(args.native_fails);
        Platform::with_native(window, native, events)
    } else {
        Platform::window_only(window)
    };

    let started = Instant::now();
    let handle = ExpansionController::spawn(config, platform);

    let mut subscriber = handle.subscribe();
    println!("{}", format_view(started.elapsed(), &handle.view()));
    let printer = tokio::spawn(async move {
        while let Some(view) = subscriber.next().await {
            println!("{}", format_view(started.elapsed(), &view));
        }
    });

    for step in steps {
        tokio::time::sleep(step.delay).await;
        tracing::debug!(action = ?step.action, "simulate: applying step");
        apply(&handle, step.action)?;
    }
    tokio::time::sleep(Duration::from_millis(args.settle)).await;

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;
    printer.abort();

    let value = serde_json::to_value(&snapshot)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_highlighted_json(&value);
    }
    Ok(())
}
