//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use s1ctl_core::{Change, Changes, Outcome};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_change(change: &Change, color: bool) -> String {
    let line = change.to_string();
    if !color {
        return line;
    }
    match change {
        Change::Added { .. } => line.green().to_string(),
        Change::Removed { .. } => line.red().to_string(),
        Change::Changed { .. } => line.yellow().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Render a reconcile outcome: messages, then each change record under
/// its scope. Plain prints `changed` / `unchanged` only.
pub fn render_outcome(format: &OutputFormat, outcome: &Outcome, color: bool) -> String {
    render_single(
        format,
        outcome,
        |o| outcome_detail(o, color),
        |o| if o.changed { "changed" } else { "unchanged" }.to_owned(),
    )
}

fn outcome_detail(outcome: &Outcome, color: bool) -> String {
    let mut out = String::new();
    let status = if outcome.changed { "changed" } else { "unchanged" };
    if color && outcome.changed {
        let _ = writeln!(out, "{}", status.yellow().bold());
    } else {
        let _ = writeln!(out, "{status}");
    }

    for message in &outcome.messages {
        let _ = writeln!(out, "  {message}");
    }

    for record in &outcome.changes {
        let _ = writeln!(out);
        let scope = record.scope_label();
        match &record.changes {
            Changes::Note(note) if scope.is_empty() => {
                let _ = writeln!(out, "{note}");
            }
            Changes::Note(note) => {
                let _ = writeln!(out, "{scope}: {note}");
            }
            Changes::Diff(diff) => {
                if !scope.is_empty() {
                    let _ = writeln!(out, "{scope}:");
                }
                for change in diff {
                    let _ = writeln!(out, "  {}", paint_change(change, color));
                }
            }
        }
    }

    out.trim_end().to_owned()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}
