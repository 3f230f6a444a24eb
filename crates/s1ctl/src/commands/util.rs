//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use s1ctl_core::Outcome;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin the prompt cannot be answered; that is an
/// error rather than a silent "no".
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(std::io::Error::other)?;
    Ok(confirmed)
}

/// Parse a JSON flag value: inline JSON, or `@path` to read a file.
pub fn parse_json_arg(field: &str, raw: &str) -> Result<Value, CliError> {
    let contents = match raw.strip_prefix('@') {
        Some(path) => read_file(Path::new(path))?,
        None => raw.to_owned(),
    };
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Optional variant of [`parse_json_arg`].
pub fn parse_json_opt(field: &str, raw: Option<&str>) -> Result<Option<Value>, CliError> {
    raw.map(|raw| parse_json_arg(field, raw)).transpose()
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: path.display().to_string(),
        reason: format!("cannot read file: {e}"),
    })
}

/// Render and print a reconcile outcome.
pub fn print_outcome(outcome: &Outcome, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_outcome(&global.output, outcome, color);
    output::print_output(&out, global.quiet);
}
