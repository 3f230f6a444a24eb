// ── Reconcile outcome ──
//
// What a reconciler reports back: whether anything changed, one
// human-readable line per action, and the structural changes it applied
// tagged with the scope they belong to.

use serde::Serialize;

use crate::tree::Diff;

/// Result of one reconcile run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    /// `true` iff at least one change record exists.
    pub changed: bool,
    pub messages: Vec<String>,
    pub changes: Vec<ChangeRecord>,
}

impl Outcome {
    pub(crate) fn message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub(crate) fn record(&mut self, record: ChangeRecord) {
        self.changes.push(record);
        self.changed = true;
    }
}

/// Either a structural diff or a plain note ("Group created").
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Changes {
    Diff(Diff),
    Note(String),
}

/// One applied change and the scope it was applied in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub changes: Changes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl ChangeRecord {
    pub(crate) fn diff(diff: Diff) -> Self {
        Self::new(Changes::Diff(diff))
    }

    pub(crate) fn note(note: impl Into<String>) -> Self {
        Self::new(Changes::Note(note.into()))
    }

    fn new(changes: Changes) -> Self {
        Self {
            changes,
            site_name: None,
            site_id: None,
            group_id: None,
            group_name: None,
        }
    }

    pub(crate) fn site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = Some(name.into());
        self
    }

    pub(crate) fn site_id(mut self, id: impl Into<String>) -> Self {
        self.site_id = Some(id.into());
        self
    }

    pub(crate) fn group_id(mut self, id: impl Into<String>) -> Self {
        self.group_id = Some(id.into());
        self
    }

    pub(crate) fn group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    /// Where the change applies, for display.
    pub fn scope_label(&self) -> String {
        match (&self.group_name, &self.group_id, &self.site_name, &self.site_id) {
            (Some(name), _, _, _) => format!("group {name}"),
            (None, Some(id), _, _) => format!("group {id}"),
            (None, None, Some(name), _) => format!("site {name}"),
            (None, None, None, Some(id)) => format!("site {id}"),
            (None, None, None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::tree::{ExcludePaths, diff};

    #[test]
    fn recording_marks_changed() {
        let mut outcome = Outcome::default();
        outcome.message("Group Lab updated");
        assert!(!outcome.changed);
        outcome.record(ChangeRecord::note("Group created").group_name("Lab"));
        assert!(outcome.changed);
    }

    #[test]
    fn record_serializes_camel_case_scope_keys() {
        let d = diff(&json!({"a": 1}), &json!({"a": 2}), &ExcludePaths::none());
        let record = ChangeRecord::diff(d).group_id("42");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "changes": [{"kind": "changed", "path": "a", "old": 1, "new": 2}],
                "groupId": "42"
            })
        );
        let note = ChangeRecord::note("Site is missing. Adding site Lab");
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({"changes": "Site is missing. Adding site Lab"})
        );
    }
}
