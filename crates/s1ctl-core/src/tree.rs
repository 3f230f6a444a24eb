// ── Structural merge / diff / subtract over JSON values ──
//
// Every reconciler decides idempotence the same way: overlay the desired
// settings onto the current object, then diff the current object against
// the overlay. An empty diff means nothing to do.
//
// Paths are rendered dotted (`licenses.bundles[0].name`); object keys that
// would be ambiguous in that notation are quoted (`config["a.b"]`).

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

// ── Merge ────────────────────────────────────────────────────────────

/// Recursively overlay `desired` onto `current`.
///
/// Keys only in `current` are kept. Keys holding an object on both sides
/// are merged recursively; any other value from `desired` replaces the
/// current one (arrays included). If either side is not an object the
/// result is `desired`.
pub fn merge(current: &Value, desired: &Value) -> Value {
    let mut merged = current.clone();
    merge_into(&mut merged, desired);
    merged
}

fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_into(existing, value);
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

/// Merge `desired` onto `current` and report what the overlay changed.
///
/// Returns the diff from `current` to the merged value, together with the
/// merged value itself.
pub fn merge_compare(current: &Value, desired: &Value, exclude: &ExcludePaths) -> (Diff, Value) {
    let merged = merge(current, desired);
    let diff = diff(current, &merged, exclude);
    (diff, merged)
}

// ── Subtract ─────────────────────────────────────────────────────────

/// Remove from `current` every key path that also appears in `remove`.
///
/// For each key of `remove` whose value in `current` exists and is not
/// null:
/// - both are objects: recurse, then drop the key if nothing is left;
/// - `current` holds an object, `remove` does not: drop the key;
/// - neither is an object: drop the key;
/// - `current` holds a scalar, `remove` an object: keep it.
pub fn subtract(current: &Value, remove: &Value) -> Value {
    let mut result = current.clone();
    if let (Value::Object(target), Value::Object(remove)) = (&mut result, remove) {
        subtract_map(target, remove);
    }
    result
}

fn subtract_map(target: &mut Map<String, Value>, remove: &Map<String, Value>) {
    for (key, removal) in remove {
        let Some(existing) = target.get_mut(key) else {
            continue;
        };
        if existing.is_null() {
            continue;
        }

        let drop_key = match (existing, removal) {
            (Value::Object(inner), Value::Object(inner_remove)) => {
                subtract_map(inner, inner_remove);
                inner.is_empty()
            }
            (_, Value::Object(_)) => false,
            _ => true,
        };
        if drop_key {
            target.remove(key);
        }
    }
}

// ── Exclusions ───────────────────────────────────────────────────────

/// Paths ignored by [`diff`]. A change is dropped when its path equals an
/// excluded path or lies beneath one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludePaths(BTreeSet<String>);

impl ExcludePaths {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    pub fn insert(&mut self, path: impl Into<String>) {
        self.0.insert(path.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|excluded| {
            path == excluded
                || path
                    .strip_prefix(excluded.as_str())
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }
}

// ── Diff ─────────────────────────────────────────────────────────────

/// One structural difference between two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Added { path: String, value: Value },
    Removed { path: String, value: Value },
    Changed { path: String, old: Value, new: Value },
}

impl Change {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Changed { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { path, value } => write!(f, "+ {path}: {value}"),
            Self::Removed { path, value } => write!(f, "- {path}: {value}"),
            Self::Changed { path, old, new } => write!(f, "~ {path}: {old} -> {new}"),
        }
    }
}

/// Ordered list of changes. Empty means the two values are equal outside
/// the excluded paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diff(Vec<Change>);

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    pub fn changes(&self) -> &[Change] {
        &self.0
    }

    fn push(&mut self, change: Change, exclude: &ExcludePaths) {
        if !exclude.matches(change.path()) {
            self.0.push(change);
        }
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, change) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{change}")?;
        }
        Ok(())
    }
}

/// Structural diff from `old` to `new`.
///
/// Objects are compared key by key, arrays index by index; anything else
/// (including a type change) is a single `Changed` entry.
pub fn diff(old: &Value, new: &Value, exclude: &ExcludePaths) -> Diff {
    let mut out = Diff::default();
    walk(old, new, String::new(), exclude, &mut out);
    out
}

fn walk(old: &Value, new: &Value, path: String, exclude: &ExcludePaths, out: &mut Diff) {
    if !path.is_empty() && exclude.matches(&path) {
        return;
    }

    match (old, new) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                let child = key_path(&path, key);
                match new.get(key) {
                    Some(new_value) => walk(old_value, new_value, child, exclude, out),
                    None => out.push(
                        Change::Removed {
                            path: child,
                            value: old_value.clone(),
                        },
                        exclude,
                    ),
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    out.push(
                        Change::Added {
                            path: key_path(&path, key),
                            value: new_value.clone(),
                        },
                        exclude,
                    );
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            for (i, old_value) in old.iter().enumerate() {
                let child = format!("{path}[{i}]");
                match new.get(i) {
                    Some(new_value) => walk(old_value, new_value, child, exclude, out),
                    None => out.push(
                        Change::Removed {
                            path: child,
                            value: old_value.clone(),
                        },
                        exclude,
                    ),
                }
            }
            for (i, new_value) in new.iter().enumerate().skip(old.len()) {
                out.push(
                    Change::Added {
                        path: format!("{path}[{i}]"),
                        value: new_value.clone(),
                    },
                    exclude,
                );
            }
        }
        (old, new) if old != new => out.push(
            Change::Changed {
                path,
                old: old.clone(),
                new: new.clone(),
            },
            exclude,
        ),
        _ => {}
    }
}

fn key_path(parent: &str, key: &str) -> String {
    let plain = !key.is_empty() && !key.contains(['.', '[', ']', '"']);
    match (parent.is_empty(), plain) {
        (true, true) => key.to_owned(),
        (false, true) => format!("{parent}.{key}"),
        (_, false) => format!("{parent}[{}]", Value::String(key.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_extends_nested_objects() {
        let current = json!({"a": 1, "b": {"c": 2}});
        let desired = json!({"b": {"d": 3}});
        assert_eq!(merge(&current, &desired), json!({"a": 1, "b": {"c": 2, "d": 3}}));
    }

    #[test]
    fn merge_replaces_arrays_and_scalars() {
        let current = json!({"list": [1, 2, 3], "flag": true, "obj": {"x": 1}});
        let desired = json!({"list": [9], "flag": {"nested": 1}, "obj": 5});
        assert_eq!(
            merge(&current, &desired),
            json!({"list": [9], "flag": {"nested": 1}, "obj": 5})
        );
    }

    #[test]
    fn merge_does_not_touch_inputs() {
        let current = json!({"a": {"b": 1}});
        let desired = json!({"a": {"c": 2}});
        let _ = merge(&current, &desired);
        assert_eq!(current, json!({"a": {"b": 1}}));
        assert_eq!(desired, json!({"a": {"c": 2}}));
    }

    #[test]
    fn merge_is_idempotent() {
        let current = json!({"a": 1, "b": {"c": [1, 2], "d": {"e": null}}});
        let desired = json!({"b": {"c": [3], "d": {"f": "x"}}, "g": false});
        let once = merge(&current, &desired);
        assert_eq!(merge(&once, &desired), once);
    }

    #[test]
    fn merge_compare_reports_addition() {
        let current = json!({"a": 1, "b": {"c": 2}});
        let desired = json!({"b": {"d": 3}});
        let (diff, merged) = merge_compare(&current, &desired, &ExcludePaths::none());
        assert_eq!(merged, json!({"a": 1, "b": {"c": 2, "d": 3}}));
        assert_eq!(
            diff.changes(),
            &[Change::Added {
                path: "b.d".into(),
                value: json!(3)
            }]
        );
    }

    #[test]
    fn merge_compare_is_empty_when_desired_already_applied() {
        let current = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let desired = json!({"b": {"d": 3}});
        let (diff, _) = merge_compare(&current, &desired, &ExcludePaths::none());
        assert!(diff.is_empty());
    }

    #[test]
    fn diff_of_identical_values_is_empty() {
        let value = json!({"a": [1, {"b": 2}], "c": "x"});
        assert!(diff(&value, &value, &ExcludePaths::none()).is_empty());
    }

    #[test]
    fn diff_addresses_array_elements() {
        let old = json!({"licenses": {"bundles": [{"name": "core", "displayName": "Core"}]}});
        let new = json!({"licenses": {"bundles": [{"name": "control"}]}});
        let diff = diff(&old, &new, &ExcludePaths::none());
        assert_eq!(
            diff.changes(),
            &[
                Change::Removed {
                    path: "licenses.bundles[0].displayName".into(),
                    value: json!("Core")
                },
                Change::Changed {
                    path: "licenses.bundles[0].name".into(),
                    old: json!("core"),
                    new: json!("control")
                },
            ]
        );
    }

    #[test]
    fn diff_reports_array_growth_and_shrink() {
        let grown = diff(&json!([1]), &json!([1, 2]), &ExcludePaths::none());
        assert_eq!(
            grown.changes(),
            &[Change::Added {
                path: "[1]".into(),
                value: json!(2)
            }]
        );
        let shrunk = diff(&json!({"l": [1, 2]}), &json!({"l": [1]}), &ExcludePaths::none());
        assert_eq!(shrunk.changes()[0].path(), "l[1]");
    }

    #[test]
    fn diff_type_change_is_single_entry() {
        let diff = diff(&json!({"a": {"b": 1}}), &json!({"a": 1}), &ExcludePaths::none());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.changes()[0].path(), "a");
    }

    #[test]
    fn excluded_paths_and_their_children_are_ignored() {
        let old = json!({"inherits": false, "licenses": {"bundles": [{"displayName": "A", "name": "core"}]}});
        let new = json!({"inherits": true, "licenses": {"bundles": [{"name": "core"}]}});
        let exclude = ExcludePaths::new(["inherits", "licenses.bundles[0].displayName"]);
        assert!(diff(&old, &new, &exclude).is_empty());

        let exclude = ExcludePaths::new(["licenses"]);
        assert_eq!(diff(&old, &new, &exclude).len(), 1);
    }

    #[test]
    fn exclusion_does_not_match_sibling_prefix() {
        let exclude = ExcludePaths::new(["data.max"]);
        assert!(exclude.matches("data.max"));
        assert!(exclude.matches("data.max.inner"));
        assert!(!exclude.matches("data.maxConcurrent"));
    }

    #[test]
    fn dotted_keys_are_quoted() {
        let diff = diff(&json!({"cfg": {}}), &json!({"cfg": {"a.b": 1}}), &ExcludePaths::none());
        assert_eq!(diff.changes()[0].path(), r#"cfg["a.b"]"#);
    }

    #[test]
    fn change_serializes_with_kind_tag() {
        let change = Change::Changed {
            path: "a".into(),
            old: json!(1),
            new: json!(2),
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({"kind": "changed", "path": "a", "old": 1, "new": 2})
        );
    }

    #[test]
    fn subtract_removes_nested_and_empty_parents() {
        let current = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(subtract(&current, &json!({"b": {"c": 2}})), json!({"a": 1}));
    }

    #[test]
    fn subtract_self_is_empty() {
        let current = json!({"a": 1, "b": {"c": {"d": true}}, "e": [1]});
        assert_eq!(subtract(&current, &current), json!({}));
    }

    #[test]
    fn subtract_disjoint_is_noop() {
        let current = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(subtract(&current, &json!({"x": 1, "b": {"y": 2}})), current);
    }

    #[test]
    fn subtract_follows_mixed_type_rules() {
        let current = json!({
            "obj_vs_scalar": {"x": 1},
            "scalar_vs_obj": 5,
            "null_value": null,
            "keep": {"y": 1, "z": 2}
        });
        let remove = json!({
            "obj_vs_scalar": true,
            "scalar_vs_obj": {"any": 1},
            "null_value": 1,
            "keep": {"y": "ignored value"}
        });
        assert_eq!(
            subtract(&current, &remove),
            json!({"scalar_vs_obj": 5, "null_value": null, "keep": {"z": 2}})
        );
    }

    #[test]
    fn false_values_are_still_removed() {
        let current = json!({"flag": false, "other": 0});
        assert_eq!(subtract(&current, &json!({"flag": true})), json!({"other": 0}));
    }
}
