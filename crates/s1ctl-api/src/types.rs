// Wire types for the console's v2.1 REST API.
//
// Objects the reconcilers compare structurally keep their full JSON body in
// an `attributes` map next to the lifted identifying fields, so nothing the
// console returns is lost on the way to a diff.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Envelope ─────────────────────────────────────────────────────────

/// Standard console response: `{"data": ..., "pagination": {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Envelope<T> {
    /// `pagination.totalItems`, or 0 when the console sent no pagination.
    pub fn total_items(&self) -> u64 {
        self.pagination.as_ref().map_or(0, |p| p.total_items)
    }

    /// Cursor for the next page, if any.
    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.next_cursor.as_deref())
            .filter(|c| !c.is_empty())
    }
}

impl<T> Envelope<Vec<T>> {
    /// First element when the console reports exactly one match.
    pub fn into_single(self) -> Option<T> {
        if self.total_items() == 1 {
            self.data.into_iter().next()
        } else {
            None
        }
    }
}

/// `{"data": {"success": true}}` answer of delete / revert calls.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Success {
    #[serde(default)]
    pub success: bool,
}

/// `{"data": {"affected": n}}` answer of bulk mutations.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Affected {
    #[serde(default)]
    pub affected: u64,
}

// ── Scope ────────────────────────────────────────────────────────────

/// Attachment point of a settings object: a site or a group, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRef {
    Site(String),
    Group(String),
}

impl ScopeRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Site(id) | Self::Group(id) => id,
        }
    }

    /// Collection path segment (`sites` / `groups`).
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Site(_) => "sites",
            Self::Group(_) => "groups",
        }
    }

    /// Query / filter key selecting this scope (`siteIds` / `groupIds`).
    pub fn ids_key(&self) -> &'static str {
        match self {
            Self::Site(_) => "siteIds",
            Self::Group(_) => "groupIds",
        }
    }
}

// ── Accounts ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unlimited_expiration: bool,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub licenses: Licenses,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Licenses {
    #[serde(default)]
    pub bundles: Vec<LicenseBundle>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseBundle {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Account {
    /// Names of the license bundles the account can hand out to sites.
    pub fn bundle_names(&self) -> Vec<&str> {
        self.licenses.bundles.iter().map(|b| b.name.as_str()).collect()
    }
}

// ── Sites ────────────────────────────────────────────────────────────

/// `data` payload of `GET sites`: the matching sites plus account totals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteList {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_sites: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Site {
    /// Full object as returned by the console.
    pub fn to_json(&self) -> Value {
        with_fields(
            &self.attributes,
            [("id", self.id.as_str()), ("name", self.name.as_str())],
        )
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GroupKind {
    Static,
    Dynamic,
    Pinned,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Group {
    pub fn to_json(&self) -> Value {
        let kind = self.kind.to_string();
        with_fields(
            &self.attributes,
            [
                ("id", self.id.as_str()),
                ("name", self.name.as_str()),
                ("type", kind.as_str()),
            ],
        )
    }
}

// ── Filters ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub filter_fields: Value,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

// ── Exclusions ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Exclusion {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Exclusion {
    pub fn to_json(&self) -> Value {
        with_fields(&self.attributes, [("id", self.id.as_str())])
    }

    /// IDs listed under `scope.<key>` (e.g. `groupIds`).
    pub fn scope_ids(&self, key: &str) -> Vec<String> {
        self.attributes
            .get("scope")
            .and_then(|scope| scope.get(key))
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| match id {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ── Config overrides ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigOverride {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ConfigOverride {
    pub fn to_json(&self) -> Value {
        with_fields(&self.attributes, [("id", self.id.as_str())])
    }

    pub fn name(&self) -> &str {
        self.attributes
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

// ── Agent packages ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPackage {
    pub id: String,
    pub file_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub platform_type: Option<String>,
    #[serde(default)]
    pub os_arch: Option<String>,
    #[serde(default)]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

// ── Helpers ──────────────────────────────────────────────────────────

fn with_fields<'a>(
    attributes: &Map<String, Value>,
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Value {
    let mut object = attributes.clone();
    for (key, value) in fields {
        object.insert(key.to_owned(), Value::String(value.to_owned()));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn site_round_trips_unknown_fields() {
        let raw = json!({
            "id": "225494730938493804",
            "name": "Lab",
            "siteType": "Paid",
            "licenses": {"bundles": [{"name": "core"}]}
        });
        let site: Site = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(site.attribute_str("siteType"), Some("Paid"));
        assert_eq!(site.to_json(), raw);
    }

    #[test]
    fn single_requires_exactly_one_total() {
        let env: Envelope<Vec<Value>> = serde_json::from_value(json!({
            "data": [{"id": "1"}, {"id": "2"}],
            "pagination": {"totalItems": 2, "nextCursor": null}
        }))
        .unwrap();
        assert!(env.into_single().is_none());
    }

    #[test]
    fn unknown_group_kind_is_tolerated() {
        let group: Group = serde_json::from_value(json!({
            "id": "9", "name": "Pins", "type": "something-new"
        }))
        .unwrap();
        assert_eq!(group.kind, GroupKind::Unknown);
    }

    #[test]
    fn exclusion_scope_ids_accept_numbers() {
        let exclusion: Exclusion = serde_json::from_value(json!({
            "id": "1",
            "scope": {"groupIds": ["11", 12]}
        }))
        .unwrap();
        assert_eq!(exclusion.scope_ids("groupIds"), vec!["11", "12"]);
        assert!(exclusion.scope_ids("siteIds").is_empty());
    }
}
