// Upgrade policies: agent upgrade maintenance windows and download
// concurrency per site or group (`tasks-configuration`).

use chrono::NaiveTime;
use serde_json::{Map, Value, json};
use tracing::info;

use s1ctl_api::ConsoleClient;

use super::require_data;
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope::Resolved;
use crate::tree::{ExcludePaths, diff};

/// GMT offsets the console accepts for maintenance windows.
pub const TIMEZONES: [&str; 37] = [
    "-11:00", "-10:00", "-09:30", "-09:00", "-08:00", "-07:00", "-06:00", "-05:00", "-04:00",
    "-03:30", "-03:00", "-02:00", "-01:00", "+00:00", "+01:00", "+02:00", "+03:00", "+03:30",
    "+04:00", "+04:30", "+05:00", "+05:30", "+05:45", "+06:00", "+06:30", "+07:00", "+08:00",
    "+08:45", "+09:00", "+09:30", "+10:00", "+10:30", "+11:00", "+12:00", "+13:00", "+13:45",
    "+14:00",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Bookkeeping the console returns but does not accept on update.
const READ_ONLY_KEYS: [&str; 6] = [
    "concurrencyConfigUpdatedAt",
    "concurrencyConfigUpdatedBy",
    "maintenanceConfigUpdatedAt",
    "maintenanceConfigUpdatedBy",
    "parentMaxConcurrent",
    "taskType",
];

const TIME_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Clone, PartialEq)]
pub struct UpgradePolicyParams {
    pub site_name: String,
    pub groups: Vec<String>,
    pub inherit_maintenance_windows: bool,
    pub inherit_max_concurrent_downloads: bool,
    /// Day name → list of `{"from": "hh:mm AM", "to": "hh:mm PM"}`; an
    /// empty list or null means the whole day.
    pub maintenance_windows: Option<Value>,
    pub max_concurrent_downloads: Option<u64>,
    /// GMT offset, e.g. `+01:00`.
    pub timezone: String,
}

impl UpgradePolicyParams {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            groups: Vec::new(),
            inherit_maintenance_windows: false,
            inherit_max_concurrent_downloads: false,
            maintenance_windows: None,
            max_concurrent_downloads: None,
            timezone: "+00:00".to_owned(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.inherit_maintenance_windows && self.maintenance_windows.is_none() {
            return Err(CoreError::validation(
                "Error: 'maintenance_windows' is required unless inherit_maintenance_windows is set",
            ));
        }
        if !self.inherit_max_concurrent_downloads && self.max_concurrent_downloads.is_none() {
            return Err(CoreError::validation(
                "Error: 'max_concurrent_downloads' is required unless \
                 inherit_max_concurrent_downloads is set",
            ));
        }
        if !TIMEZONES.contains(&self.timezone.as_str()) {
            return Err(CoreError::validation(format!(
                "Timezone is invalid. Please choose one of the following values: {}",
                TIMEZONES.join(", ")
            )));
        }
        if !self.inherit_maintenance_windows {
            if let Some(windows) = &self.maintenance_windows {
                validate_windows(windows)?;
            }
        }
        Ok(())
    }

    /// Changes hidden from the comparison because the parent scope owns
    /// them.
    fn exclude_paths(&self) -> ExcludePaths {
        let mut exclude = ExcludePaths::none();
        if self.inherit_maintenance_windows {
            exclude.insert("data.maintenanceWindowsByDay");
        }
        if self.inherit_max_concurrent_downloads {
            exclude.insert("data.maxConcurrent");
        }
        exclude
    }

    /// Concurrency to send: the parent's value when inheriting, else the
    /// requested one, which must not exceed the parent's.
    fn max_concurrent(&self, parent: u64) -> Result<u64, CoreError> {
        match self.max_concurrent_downloads {
            Some(wanted) if !self.inherit_max_concurrent_downloads => {
                if wanted > parent {
                    return Err(CoreError::validation(format!(
                        "max_concurrent_downloads is higher than the upper scopes Maximum Concurrent \
                         Downloads value. Please use a value lower than or equal to {parent}"
                    )));
                }
                Ok(wanted)
            }
            _ => Ok(parent),
        }
    }

    /// `data` of the upgrade policy as the console should hold it.
    fn desired_data(&self, max_concurrent: u64) -> Value {
        let windows = if self.inherit_maintenance_windows {
            Map::new()
        } else {
            self.maintenance_windows
                .as_ref()
                .map(windows_by_day)
                .unwrap_or_default()
        };

        json!({
            "inheritParentConcurrencyConfig": self.inherit_max_concurrent_downloads,
            "inheritParentMaintenanceConfig": self.inherit_maintenance_windows,
            "timezoneGmt": format!("GMT{}", self.timezone),
            "maxConcurrent": max_concurrent,
            "maintenanceWindowsByDay": windows,
        })
    }
}

fn validate_windows(windows: &Value) -> Result<(), CoreError> {
    let Value::Object(days) = windows else {
        return Err(CoreError::validation(
            "Error: 'maintenance_windows' has to be a mapping of day names to time windows",
        ));
    };

    for (day, entries) in days {
        let Value::Array(entries) = entries else {
            continue;
        };
        let invalid = |reason: String| {
            CoreError::validation(format!(
                "Please check the entered maintenance window time values for {day}. {reason}"
            ))
        };

        for entry in entries {
            let Value::Object(window) = entry else {
                return Err(invalid(
                    "Maintenance window is no dict object. Expecting dict with 'from:' and 'to'"
                        .to_owned(),
                ));
            };
            let from = window.get("from").and_then(Value::as_str).unwrap_or_default();
            let to = window.get("to").and_then(Value::as_str).unwrap_or_default();
            if from.is_empty() || to.is_empty() {
                return Err(invalid(
                    "Expecting dict with 'from:' and 'to'. At least one is missing".to_owned(),
                ));
            }

            let parse = |value: &str| {
                NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|e| {
                    invalid(format!(
                        "The entered time value is not valid. Exception is: {e}"
                    ))
                })
            };
            if parse(from)? >= parse(to)? {
                return Err(invalid(format!(
                    "The 'from' value needs to be smaller than the 'to' value. \
                     Your values: 'from': {from}, 'to': {to}"
                )));
            }
        }
    }
    Ok(())
}

/// Day map in console shape. Day names are matched case-insensitively;
/// days not mentioned are left out.
fn windows_by_day(windows: &Value) -> Map<String, Value> {
    let mut by_day = Map::new();
    let Value::Object(input) = windows else {
        return by_day;
    };

    for day in WEEKDAYS {
        let entry = input
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(day))
            .map(|(_, value)| value);

        let config = match entry {
            Some(Value::Array(ranges)) if !ranges.is_empty() => {
                let hours: Vec<Value> = ranges
                    .iter()
                    .map(|range| {
                        json!({
                            "fromTime": strip_leading_zeros(range.get("from")),
                            "toTime": strip_leading_zeros(range.get("to")),
                        })
                    })
                    .collect();
                json!({"isMaintenanceAllDay": false, "maintenanceHours": hours})
            }
            Some(Value::Array(_) | Value::Null) => {
                json!({"isMaintenanceAllDay": true, "maintenanceHours": []})
            }
            _ => continue,
        };
        by_day.insert(day.to_owned(), config);
    }
    by_day
}

fn strip_leading_zeros(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim_start_matches('0')
        .to_owned()
}

/// Current `data` without the read-only bookkeeping keys.
fn cleaned(mut data: Value) -> Value {
    if let Value::Object(ref mut map) = data {
        for key in READ_ONLY_KEYS {
            map.remove(key);
        }
    }
    data
}

pub(crate) async fn apply(
    client: &ConsoleClient,
    params: &UpgradePolicyParams,
) -> Result<Outcome, CoreError> {
    params.validate()?;
    let resolved = Resolved::load(client, &params.site_name, &params.groups).await?;
    let exclude = params.exclude_paths();
    let mut outcome = Outcome::default();

    for target in resolved.targets() {
        let current = client.get_upgrade_policy(&target.scope).await?.data;
        let parent = current
            .get("parentMaxConcurrent")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                CoreError::unexpected(format!(
                    "Upgrade policy for {} has no parentMaxConcurrent value",
                    target.label()
                ))
            })?;
        let desired = params.desired_data(params.max_concurrent(parent)?);

        let changes = diff(
            &json!({ "data": cleaned(current) }),
            &json!({ "data": desired }),
            &exclude,
        );
        if changes.is_empty() {
            continue;
        }

        info!(scope = %target.label(), changes = changes.len(), "updating upgrade policy");
        let response = client.update_upgrade_policy(&target.scope, desired).await?;
        require_data(&response.data, "update_upgrade_policy")?;
        outcome.message(format!("Updating upgrade policy for {}", target.label()));
        outcome.record(target.tag(ChangeRecord::diff(changes)));
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn params() -> UpgradePolicyParams {
        let mut params = UpgradePolicyParams::new("Lab");
        params.maintenance_windows = Some(json!({
            "monday": [{"from": "09:00 AM", "to": "11:30 PM"}],
            "Saturday": [],
            "sunday": null
        }));
        params.max_concurrent_downloads = Some(10);
        params
    }

    #[test]
    fn valid_parameters_pass() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn five_hour_offset_is_accepted() {
        let mut p = params();
        p.timezone = "+05:00".into();
        assert!(p.validate().is_ok());
        p.timezone = "05:00".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn window_must_start_before_it_ends() {
        let mut p = params();
        p.maintenance_windows = Some(json!({"friday": [{"from": "10:00 PM", "to": "09:00 AM"}]}));
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("for friday"), "{err}");
        assert!(err.contains("needs to be smaller"), "{err}");
    }

    #[test]
    fn malformed_windows_are_rejected() {
        let mut p = params();
        p.maintenance_windows = Some(json!({"monday": ["9-5"]}));
        assert!(p.validate().unwrap_err().to_string().contains("no dict object"));

        p.maintenance_windows = Some(json!({"monday": [{"from": "9:00 AM"}]}));
        assert!(p.validate().unwrap_err().to_string().contains("At least one is missing"));

        p.maintenance_windows = Some(json!({"monday": [{"from": "25:00 AM", "to": "1:00 PM"}]}));
        assert!(p.validate().unwrap_err().to_string().contains("not valid"));
    }

    #[test]
    fn windows_are_required_unless_inherited() {
        let mut p = params();
        p.maintenance_windows = None;
        assert!(p.validate().is_err());
        p.inherit_maintenance_windows = true;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn concurrency_is_capped_by_parent() {
        let p = params();
        assert_eq!(p.max_concurrent(20).unwrap(), 10);
        let err = p.max_concurrent(5).unwrap_err();
        assert!(err.to_string().ends_with("lower than or equal to 5"));

        let mut inherit = params();
        inherit.inherit_max_concurrent_downloads = true;
        assert_eq!(inherit.max_concurrent(5).unwrap(), 5);
    }

    #[test]
    fn desired_data_shapes_days() {
        let data = params().desired_data(10);
        assert_eq!(
            data,
            json!({
                "inheritParentConcurrencyConfig": false,
                "inheritParentMaintenanceConfig": false,
                "timezoneGmt": "GMT+00:00",
                "maxConcurrent": 10,
                "maintenanceWindowsByDay": {
                    "Monday": {
                        "isMaintenanceAllDay": false,
                        "maintenanceHours": [{"fromTime": "9:00 AM", "toTime": "11:30 PM"}]
                    },
                    "Saturday": {"isMaintenanceAllDay": true, "maintenanceHours": []},
                    "Sunday": {"isMaintenanceAllDay": true, "maintenanceHours": []}
                }
            })
        );
    }

    #[test]
    fn inherited_fields_are_excluded_from_comparison() {
        let mut p = params();
        p.inherit_maintenance_windows = true;
        p.inherit_max_concurrent_downloads = true;
        let exclude = p.exclude_paths();
        assert!(exclude.matches("data.maintenanceWindowsByDay.Monday"));
        assert!(exclude.matches("data.maxConcurrent"));
        assert!(!exclude.matches("data.timezoneGmt"));
    }

    #[test]
    fn bookkeeping_keys_are_stripped() {
        let current = json!({"taskType": "agents_upgrade", "parentMaxConcurrent": 50, "maxConcurrent": 10});
        assert_eq!(cleaned(current), json!({"maxConcurrent": 10}));
    }
}
