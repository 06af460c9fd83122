use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::Category;
use crate::fetch::DegradedReason;
use crate::time_ref::{is_truthy, parse_iso_date};

/// Earliest upcoming collection for the configured address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextCollection {
    pub date: NaiveDate,
    /// Distinct categories collected that day, in the order the service
    /// entries list them; later icons draw over earlier ones.
    pub categories: Vec<Category>,
}

// ── Schedule API JSON ───────────────────────────────────────────────

#[derive(Deserialize)]
struct ScheduleRoot {
    #[serde(default)]
    address: Value,
    /// Keyed by ISO date string; the BTreeMap keeps keys in lexical order,
    /// which is chronological for ISO-8601 dates. Entries stay untyped so
    /// only the earliest one has to be well-formed.
    #[serde(default)]
    servicedates: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct ServiceDate {
    date: Option<String>,
    #[serde(default)]
    services: Value,
}

// ── Parsing ─────────────────────────────────────────────────────────

pub fn parse_next_collection(json: &str) -> Result<NextCollection, DegradedReason> {
    let root: ScheduleRoot =
        serde_json::from_str(json).map_err(|e| DegradedReason::Malformed(e.to_string()))?;

    if !is_truthy(&root.address) {
        info!("Invalid address ID!");
        return Err(DegradedReason::InvalidAddress);
    }

    debug!("service dates: {:?}", root.servicedates.keys().collect::<Vec<_>>());
    let (key, entry) = root
        .servicedates
        .into_iter()
        .next()
        .ok_or(DegradedReason::NoServiceDates)?;
    let entry: ServiceDate =
        serde_json::from_value(entry).map_err(|e| DegradedReason::Malformed(e.to_string()))?;

    let raw_date = entry.date.as_deref().unwrap_or(&key);
    let date = parse_iso_date(raw_date).ok_or_else(|| DegradedReason::BadDate(raw_date.to_string()))?;

    Ok(NextCollection {
        date,
        categories: categories_in(&entry.services),
    })
}

/// Service entries arrive either as an object keyed by index (`"0"`, `"1"`,
/// ...) or as an array. Each entry is an object keyed by category identifier.
fn service_entries(services: &Value) -> Vec<&Value> {
    match services {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.cmp(b),
            });
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

/// Entries are visited in index order; within one entry categories follow
/// catalog order. A category already seen is not repeated.
fn categories_in(services: &Value) -> Vec<Category> {
    let mut found: Vec<Category> = Vec::new();
    for entry in service_entries(services) {
        let ids: Vec<&str> = match entry {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            Value::String(s) => vec![s.as_str()],
            _ => Vec::new(),
        };
        let mut in_entry: Vec<Category> = ids
            .into_iter()
            .filter_map(|id| {
                let category = Category::from_wire_id(id)?;
                debug!("service {} -> {}", id, category.name());
                Some(category)
            })
            .collect();
        in_entry.sort();
        for category in in_entry {
            if !found.contains(&category) {
                found.push(category);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lexically_smallest_key_wins() {
        let json = r#"{
            "address": "1 Example Road",
            "servicedates": {
                "2024-06-03": {"date": "2024-06-03", "services": {}},
                "2024-05-28": {"date": "2024-05-28", "services": {}},
                "2024-11-01": {"date": "2024-11-01", "services": {}}
            }
        }"#;
        let next = parse_next_collection(json).unwrap();
        assert_eq!(next.date, date(2024, 5, 28));
    }

    #[test]
    fn smallest_key_selects_its_own_date_field() {
        let json = r#"{
            "address": "x",
            "servicedates": {
                "b": {"date": "2024-01-09", "services": {}},
                "a": {"date": "2024-02-20T00:00:00", "services": {}}
            }
        }"#;
        assert_eq!(parse_next_collection(json).unwrap().date, date(2024, 2, 20));
    }

    #[test]
    fn falsy_address_is_rejected() {
        for address in [r#""""#, "null", "false", "0"] {
            let json = format!(
                r#"{{"address": {}, "servicedates": {{"2024-05-14": {{"date": "2024-05-14", "services": {{}}}}}}}}"#,
                address
            );
            assert_eq!(
                parse_next_collection(&json),
                Err(DegradedReason::InvalidAddress),
                "address {}",
                address
            );
        }
    }

    #[test]
    fn missing_address_field_is_rejected() {
        assert_eq!(
            parse_next_collection(r#"{"servicedates": {}}"#),
            Err(DegradedReason::InvalidAddress)
        );
    }

    #[test]
    fn empty_service_dates_degrade() {
        assert_eq!(
            parse_next_collection(r#"{"address": "x", "servicedates": {}}"#),
            Err(DegradedReason::NoServiceDates)
        );
    }

    #[test]
    fn unparseable_date_degrades() {
        let json = r#"{"address": "x", "servicedates": {"k": {"date": "soon", "services": {}}}}"#;
        assert_eq!(
            parse_next_collection(json),
            Err(DegradedReason::BadDate("soon".to_string()))
        );
    }

    #[test]
    fn not_json_is_malformed() {
        assert!(matches!(
            parse_next_collection("Service Unavailable"),
            Err(DegradedReason::Malformed(_))
        ));
    }

    #[test]
    fn services_keyed_by_index() {
        let json = r#"{
            "address": "x",
            "servicedates": {
                "2024-05-14": {
                    "date": "2024-05-14",
                    "services": {
                        "1": {"fGPdmGlQV2dflSsG": {"name": "Glass"}},
                        "0": {"kGWWDB87GxV4bj6C": {"name": "Food"}}
                    }
                }
            }
        }"#;
        let next = parse_next_collection(json).unwrap();
        assert_eq!(next.categories, vec![Category::Food, Category::Glass]);
    }

    #[test]
    fn services_as_array() {
        let json = r#"{
            "address": "x",
            "servicedates": {
                "2024-05-14": {
                    "date": "2024-05-14",
                    "services": [{"a7TGSliXHW6r4hml": {}}, {"unknown-id": {}}]
                }
            }
        }"#;
        let next = parse_next_collection(json).unwrap();
        assert_eq!(next.categories, vec![Category::Cardboard]);
    }

    #[test]
    fn malformed_later_entry_does_not_hide_the_earliest() {
        let json = r#"{
            "address": "x",
            "servicedates": {
                "2024-05-14": {"date": "2024-05-14", "services": {"0": {"6xrmSxaifN5h3LXb": {}}}},
                "2024-05-21": {"date": 20240521, "services": 7}
            }
        }"#;
        let next = parse_next_collection(json).unwrap();
        assert_eq!(next.date, date(2024, 5, 14));
        assert_eq!(next.categories, vec![Category::Waste]);
    }

    #[test]
    fn malformed_earliest_entry_degrades() {
        let json = r#"{"address": "x", "servicedates": {"2024-05-14": {"date": 20240514}}}"#;
        assert!(matches!(
            parse_next_collection(json),
            Err(DegradedReason::Malformed(_))
        ));
    }

    #[test]
    fn shared_slot_categories_keep_service_order() {
        let json = r#"{
            "address": "x",
            "servicedates": {
                "2024-05-14": {
                    "date": "2024-05-14",
                    "services": {
                        "0": {"a7TGSliXHW6r4hml": {}},
                        "1": {"FBWme5sNe7evoDY5": {}}
                    }
                }
            }
        }"#;
        let next = parse_next_collection(json).unwrap();
        assert_eq!(next.categories, vec![Category::Cardboard, Category::Plastic]);
    }

    #[test]
    fn both_waste_identifiers_collapse_to_one_category() {
        let json = r#"{
            "address": "x",
            "servicedates": {
                "2024-05-14": {
                    "date": "2024-05-14",
                    "services": {
                        "0": {"6xrmSxaifN5h3LXb": {}, "xjVCX1y84wps6gTw": {}},
                        "1": {"xjVCX1y84wps6gTw": {}}
                    }
                }
            }
        }"#;
        let next = parse_next_collection(json).unwrap();
        assert_eq!(next.categories, vec![Category::Waste]);
    }
}
