use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::io::evstats_client::DailyDocument;

/// Model name -> registrations, for a single day.
pub type ModelCountMap = BTreeMap<String, u64>;

type Strategy = fn(&DailyDocument) -> Option<&Map<String, Value>>;

/// Tried in order, the first that finds a models object wins.
/// The api moved from `v1` to `v2` at some point; old days still answer with `v1`.
static STRATEGIES: &[Strategy] = &[models_v2, models_v1];

/// Pulls the per-model counts out of a daily document.
///
/// Never fails. A missing document, or one with neither schema, gives an empty map.
pub fn extract_model_counts(document: Option<&DailyDocument>) -> ModelCountMap {
    let Some(document) = document else {
        return ModelCountMap::new();
    };

    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(document))
        .map(into_counts)
        .unwrap_or_default()
}

// private

fn models_v2(document: &DailyDocument) -> Option<&Map<String, Value>> {
    models_under(document, "v2")
}

fn models_v1(document: &DailyDocument) -> Option<&Map<String, Value>> {
    models_under(document, "v1")
}

/// `<tag> -> cars -> models`, and it has to be an object.
fn models_under<'a>(document: &'a DailyDocument, tag: &str) -> Option<&'a Map<String, Value>> {
    document.get(tag)?.get("cars")?.get("models")?.as_object()
}

fn into_counts(models: &Map<String, Value>) -> ModelCountMap {
    models
        .iter()
        .filter_map(|(model, value)| match as_count(value) {
            Some(count) => Some((model.to_owned(), count)),
            None => {
                debug!(model = model.as_str(), %value, "skipping a count that isn't a whole number");
                None
            }
        })
        .collect()
}

/// Counts come as integers, but the odd float or numeric string has been seen.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && *float >= 0.0)
                .map(|float| float as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> DailyDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents are objects"),
        }
    }

    #[test]
    fn reads_the_v2_schema() {
        let doc = document(json!({ "v2": { "cars": { "models": { "ModelA": 3, "ModelB": 1 } } } }));

        let counts = extract_model_counts(Some(&doc));

        assert_eq!(
            counts,
            ModelCountMap::from([("ModelA".to_owned(), 3), ("ModelB".to_owned(), 1)])
        );
    }

    #[test]
    fn falls_back_to_v1() {
        let doc = document(json!({ "v1": { "cars": { "models": { "Old": 7 } } } }));

        assert_eq!(
            extract_model_counts(Some(&doc)),
            ModelCountMap::from([("Old".to_owned(), 7)])
        );
    }

    #[test]
    fn v2_wins_when_both_are_present() {
        let doc = document(json!({
            "v1": { "cars": { "models": { "Old": 7 } } },
            "v2": { "cars": { "models": { "New": 2 } } }
        }));

        assert_eq!(
            extract_model_counts(Some(&doc)),
            ModelCountMap::from([("New".to_owned(), 2)])
        );
    }

    #[test]
    fn a_broken_v2_does_not_hide_v1() {
        let doc = document(json!({
            "v2": { "cars": { "models": [1, 2, 3] } },
            "v1": { "cars": { "models": { "Old": 7 } } }
        }));

        assert_eq!(
            extract_model_counts(Some(&doc)),
            ModelCountMap::from([("Old".to_owned(), 7)])
        );
    }

    #[test]
    fn malformed_documents_give_nothing() {
        let shapes = [
            json!({}),
            json!({ "v3": { "cars": { "models": { "A": 1 } } } }),
            json!({ "v2": "cars" }),
            json!({ "v2": { "cars": null } }),
            json!({ "v1": { "trucks": { "models": { "A": 1 } } } }),
        ];

        for shape in shapes {
            assert!(extract_model_counts(Some(&document(shape))).is_empty());
        }
        assert!(extract_model_counts(None).is_empty());
    }

    #[test]
    fn odd_counts_are_coerced_or_skipped() {
        let doc = document(json!({ "v2": { "cars": { "models": {
            "Float": 4.0,
            "Text": "5",
            "Negative": -1,
            "Junk": "lots",
            "Null": null
        } } } }));

        assert_eq!(
            extract_model_counts(Some(&doc)),
            ModelCountMap::from([("Float".to_owned(), 4), ("Text".to_owned(), 5)])
        );
    }
}
