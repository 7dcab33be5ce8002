use itertools::Itertools;
use serde_json::Value;
use tracing::debug;

use crate::cli::TimeBucket;
use crate::config::makers::{DROPPED_COLUMNS, trailing_window};
use crate::io::evstats_client::{Fetch, Request};
use crate::prelude::*;

/// The response after its shape has been checked but before anything was coerced.
/// Every column is exactly as long as `periods`; gaps are `Value::Null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMakerTable {
    pub periods: Vec<String>,
    pub columns: Vec<(String, Vec<Value>)>,
}

/// Registrations per maker, one value per period, oldest period first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MakerMetricsTable {
    pub periods: Vec<String>,
    pub columns: Vec<MakerColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MakerColumn {
    pub maker: String,
    pub values: Vec<f64>,
}

impl MakerMetricsTable {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    #[cfg(test)]
    pub fn column(&self, maker: &str) -> Option<&MakerColumn> {
        self.columns.iter().find(|column| column.maker == maker)
    }

    /// Rows as (period, one value per column), newest period on top.
    pub fn rows_newest_first(&self) -> Vec<(&str, Vec<f64>)> {
        (0..self.periods.len())
            .map(|index| {
                let values = self
                    .columns
                    .iter()
                    .map(|column| column.values[index])
                    .collect();

                (self.periods[index].as_str(), values)
            })
            .sorted_by(|left, right| right.0.cmp(left.0))
            .collect()
    }
}

/// Fetches one bucket and turns whatever comes back into a table.
///
/// A selector the api doesn't know, a failed request or a response of the wrong
/// shape all give an empty table.
pub fn fetch_maker_metrics<F: Fetch + ?Sized>(
    source: &F,
    selector: &str,
    makers: &[String],
) -> MakerMetricsTable {
    let Some(bucket) = TimeBucket::parse(selector) else {
        debug!(selector, "unknown time bucket");
        return MakerMetricsTable::default();
    };

    let request = Request::MakerMetrics {
        bucket,
        makers: makers.to_vec(),
    };

    match source.fetch(&request) {
        Some(response) => normalize(bucket, &response, makers),
        None => MakerMetricsTable::default(),
    }
}

/// Checks, coerces, orders and trims a maker metrics response.
pub fn normalize(bucket: TimeBucket, response: &Value, makers: &[String]) -> MakerMetricsTable {
    let Some(raw) = validate(response, makers) else {
        return MakerMetricsTable::default();
    };

    let table = coerce(drop_disallowed(raw));

    truncate(into_ascending(table), trailing_window(bucket))
}

/// Reads `periods` and `data` and lines up one series per maker.
///
/// Returns `None` only when the response as a whole is unusable. Anything wrong with
/// a single maker's series is patched over with nulls.
pub fn validate(response: &Value, makers: &[String]) -> Option<RawMakerTable> {
    let body = response.as_object()?;

    let periods = match body.get("periods") {
        None => Vec::new(),
        Some(Value::Array(periods)) => periods.iter().map(period_label).collect(),
        Some(other) => {
            debug!(%other, "periods is not a list");
            return None;
        }
    };

    let empty = Value::Object(Default::default());
    let data = unwrap_nested(body.get("data").unwrap_or(&empty));

    let length = periods.len();
    let columns = match data {
        Value::Object(by_maker) => makers
            .iter()
            .map(|maker| {
                let series = aligned_series(by_maker.get(maker), length).unwrap_or_else(|| {
                    debug!(maker = maker.as_str(), "series missing or misaligned, using nulls");
                    vec![Value::Null; length]
                });

                (maker.to_owned(), series)
            })
            .collect(),

        // A list of per-period records, matched to periods by position.
        Value::Array(records) => makers
            .iter()
            .map(|maker| {
                let series = (0..length)
                    .map(|index| {
                        records
                            .get(index)
                            .and_then(|record| record.get(maker.as_str()))
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect();

                (maker.to_owned(), series)
            })
            .collect(),

        other => {
            debug!(%other, "data is neither an object nor a list");
            return None;
        }
    };

    Some(RawMakerTable { periods, columns })
}

// private

/// Some responses wrap the makers in one more `data` object.
fn unwrap_nested(data: &Value) -> &Value {
    match data.get("data") {
        Some(nested @ Value::Object(_)) => {
            debug!("unwrapping nested data");
            nested
        }
        _ => data,
    }
}

fn aligned_series(series: Option<&Value>, length: usize) -> Option<Vec<Value>> {
    match series? {
        Value::Array(values) if values.len() == length => Some(values.clone()),
        _ => None,
    }
}

fn period_label(period: &Value) -> String {
    match period {
        Value::String(label) => label.to_owned(),
        other => other.to_string(),
    }
}

fn drop_disallowed(mut raw: RawMakerTable) -> RawMakerTable {
    raw.columns.retain(|(maker, _)| {
        let keep = !DROPPED_COLUMNS.contains(&maker.as_str());
        if !keep {
            debug!(column = maker.as_str(), "dropping legacy column");
        }
        keep
    });

    raw
}

fn coerce(raw: RawMakerTable) -> MakerMetricsTable {
    let columns = raw
        .columns
        .into_iter()
        .map(|(maker, values)| MakerColumn {
            maker,
            values: values.iter().map(as_number).collect(),
        })
        .collect();

    MakerMetricsTable {
        periods: raw.periods,
        columns,
    }
}

/// Numbers pass, numeric strings are parsed, everything else counts as zero.
fn as_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|number| number.is_finite()).unwrap_or(0.0)
}

/// The api has always sent periods oldest first, but nothing promises it.
///
/// Only a list that is plainly newest first (non-increasing, with at least one step
/// down) is flipped. Labels such as `Q4 2024` or `2024-9` don't sort like time does,
/// so any other order is trusted as it came.
fn into_ascending(mut table: MakerMetricsTable) -> MakerMetricsTable {
    let periods = &table.periods;
    let descending = periods.windows(2).all(|pair| pair[0] >= pair[1])
        && periods.windows(2).any(|pair| pair[0] > pair[1]);

    if !descending {
        return table;
    }

    debug!("periods arrived newest first, reversing them");

    table.periods.reverse();
    for column in table.columns.iter_mut() {
        column.values.reverse();
    }

    table
}

/// Keeps the most recent `window` periods.
fn truncate(mut table: MakerMetricsTable, window: usize) -> MakerMetricsTable {
    let excess = table.periods.len().saturating_sub(window);

    table.periods.drain(..excess);
    for column in table.columns.iter_mut() {
        column.values.drain(..excess);
    }

    table
}
