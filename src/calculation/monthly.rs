use std::collections::HashMap;

use itertools::Itertools;
use jiff::ToSpan;
use jiff::civil::Date;
use serde_json::Value;
use tracing::info;

use crate::calculation::extract::{ModelCountMap, extract_model_counts};
use crate::io::evstats_client::{DailyDocument, Fetch, Request};
use crate::prelude::*;

/// What one day contributed. Models that sold nothing that day are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: Date,
    pub counts: ModelCountMap,
}

/// Model -> month total, highest first.
pub type MonthlySummary = Vec<(String, u64)>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonthlyReport {
    /// One row per day attempted, oldest first.
    pub days: Vec<DailyRow>,
    pub summary: MonthlySummary,
}

/// Daily rows over a shared set of columns, zero where a model had no entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyMatrix {
    /// In the order they first turned up during the month.
    pub models: Vec<String>,
    pub rows: Vec<(Date, Vec<u64>)>,
}

impl MonthlyReport {
    /// Nothing was attempted, i.e. the month hasn't started yet.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn matrix(&self) -> DailyMatrix {
        densify(&self.days)
    }
}

/// One day's document, if the api had one.
pub fn fetch_daily<F: Fetch + ?Sized>(source: &F, date: Date) -> Option<DailyDocument> {
    match source.fetch(&Request::Daily(date))? {
        Value::Object(document) => Some(document),
        _ => None,
    }
}

/// Walks every day of the month up to `today`, one request per day, and adds them up.
///
/// A month that starts after `today` is empty without touching the network.
/// Days the api has nothing for still get a row, just an empty one.
pub fn aggregate_month<F: Fetch + ?Sized>(
    source: &F,
    year: i16,
    month: i8,
    today: Date,
) -> AppResult<MonthlyReport> {
    let start = Date::new(year, month, 1)
        .into_diagnostic()
        .wrap_err_with(|| format!("{year}-{month:02} is not a month"))?;

    if start > today {
        info!(%start, "month is in the future, nothing to fetch");
        return Ok(MonthlyReport::default());
    }

    // Never ask for days that haven't happened yet.
    let end = start.last_of_month().min(today);

    let days: Vec<DailyRow> = start
        .series(1.day())
        .take_while(|date| *date <= end)
        .map(|date| {
            let document = fetch_daily(source, date);

            DailyRow {
                date,
                counts: extract_model_counts(document.as_ref()),
            }
        })
        .collect();

    let summary = summarize(&days);

    Ok(MonthlyReport { days, summary })
}

/// Month totals per model, highest first. Ties keep the order models first appeared in.
/// Totals stop at `u64::MAX` rather than wrapping.
pub fn summarize(days: &[DailyRow]) -> MonthlySummary {
    let totals: HashMap<&str, u64> = days
        .iter()
        .flat_map(|day| day.counts.iter())
        .map(|(model, count)| (model.as_str(), *count))
        .into_grouping_map()
        .fold(0, |total, _model, count| total.saturating_add(count));

    models_in_order(days)
        .into_iter()
        .map(|model| {
            let total = totals.get(model.as_str()).copied().unwrap_or_default();

            (model, total)
        })
        .sorted_by(|left, right| right.1.cmp(&left.1))
        .collect()
}

/// Fills every row out to the union of models seen in the month.
pub fn densify(days: &[DailyRow]) -> DailyMatrix {
    let models = models_in_order(days);

    let rows = days
        .iter()
        .map(|day| {
            let cells = models
                .iter()
                .map(|model| day.counts.get(model).copied().unwrap_or(0))
                .collect();

            (day.date, cells)
        })
        .collect();

    DailyMatrix { models, rows }
}

// private

fn models_in_order(days: &[DailyRow]) -> Vec<String> {
    days.iter()
        .flat_map(|day| day.counts.keys())
        .unique()
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::evstats_client::testing::FakeFetch;
    use jiff::civil::date;
    use serde_json::json;

    fn v2(models: Value) -> Value {
        json!({ "v2": { "cars": { "models": models } } })
    }

    fn row(date: Date, counts: &[(&str, u64)]) -> DailyRow {
        DailyRow {
            date,
            counts: counts
                .iter()
                .map(|(model, count)| (model.to_string(), *count))
                .collect(),
        }
    }

    #[test]
    fn future_month_is_empty_and_quiet() {
        let fake = FakeFetch::new();

        let report = aggregate_month(&fake, 2025, 4, date(2025, 3, 15)).unwrap();

        assert!(report.is_empty());
        assert!(report.summary.is_empty());
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn sums_days_and_ranks_models() {
        let fake = FakeFetch::new()
            .with(Request::Daily(date(2025, 3, 1)), v2(json!({ "ModelA": 2 })))
            .with(
                Request::Daily(date(2025, 3, 2)),
                json!({ "v1": { "cars": { "models": { "ModelA": 1, "ModelB": 5 } } } }),
            );

        let report = aggregate_month(&fake, 2025, 3, date(2025, 3, 2)).unwrap();

        assert_eq!(
            report.summary,
            vec![("ModelB".to_owned(), 5), ("ModelA".to_owned(), 3)]
        );
        assert_eq!(report.days.len(), 2);
    }

    #[test]
    fn stops_at_today_mid_month() {
        let fake = FakeFetch::new();

        let report = aggregate_month(&fake, 2025, 3, date(2025, 3, 10)).unwrap();

        let requested: Vec<Request> = (1..=10)
            .map(|day| Request::Daily(date(2025, 3, day)))
            .collect();
        assert_eq!(fake.calls(), requested);
        assert_eq!(report.days.len(), 10);
    }

    #[test]
    fn past_month_covers_every_day_in_order() {
        let fake = FakeFetch::new();

        let report = aggregate_month(&fake, 2024, 2, date(2025, 3, 10)).unwrap();

        let dates: Vec<Date> = report.days.iter().map(|day| day.date).collect();
        assert_eq!(dates.len(), 29);
        assert_eq!(dates.first(), Some(&date(2024, 2, 1)));
        assert_eq!(dates.last(), Some(&date(2024, 2, 29)));
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn unreachable_days_still_get_rows() {
        let fake = FakeFetch::new();

        let report = aggregate_month(&fake, 2025, 3, date(2025, 3, 3)).unwrap();

        assert_eq!(report.days.len(), 3);
        assert!(report.days.iter().all(|day| day.counts.is_empty()));
        assert!(report.summary.is_empty());
        assert!(report.matrix().models.is_empty());
    }

    #[test]
    fn densify_fills_gaps_with_zero() {
        let days = vec![
            row(date(2025, 3, 1), &[("ModelB", 2)]),
            row(date(2025, 3, 2), &[]),
            row(date(2025, 3, 3), &[("ModelA", 1), ("ModelB", 4)]),
        ];

        let matrix = densify(&days);

        assert_eq!(matrix.models, vec!["ModelB", "ModelA"]);
        assert_eq!(
            matrix.rows,
            vec![
                (date(2025, 3, 1), vec![2, 0]),
                (date(2025, 3, 2), vec![0, 0]),
                (date(2025, 3, 3), vec![4, 1]),
            ]
        );
    }

    #[test]
    fn totals_do_not_depend_on_day_order() {
        let days = vec![
            row(date(2025, 3, 1), &[("ModelA", 2), ("ModelC", 9)]),
            row(date(2025, 3, 2), &[("ModelA", 1), ("ModelB", 5)]),
            row(date(2025, 3, 3), &[("ModelB", 3)]),
        ];
        let mut reversed = days.clone();
        reversed.reverse();

        let forward: HashMap<String, u64> = summarize(&days).into_iter().collect();
        let backward: HashMap<String, u64> = summarize(&reversed).into_iter().collect();

        assert_eq!(forward, backward);
        assert_eq!(forward["ModelA"], 3);
        assert_eq!(forward["ModelB"], 8);
        assert_eq!(forward["ModelC"], 9);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let days = vec![
            row(date(2025, 3, 1), &[("Zeta", 2)]),
            row(date(2025, 3, 2), &[("Alpha", 2)]),
        ];

        assert_eq!(
            summarize(&days),
            vec![("Zeta".to_owned(), 2), ("Alpha".to_owned(), 2)]
        );
    }

    #[test]
    fn huge_totals_saturate() {
        let days = vec![
            row(date(2025, 3, 1), &[("ModelA", u64::MAX)]),
            row(date(2025, 3, 2), &[("ModelA", 1), ("ModelB", 2)]),
        ];

        assert_eq!(
            summarize(&days),
            vec![("ModelA".to_owned(), u64::MAX), ("ModelB".to_owned(), 2)]
        );
    }
}
