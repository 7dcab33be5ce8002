use itertools::Itertools;

use crate::calculation::maker_metrics::MakerMetricsTable;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MakerLatest {
    pub maker: String,
    pub latest: i64,
}

/// Highest first.
pub type MakerLatestRanking = Vec<MakerLatest>;

/// Every maker's value for the table's last period, ranked.
///
/// Relies on the table being oldest-first, which `normalize` guarantees.
pub fn latest_ranking(table: &MakerMetricsTable) -> MakerLatestRanking {
    let Some(last) = table.periods.len().checked_sub(1) else {
        return MakerLatestRanking::new();
    };

    table
        .columns
        .iter()
        .filter_map(|column| {
            let value = column.values.get(last)?;

            Some(MakerLatest {
                maker: column.maker.to_owned(),
                latest: *value as i64,
            })
        })
        .sorted_by(|left, right| right.latest.cmp(&left.latest))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::maker_metrics::{MakerColumn, normalize};
    use crate::cli::TimeBucket;
    use serde_json::json;

    fn column(maker: &str, values: &[f64]) -> MakerColumn {
        MakerColumn {
            maker: maker.to_owned(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn empty_table_ranks_nothing() {
        assert!(latest_ranking(&MakerMetricsTable::default()).is_empty());
    }

    #[test]
    fn ranks_the_last_period() {
        let table = MakerMetricsTable {
            periods: vec!["2024-01".to_owned(), "2024-02".to_owned()],
            columns: vec![
                column("tesla", &[50.0, 10.0]),
                column("byd", &[1.0, 30.0]),
                column("volvo", &[7.0, 20.9]),
            ],
        };

        let ranking = latest_ranking(&table);

        assert_eq!(
            ranking,
            vec![
                MakerLatest { maker: "byd".to_owned(), latest: 30 },
                MakerLatest { maker: "volvo".to_owned(), latest: 20 },
                MakerLatest { maker: "tesla".to_owned(), latest: 10 },
            ]
        );
    }

    #[test]
    fn latest_means_most_recent_even_when_upstream_is_descending() {
        let response = json!({
            "periods": ["2024-03", "2024-02", "2024-01"],
            "data": { "tesla": [3, 2, 1], "byd": [1, 5, 9] }
        });
        let makers = vec!["tesla".to_owned(), "byd".to_owned()];

        let ranking = latest_ranking(&normalize(TimeBucket::Month, &response, &makers));

        assert_eq!(ranking[0], MakerLatest { maker: "tesla".to_owned(), latest: 3 });
        assert_eq!(ranking[1], MakerLatest { maker: "byd".to_owned(), latest: 1 });
    }

    #[test]
    fn latest_follows_upstream_order_for_quarter_labels() {
        let response = json!({
            "periods": ["Q3 2024", "Q4 2024", "Q1 2025"],
            "data": { "tesla": [9, 9, 2], "byd": [1, 1, 4] }
        });
        let makers = vec!["tesla".to_owned(), "byd".to_owned()];

        let ranking = latest_ranking(&normalize(TimeBucket::Quarter, &response, &makers));

        assert_eq!(ranking[0], MakerLatest { maker: "byd".to_owned(), latest: 4 });
        assert_eq!(ranking[1], MakerLatest { maker: "tesla".to_owned(), latest: 2 });
    }
}
