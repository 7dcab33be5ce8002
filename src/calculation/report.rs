use tabled::builder::Builder;
use tabled::settings::Style;

use crate::calculation::latest::MakerLatestRanking;
use crate::calculation::maker_metrics::MakerMetricsTable;
use crate::calculation::monthly::{DailyMatrix, MonthlySummary};
use crate::cli::TimeBucket;
use crate::config::makers::trailing_window;
use crate::prelude::*;

/// Something ready to be printed.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// A titled grid of cells. The header is the first row.
    Table {
        title: String,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Said instead of a table when there is nothing to show.
    Notice(String),
    /// Already rendered, printed as is.
    Raw(String),
    /// Several reports, one after another.
    Sections(Vec<Report>),
}

impl Report {
    /// Renders the report.
    /// - Tables become boxed tables, or bare CSV when `no_format` is set.
    /// - Everything else is text already.
    pub fn render(&self, no_format: bool) -> AppResult<String> {
        match self {
            Report::Table {
                title,
                header,
                rows,
            } => {
                if no_format {
                    format_csv(header, rows)
                } else {
                    Ok(format_table(title, header, rows))
                }
            }

            Report::Notice(message) => Ok(message.to_owned()),

            Report::Raw(content) => Ok(content.to_owned()),

            Report::Sections(reports) => {
                let rendered = reports
                    .iter()
                    .map(|report| report.render(no_format))
                    .collect::<AppResult<Vec<String>>>()?;

                // Room to breathe between tables, CSV blocks just follow each other.
                let separator = if no_format { "\n" } else { "\n\n" };

                Ok(rendered.join(separator))
            }
        }
    }

    /// Rows are days, columns are models.
    pub fn daily_matrix(matrix: &DailyMatrix) -> Self {
        if matrix.rows.is_empty() {
            return Report::Notice(
                "No daily data found for that month (or it's in the future).".to_owned(),
            );
        }

        let header = std::iter::once("Date".to_owned())
            .chain(matrix.models.iter().cloned())
            .collect();

        let rows = matrix
            .rows
            .iter()
            .map(|(date, cells)| {
                std::iter::once(date.to_string())
                    .chain(cells.iter().map(|count| count.to_string()))
                    .collect()
            })
            .collect();

        Report::Table {
            title: "Daily Data (Cars)".to_owned(),
            header,
            rows,
        }
    }

    pub fn monthly_summary(summary: &MonthlySummary) -> Self {
        if summary.is_empty() {
            return Report::Notice("No models were registered that month.".to_owned());
        }

        Report::Table {
            title: "Monthly Summary (Cars)".to_owned(),
            header: vec!["Model".to_owned(), "Count".to_owned()],
            rows: summary
                .iter()
                .map(|(model, count)| vec![model.to_owned(), count.to_string()])
                .collect(),
        }
    }

    /// Newest period on top.
    pub fn maker_metrics(bucket: TimeBucket, table: &MakerMetricsTable) -> Self {
        let title = maker_metrics_title(bucket);

        if table.is_empty() {
            return Report::Notice(format!("No data for {title}"));
        }

        let header = std::iter::once("Period".to_owned())
            .chain(table.columns.iter().map(|column| column.maker.to_owned()))
            .collect();

        let rows = table
            .rows_newest_first()
            .into_iter()
            .map(|(period, values)| {
                std::iter::once(period.to_owned())
                    .chain(values.iter().map(|value| value.to_string()))
                    .collect()
            })
            .collect();

        Report::Table {
            title,
            header,
            rows,
        }
    }

    pub fn latest_ranking(bucket: TimeBucket, ranking: &MakerLatestRanking) -> Self {
        let title = format!("Latest {} Figures by Maker", capitalized(bucket));

        if ranking.is_empty() {
            return Report::Notice(format!("No data for {title}"));
        }

        Report::Table {
            title,
            header: vec!["Maker".to_owned(), "Latest".to_owned()],
            rows: ranking
                .iter()
                .map(|entry| vec![entry.maker.to_owned(), entry.latest.to_string()])
                .collect(),
        }
    }
}

// private

fn maker_metrics_title(bucket: TimeBucket) -> String {
    let unit = match bucket {
        TimeBucket::Month => "Months",
        TimeBucket::Quarter => "Quarters",
        TimeBucket::Year => "Years",
    };

    format!(
        "{}ly Maker Metrics (Last {} {})",
        capitalized(bucket),
        trailing_window(bucket),
        unit
    )
}

fn capitalized(bucket: TimeBucket) -> String {
    let name = bucket.as_str();
    let mut chars = name.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_table(title: &str, header: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();

    builder.push_record(header.to_vec());
    for row in rows {
        builder.push_record(row.to_vec());
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    format!("{title}\n{table}")
}

/// Header row first, so the output opens straight in a spreadsheet.
fn format_csv(header: &[String], rows: &[Vec<String>]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false) // The header is written by hand, it's just another record.
        .from_writer(vec![]);

    for record in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        writer
            .write_record(record)
            .into_diagnostic()
            .wrap_err("Failed to serialize a row to CSV format")?;
    }

    let data = writer
        .into_inner()
        .into_diagnostic()
        .wrap_err("Failed to get writer data.")?;

    let csv_string = String::from_utf8(data)
        .into_diagnostic()
        .wrap_err("Invalid utf-8")?;

    Ok(csv_string)
}
