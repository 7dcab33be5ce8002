use crate::app::App;
use crate::calculation::latest::{MakerLatestRanking, latest_ranking};
use crate::calculation::maker_metrics::{MakerMetricsTable, fetch_maker_metrics};
use crate::calculation::monthly::{MonthlyReport, aggregate_month, fetch_daily};
use crate::calculation::report::Report;
use crate::cli::{Commands, LatestArgs, MakersArgs, MonthArgs, TimeBucket};
use crate::io::evstats_client::Fetch;
use crate::prelude::*;

/// What `--json` prints for the dashboard.
#[derive(Serialize)]
struct Dashboard<'a> {
    month: &'a MonthlyReport,
    makers: Vec<(TimeBucket, &'a MakerMetricsTable)>,
    latest: &'a MakerLatestRanking,
}

/// Runs the command against `source` and says what to print.
pub fn does_the_thing<F: Fetch + ?Sized>(ctx: &App, source: &F) -> AppResult<Report> {
    match &ctx.cli.command {
        // evstats daily.
        Commands::Daily(args) => {
            let month = fetch_month(ctx, source, args)?;

            if ctx.cli.json {
                return to_json(ctx, &month);
            }

            Ok(month_sections(&month))
        }

        // evstats makers.
        Commands::Makers(MakersArgs { period }) => {
            let buckets = if period.is_empty() {
                TimeBucket::ALL.to_vec()
            } else {
                period.clone()
            };

            let tables: Vec<(TimeBucket, MakerMetricsTable)> = buckets
                .into_iter()
                .map(|bucket| (bucket, fetch_bucket(ctx, source, bucket)))
                .collect();

            if ctx.cli.json {
                return to_json(ctx, &tables);
            }

            let sections = tables
                .iter()
                .map(|(bucket, table)| Report::maker_metrics(*bucket, table))
                .collect();

            Ok(Report::Sections(sections))
        }

        // evstats latest.
        Commands::Latest(LatestArgs { period }) => {
            let ranking = latest_ranking(&fetch_bucket(ctx, source, *period));

            if ctx.cli.json {
                return to_json(ctx, &ranking);
            }

            Ok(Report::latest_ranking(*period, &ranking))
        }

        // evstats dashboard.
        Commands::Dashboard(args) => {
            let month = fetch_month(ctx, source, args)?;

            let tables: Vec<(TimeBucket, MakerMetricsTable)> = TimeBucket::ALL
                .into_iter()
                .map(|bucket| (bucket, fetch_bucket(ctx, source, bucket)))
                .collect();

            // The monthly table is the first one, ALL starts with Month.
            let ranking = latest_ranking(&tables[0].1);

            if ctx.cli.json {
                let dashboard = Dashboard {
                    month: &month,
                    makers: tables.iter().map(|(bucket, table)| (*bucket, table)).collect(),
                    latest: &ranking,
                };

                return to_json(ctx, &dashboard);
            }

            let mut sections = vec![month_sections(&month)];
            sections.extend(
                tables
                    .iter()
                    .map(|(bucket, table)| Report::maker_metrics(*bucket, table)),
            );
            sections.push(Report::latest_ranking(TimeBucket::Month, &ranking));

            Ok(Report::Sections(sections))
        }

        // evstats raw.
        Commands::Raw(args) => {
            let date = args.try_parse_date()?;

            match fetch_daily(source, date) {
                Some(document) => to_json(ctx, &document),
                None => Ok(Report::Notice(format!("No data for {date}."))),
            }
        }
    }
}

// private

fn fetch_month<F: Fetch + ?Sized>(
    ctx: &App,
    source: &F,
    args: &MonthArgs,
) -> AppResult<MonthlyReport> {
    let (year, month) = ctx.try_year_month(args)?;

    aggregate_month(source, year, month, ctx.today)
}

fn fetch_bucket<F: Fetch + ?Sized>(ctx: &App, source: &F, bucket: TimeBucket) -> MakerMetricsTable {
    fetch_maker_metrics(source, bucket.as_str(), &ctx.cli.makers)
}

/// The day by day matrix, then the totals. Only the notice when the month is empty.
fn month_sections(month: &MonthlyReport) -> Report {
    if month.is_empty() {
        return Report::daily_matrix(&month.matrix());
    }

    Report::Sections(vec![
        Report::daily_matrix(&month.matrix()),
        Report::monthly_summary(&month.summary),
    ])
}

fn to_json<T: Serialize>(ctx: &App, value: &T) -> AppResult<Report> {
    let json = if ctx.cli.unformatted {
        serde_json::to_string(value).into_diagnostic()?
    } else {
        serde_json::to_string_pretty(value).into_diagnostic()?
    };

    Ok(Report::Raw(json))
}
