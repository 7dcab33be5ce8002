use clap::{Parser, Subcommand, ValueEnum};
use jiff::civil::Date;

use crate::config::endpoints::{
    DAILY_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_TTL_MINUTES, MAKER_METRICS_URL,
};
use crate::config::makers::default_makers;
use crate::error::Error;
use crate::prelude::*;

impl Cli {
    /// Convenience constructor to avoid redundant `Parser` imports in main.
    pub fn new() -> Self {
        Cli::parse()
    }
}

impl RawArgs {
    pub fn try_parse_date(&self) -> AppResult<Date> {
        let date = self
            .date
            .parse::<Date>()
            .map_err(|_| Error::InvalidDate(self.date.to_owned()))?;

        Ok(date)
    }
}

// Structs

#[derive(Parser, Debug)]
#[command(name = "evstats", version, about = "Electric vehicle registrations, straight from evstats.gr.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    //
    // Global args start here..
    //

    //
    /// Skip animations
    #[arg(long, default_value_t = false, global = true)]
    pub no_animate: bool,

    /// Plain CSV instead of boxed tables.
    #[arg(long, default_value_t = false, global = true)]
    pub unformatted: bool,

    /// Print JSON instead of tables. Compact with --unformatted.
    #[arg(long, default_value_t = false, global = true)]
    pub json: bool,

    /// Time to live in minutes for responses kept on disk.
    #[arg(long, default_value_t = DEFAULT_TTL_MINUTES, value_parser = clap::value_parser!(i64).range(0..), global = true)]
    pub ttl_minutes: i64,

    /// Always go to the network. Answers are still shared within a single run.
    #[arg(long, default_value_t = false, global = true)]
    pub no_cache: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..), global = true)]
    pub timeout_secs: u64,

    /// Base of the per-day endpoint, the date is appended to it.
    #[arg(long, env = "EVSTATS_DAILY_URL", default_value = DAILY_BASE_URL, global = true)]
    pub daily_url: String,

    /// The maker metrics endpoint.
    #[arg(long, env = "EVSTATS_MAKER_URL", default_value = MAKER_METRICS_URL, global = true)]
    pub maker_url: String,

    /// Makers to ask for, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = default_makers(), global = true)]
    pub makers: Vec<String>,

    /// More logs. Repeat for even more. RUST_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Registrations per model for every day of a month, plus the month's totals.
    Daily(MonthArgs),

    /// Registrations per maker over the trailing months, quarters or years.
    Makers(MakersArgs),

    /// Each maker's figure for the most recent period, highest first.
    Latest(LatestArgs),

    /// Everything at once: the month, all three maker tables and the latest ranking.
    Dashboard(MonthArgs),

    /// The raw daily document as JSON.
    ///
    /// Handy for piping into `jq` when the api changes shape again.
    Raw(RawArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct MonthArgs {
    /// Defaults to the current year. Nothing before 2013.
    #[arg(long)]
    pub year: Option<i16>,

    /// 1 to 12. Defaults to the current month.
    #[arg(long, value_parser = clap::value_parser!(i8).range(1..=12))]
    pub month: Option<i8>,
}

#[derive(clap::Args, Debug, Default)]
pub struct MakersArgs {
    /// Which buckets to show, comma separated. All three when omitted.
    #[arg(long, value_delimiter = ',')]
    pub period: Vec<TimeBucket>,
}

#[derive(clap::Args, Debug)]
pub struct LatestArgs {
    #[arg(long, default_value = "month")]
    pub period: TimeBucket,
}

#[derive(clap::Args, Debug)]
pub struct RawArgs {
    /// A day, like 2025-03-15.
    #[arg(long)]
    pub date: String,
}

/// How the maker metrics endpoint buckets its counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeBucket {
    Month,
    Quarter,
    Year,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 3] = [TimeBucket::Month, TimeBucket::Quarter, TimeBucket::Year];

    /// The api's spelling, used for `timePeriod`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Month => "month",
            TimeBucket::Quarter => "quarter",
            TimeBucket::Year => "year",
        }
    }

    /// Anything the api doesn't know is `None`.
    pub fn parse(selector: &str) -> Option<Self> {
        TimeBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == selector)
    }
}
