use crate::cli::TimeBucket;

/// Makers requested from the metrics endpoint unless `--makers` says otherwise.
/// Identifiers are case-sensitive.
pub static MAKERS: [&str; 7] = [
    "total",
    "byd",
    "volvo",
    "hyundai",
    "tesla",
    "geely",
    "leapmotor",
];

/// Legacy fields the metrics endpoint used to mix in with the makers.
/// They never make it into a table.
pub static DROPPED_COLUMNS: [&str; 2] = ["acc", "bevshare"];

pub struct TrailingWindow {
    pub bucket: TimeBucket,
    pub periods: usize,
}

pub static TRAILING_WINDOWS: &[TrailingWindow] = &[
    TrailingWindow {
        bucket: TimeBucket::Month,
        periods: 18,
    },
    TrailingWindow {
        bucket: TimeBucket::Quarter,
        periods: 12,
    },
    TrailingWindow {
        bucket: TimeBucket::Year,
        periods: 10,
    },
];

pub fn default_makers() -> Vec<String> {
    MAKERS.iter().map(|maker| maker.to_string()).collect()
}

pub fn trailing_window(bucket: TimeBucket) -> usize {
    TRAILING_WINDOWS
        .iter()
        .find(|window| window.bucket == bucket)
        .map(|window| window.periods)
        .unwrap_or_default()
}
