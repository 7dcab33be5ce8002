/// Per-day endpoint. The date (`YYYY-MM-DD`) is appended as-is.
pub const DAILY_BASE_URL: &str = "https://evstats.gr/api/dailyBevModels/";

pub const MAKER_METRICS_URL: &str = "https://evstats.gr/api/makerMetrics";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// The registry has nothing older than this.
pub const FIRST_YEAR: i16 = 2013;
