use miette::Diagnostic;
use thiserror::Error;

// evstats::input -> cli arguments that parse but make no sense.
// evstats::config -> environment, filesystem.
//
// Nothing the api does ends up here. A bad response is "no data", not an error.

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Year {year} is out of range, expected {first} to {latest}.")]
    #[diagnostic(
        code(evstats::input::year),
        help("Registrations are tracked from 2013 up to the current year.")
    )]
    YearOutOfRange { year: i16, first: i16, latest: i16 },

    #[error("Invalid date: expected YYYY-MM-DD, got '{0}'")]
    #[diagnostic(
        code(evstats::input::date),
        help("Use a real calendar day, for example '2025-03-15'.")
    )]
    InvalidDate(String),

    #[error("Could not find a cache directory.")]
    #[diagnostic(
        code(evstats::config::cache_dir),
        help("Pass --no-cache to run without one.")
    )]
    CacheDirNotFound,
}
