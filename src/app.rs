use std::path::PathBuf;
use std::time::Duration;

use jiff::Timestamp;
use jiff::civil::Date;

use crate::cli::{Cli, MonthArgs};
use crate::config::endpoints::FIRST_YEAR;
use crate::display::SpinnerContainer;
use crate::error::Error;
use crate::io::cache::{CachedFetch, DiskCache};
use crate::io::evstats_client::{EvStatsClient, Reporting};
use crate::prelude::*;

pub struct App {
    pub cli: Cli,
    pub display: SpinnerContainer,
    /// Local calendar day. Nothing after it is ever fetched.
    pub today: Date,
}

impl App {
    pub fn new(cli: Cli, today: Date) -> Self {
        let display = SpinnerContainer::unless_no_terminal_or(cli.no_animate);

        App {
            cli,
            display,
            today,
        }
    }

    /// The client, wrapped in progress reporting and then the caches.
    pub fn source(&self) -> AppResult<CachedFetch<Reporting<'_, EvStatsClient>>> {
        let client = EvStatsClient::new(
            &self.cli.daily_url,
            &self.cli.maker_url,
            Duration::from_secs(self.cli.timeout_secs),
        );

        let disk = if self.cli.no_cache {
            None
        } else {
            Some(DiskCache::new(
                cache_dir()?,
                self.cli.ttl_minutes,
                Timestamp::now(),
            ))
        };

        Ok(CachedFetch::new(Reporting::new(client, &self.display), disk))
    }

    /// Fills in the current year and month, and refuses years with no records.
    pub fn try_year_month(&self, args: &MonthArgs) -> AppResult<(i16, i8)> {
        let year = args.year.unwrap_or(self.today.year());
        let month = args.month.unwrap_or(self.today.month());

        if !(FIRST_YEAR..=self.today.year()).contains(&year) {
            let error = Error::YearOutOfRange {
                year,
                first: FIRST_YEAR,
                latest: self.today.year(),
            };

            return Err(error.into());
        }

        Ok((year, month))
    }
}

fn cache_dir() -> AppResult<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or(Error::CacheDirNotFound)?
        .join("evstats");

    Ok(dir)
}
