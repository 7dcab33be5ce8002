use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use jiff::{Span, Timestamp};
use serde_json::Value;
use tracing::{debug, warn};
use twox_hash::XxHash64;

use crate::io::evstats_client::{Fetch, Request};
use crate::prelude::*;

/// Memoizes every answer for the lifetime of the process, and keeps successful
/// ones on disk for the next run.
///
/// Nothing is ever evicted from the memo. A request that failed stays failed until
/// the process exits.
pub struct CachedFetch<F> {
    inner: F,
    memo: RefCell<HashMap<String, Option<Value>>>,
    disk: Option<DiskCache>,
}

impl<F: Fetch> CachedFetch<F> {
    pub fn new(inner: F, disk: Option<DiskCache>) -> Self {
        CachedFetch {
            inner,
            memo: RefCell::new(HashMap::new()),
            disk,
        }
    }

    fn from_disk(&self, key: &str) -> Option<Value> {
        let disk = self.disk.as_ref()?;

        let content = match disk.try_retrieve(key) {
            Ok(content) => content?,
            Err(error) => {
                warn!(key, %error, "could not read the cache, ignoring it");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(body) if body.is_object() => {
                debug!(key, "disk cache hit");
                Some(body)
            }
            _ => {
                debug!(key, "unreadable cache entry, ignoring it");
                None
            }
        }
    }

    fn from_inner(&self, key: &str, request: &Request) -> Option<Value> {
        let body = self.inner.fetch(request)?;

        // Only real documents are worth keeping across runs.
        if let Some(disk) = self.disk.as_ref() {
            if let Err(error) = disk.try_write(key, &body.to_string()) {
                warn!(key, %error, "could not write the cache");
            }
        }

        Some(body)
    }
}

impl<F: Fetch> Fetch for CachedFetch<F> {
    fn fetch(&self, request: &Request) -> Option<Value> {
        let key = request.cache_key();

        let memoized = self.memo.borrow().get(&key).cloned();
        if let Some(answer) = memoized {
            debug!(key, "memo hit");
            return answer;
        }

        let answer = self
            .from_disk(&key)
            .or_else(|| self.from_inner(&key, request));

        self.memo.borrow_mut().insert(key, answer.clone());

        answer
    }
}

/// A directory of response bodies, one file per request, expiring by mtime.
pub struct DiskCache {
    dir: PathBuf,
    ttl_minutes: i64,
    system_now: Timestamp,
}

impl DiskCache {
    pub fn new(dir: PathBuf, ttl_minutes: i64, system_now: Timestamp) -> Self {
        DiskCache {
            dir,
            ttl_minutes,
            system_now,
        }
    }

    /// Keys carry slashes and commas, so the file is named after their hash instead.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let hash = XxHash64::oneshot(0, key.as_bytes());

        self.dir.join(format!("{hash:016x}.json"))
    }

    /// The cached body for `key`, unless there is none or it has gone stale.
    pub fn try_retrieve(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);

        if !self.is_alive(&path)? {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .into_diagnostic()
            .wrap_err("Failed to read a cached response")?;

        Ok(Some(content))
    }

    /// Stores `body` under `key`. A live entry is left alone so its countdown keeps
    /// running from the first write.
    pub fn try_write(&self, key: &str, body: &str) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .into_diagnostic()
            .wrap_err("Failed to create the cache directory")?;

        let path = self.path_for(key);
        if self.is_alive(&path)? {
            return Ok(());
        }

        fs::write(&path, body)
            .into_diagnostic()
            .wrap_err("Failed to write a cached response")?;

        Ok(())
    }

    fn is_alive(&self, path: &Path) -> AppResult<bool> {
        if !path.try_exists().into_diagnostic()? {
            return Ok(false);
        }

        Ok(self.expires_at(path)? > self.system_now)
    }

    /// mtime + ttl. A ttl too large for a span is an error, which callers treat as a miss.
    fn expires_at(&self, path: &Path) -> AppResult<Timestamp> {
        let file_mtime = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .into_diagnostic()?;

        let ttl = Span::new()
            .try_minutes(self.ttl_minutes)
            .into_diagnostic()
            .wrap_err_with(|| format!("A ttl of {} minutes is too long", self.ttl_minutes))?;

        Timestamp::try_from(file_mtime)
            .and_then(|written| written.checked_add(ttl))
            .into_diagnostic()
            .wrap_err("Cache expiry is out of range")
    }
}
