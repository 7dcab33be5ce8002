use serde_json::Value;

use crate::display::SpinnerContainer;

use super::{Fetch, Request};

/// Forwards to the inner fetcher while telling the user what is being retrieved.
pub struct Reporting<'a, F> {
    inner: F,
    spinner: &'a SpinnerContainer,
}

impl<'a, F> Reporting<'a, F> {
    pub fn new(inner: F, spinner: &'a SpinnerContainer) -> Self {
        Reporting { inner, spinner }
    }
}

impl<F: Fetch> Fetch for Reporting<'_, F> {
    fn fetch(&self, request: &Request) -> Option<Value> {
        self.spinner.update_text(progress_text(request));

        self.inner.fetch(request)
    }
}

fn progress_text(request: &Request) -> String {
    format!("Retrieving {request}")
}
