use spinoff::{Color, Spinner, spinners};
use std::cell::RefCell;
use std::io::IsTerminal;

/// A spinner that may or may not exist.
///
/// Interior mutability so the fetch decorator can update it through a shared borrow
/// while the app still owns it.
pub struct SpinnerContainer {
    instance: RefCell<Option<Spinner>>,
}

impl SpinnerContainer {
    pub fn new() -> Self {
        SpinnerContainer {
            instance: RefCell::new(None),
        }
    }

    /// Attempts to create a spinner based on user preference and terminal capabilities.
    ///
    /// Pipes and redirects get no spinner, so `--no-animate` is only needed on a real
    /// terminal.
    pub fn unless_no_terminal_or(no_animate: bool) -> Self {
        if no_animate || !std::io::stdout().is_terminal() {
            return SpinnerContainer::new();
        }

        SpinnerContainer {
            instance: RefCell::new(Some(Spinner::new(
                spinners::Dots,
                "Retrieving",
                Color::Blue,
            ))),
        }
    }

    pub fn stop_with_message(&self, message: &str) {
        // Take it so it can't be stopped twice.
        match self.instance.borrow_mut().take() {
            Some(mut s) => s.stop_with_message(message),
            None => println!("{}", message),
        }
    }

    pub fn update_text(&self, message: String) {
        if let Some(spinner) = self.instance.borrow_mut().as_mut() {
            spinner.update_text(message)
        }
    }
}

impl Drop for SpinnerContainer {
    fn drop(&mut self) {
        if let Some(s) = self.instance.get_mut().as_mut() {
            s.stop_with_message("");
        }
    }
}
