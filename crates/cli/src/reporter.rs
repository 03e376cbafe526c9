//! Session observer that drives the terminal
//!
//! Shows a spinner while a request is in flight, prints each step as it
//! completes in human mode, and keeps the outcomes for the JSON document.

use s3conn_core::{Error, SessionObserver, Step, StepOutcome};

use crate::output::report::render_outcome;
use crate::output::{Formatter, Spinner};

/// Prints session progress through a [`Formatter`]
pub struct Reporter {
    formatter: Formatter,
    spinner: Option<Spinner>,
    completed: Vec<StepOutcome>,
}

impl Reporter {
    pub fn new(formatter: Formatter) -> Self {
        Self {
            formatter,
            spinner: None,
            completed: Vec::new(),
        }
    }

    /// Outcomes of the steps that finished so far
    pub fn completed(&self) -> &[StepOutcome] {
        &self.completed
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl SessionObserver for Reporter {
    fn step_started(&mut self, step: Step) {
        self.stop_spinner();
        self.spinner = Some(Spinner::start(
            self.formatter.config(),
            &format!("{}...", step.label()),
        ));
    }

    fn step_finished(&mut self, outcome: &StepOutcome) {
        self.stop_spinner();
        if !self.formatter.is_json() {
            if !self.completed.is_empty() {
                self.formatter.println("");
            }
            self.formatter
                .println(&render_outcome(outcome, self.formatter.colors_enabled()));
        }
        self.completed.push(outcome.clone());
    }

    fn step_failed(&mut self, step: Step, error: &Error) {
        self.stop_spinner();
        tracing::debug!(%step, %error, "session aborted");
    }
}
