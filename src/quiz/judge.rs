//! Answer judging for one hidden token, driven by a caller-supplied clock.

use std::time::{Duration, Instant};

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_JUDGE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_AUTOFILL_TRIGGER: char = '?';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Default,
    Correct,
    Wrong,
}

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// A judge will run at `deadline` unless superseded.
    Scheduled { deadline: Instant },
    /// The trigger filled in the answer; the caret belongs at `caret` (in chars).
    AutoFilled { caret: usize },
}

/// NFC, then drop every whitespace character.
pub fn normalize_answer(text: &str) -> String {
    text.nfc().filter(|c| !c.is_whitespace()).collect()
}

pub fn answers_match(input: &str, expected: &str) -> bool {
    normalize_answer(input) == normalize_answer(expected)
}

#[derive(Debug, Clone)]
pub struct AnswerJudge {
    answer: String,
    value: String,
    status: Status,
    show_answer: bool,
    pending: Option<Instant>,
    delay: Duration,
    trigger: char,
    seen_reset: u64,
}

impl AnswerJudge {
    pub fn new(answer: impl Into<String>, reset_signal: u64) -> Self {
        Self {
            answer: answer.into(),
            value: String::new(),
            status: Status::Default,
            show_answer: false,
            pending: None,
            delay: DEFAULT_JUDGE_DELAY,
            trigger: DEFAULT_AUTOFILL_TRIGGER,
            seen_reset: reset_signal,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_trigger(mut self, trigger: char) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// The full input after an edit. Line breaks are dropped.
    pub fn input(&mut self, raw: &str, now: Instant) -> InputOutcome {
        let raw: String = raw.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        self.status = Status::Default;

        if raw.ends_with(self.trigger) {
            self.pending = None;
            self.value = self.answer.clone();
            self.status = Status::Correct;
            self.show_answer = false;
            return InputOutcome::AutoFilled {
                caret: self.value.chars().count(),
            };
        }

        self.value = raw;
        let deadline = now + self.delay;
        self.pending = Some(deadline);
        InputOutcome::Scheduled { deadline }
    }

    /// Judge right away, cancelling a pending debounced judge.
    pub fn submit(&mut self) -> Status {
        self.pending = None;
        self.judge()
    }

    /// Run the debounced judge if its quiet period is over.
    pub fn poll(&mut self, now: Instant) -> Option<Status> {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                Some(self.judge())
            }
            _ => None,
        }
    }

    fn judge(&mut self) -> Status {
        self.status = if answers_match(&self.value, &self.answer) {
            Status::Correct
        } else {
            Status::Wrong
        };
        self.status
    }

    pub fn toggle_answer(&mut self) -> bool {
        self.show_answer = !self.show_answer;
        self.show_answer
    }

    /// The expected answer while the reveal toggle is on.
    pub fn revealed_answer(&self) -> Option<&str> {
        self.show_answer.then_some(self.answer.as_str())
    }

    /// React to the page's reset signal. A changed signal clears the input,
    /// the status, the reveal toggle and any pending judge.
    pub fn sync_reset(&mut self, reset_signal: u64) {
        if reset_signal != self.seen_reset {
            self.seen_reset = reset_signal;
            self.value.clear();
            self.status = Status::Default;
            self.show_answer = false;
            self.pending = None;
        }
    }

    /// Drop the pending judge when the input goes away.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
