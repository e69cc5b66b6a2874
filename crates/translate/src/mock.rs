//! Mock transform for tests.
//!
//! - `MockTransform::uppercase()` - always succeeds, upper-casing the text
//! - `MockTransform::identity()` - always succeeds, returning the text as-is
//! - `MockTransform::mapping(..)` - fixed lookup table, identity otherwise
//! - `.failing_on(..)` / `.panicking_on(..)` / `.with_delay(..)` adjust any of them

use async_trait::async_trait;
use restyle_core::StyleProfile;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::transform::{TextTransform, TransformError};

/// How a successful call rewrites its text.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the text unchanged.
    Identity,
    /// Upper-case the text.
    Uppercase,
    /// Prefix the text with the profile name, e.g. `[gen-z] Hello`.
    Tagged,
    /// Look the text up; unknown text is returned unchanged.
    Mapping(HashMap<String, String>),
    /// Return an empty string.
    Empty,
}

/// Configurable in-process transform that records how it was called.
#[derive(Debug)]
pub struct MockTransform {
    behavior: MockBehavior,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    default_delay: Duration,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransform {
    /// Create a mock with the given behavior.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            fail_on: HashSet::new(),
            panic_on: HashSet::new(),
            default_delay: Duration::ZERO,
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// A mock that returns every text unchanged.
    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    /// A mock that upper-cases every text.
    pub fn uppercase() -> Self {
        Self::new(MockBehavior::Uppercase)
    }

    /// A mock backed by a lookup table.
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(MockBehavior::Mapping(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    /// Fail every call for `text`.
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.fail_on.insert(text.into());
        self
    }

    /// Panic inside every call for `text`.
    pub fn panicking_on(mut self, text: impl Into<String>) -> Self {
        self.panic_on.insert(text.into());
        self
    }

    /// Sleep this long in every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Sleep this long in calls for `text`, overriding the default delay.
    pub fn with_delay_for(mut self, text: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(text.into(), delay);
        self
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, text: &str, profile: StyleProfile) -> Result<String, TransformError> {
        if self.panic_on.contains(text) {
            panic!("mock transform panicked on {:?}", text);
        }
        if self.fail_on.contains(text) {
            return Err(TransformError::ApiError {
                status_code: 500,
                message: format!("mock failure for {:?}", text),
            });
        }

        Ok(match &self.behavior {
            MockBehavior::Identity => text.to_string(),
            MockBehavior::Uppercase => text.to_uppercase(),
            MockBehavior::Tagged => format!("[{}] {}", profile, text),
            MockBehavior::Mapping(map) => {
                map.get(text).cloned().unwrap_or_else(|| text.to_string())
            }
            MockBehavior::Empty => String::new(),
        })
    }
}

#[async_trait]
impl TextTransform for MockTransform {
    async fn transform(&self, text: &str, profile: StyleProfile) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.delays.get(text).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self.respond(text, profile);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
