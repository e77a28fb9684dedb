//! Configuration for live feeds.

use crate::error::{FeedError, FeedResult};
use crate::translator::TranslatorOptions;
use std::time::Duration;

/// Configuration for a live feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Pending entity count at which the feed stops asking for more.
    pub high_water_mark: usize,
    /// Pause before re-polling after a long-poll timeout.
    ///
    /// Zero yields to the scheduler instead of sleeping.
    pub timeout_continuation: Duration,
    /// Insertions between two automatic stash releases.
    pub stash_release_interval: usize,
    /// Translator options.
    pub translator: TranslatorOptions,
}

impl FeedConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            high_water_mark: 16,
            timeout_continuation: Duration::ZERO,
            stash_release_interval: 5,
            translator: TranslatorOptions::default(),
        }
    }

    /// Sets the high-water mark.
    pub fn with_high_water_mark(mut self, mark: usize) -> Self {
        self.high_water_mark = mark;
        self
    }

    /// Sets the pause taken after a long-poll timeout.
    pub fn with_timeout_continuation(mut self, pause: Duration) -> Self {
        self.timeout_continuation = pause;
        self
    }

    /// Sets the stash release interval.
    pub fn with_stash_release_interval(mut self, interval: usize) -> Self {
        self.stash_release_interval = interval;
        self
    }

    /// Sets the translator options.
    pub fn with_translator(mut self, options: TranslatorOptions) -> Self {
        self.translator = options;
        self
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> FeedResult<()> {
        if self.high_water_mark == 0 {
            return Err(FeedError::InvalidConfig(
                "high_water_mark must be at least 1".into(),
            ));
        }
        if self.stash_release_interval == 0 {
            return Err(FeedError::InvalidConfig(
                "stash_release_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new()
    }
}
