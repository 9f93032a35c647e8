//! Stream time bookkeeping for one connection.
//!
//! Chunks arrive with caller-declared start/end positions; the engine times
//! its segments from zero within each chunk. The clock tracks how much
//! declared audio has passed so far, which is the fallback offset for chunks
//! that omit their start position.

/// Running total of declared chunk durations for one connection.
///
/// Starts at zero on connect and only ever moves forward: a chunk advances
/// the clock by its declared duration whether translation succeeded, failed,
/// or found nothing, so a single bad chunk can never stall or rewind the
/// stream timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamClock {
    elapsed: f64,
}

impl StreamClock {
    /// Creates a clock at stream position zero.
    pub fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Seconds of declared audio processed so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advances the clock by one chunk's declared duration.
    ///
    /// Negative and non-finite durations advance by nothing; the clock is
    /// monotonically non-decreasing.
    pub fn advance(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.elapsed += duration;
        }
    }
}

impl Default for StreamClock {
    fn default() -> Self {
        Self::new()
    }
}
