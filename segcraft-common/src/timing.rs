//! Beat-based timing for segment fabrication
//!
//! Segments are measured in beats; everything that reaches the mixer is
//! measured in microseconds. The conversion is linear in the tempo of the
//! segment's current main program:
//!
//! ```text
//! micros_per_beat = 60 × 1,000,000 ÷ tempo (beats per minute)
//! micros_at(position) = micros_per_beat × position
//! total_micros = micros_at(total_beats)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use segcraft_common::timing::*;
//!
//! // 120 BPM: half a second per beat
//! assert_eq!(micros_per_beat(120.0), 500_000.0);
//!
//! // Four beats at 120 BPM is two seconds
//! assert_eq!(micros_at_position(micros_per_beat(120.0), 4.0), 2_000_000);
//! ```

use chrono::{DateTime, Utc};

// ============================================================================
// Constants
// ============================================================================

/// Microseconds per second
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Seconds per minute
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Microseconds per minute: 60,000,000
///
/// Numerator of the micros-per-beat formula.
pub const MICROS_PER_MINUTE: i64 = MICROS_PER_SECOND * SECONDS_PER_MINUTE;

/// Nanoseconds per microsecond
pub const NANOS_PER_MICRO: u128 = 1_000;

// ============================================================================
// Core Conversion Functions
// ============================================================================

/// Microseconds per beat at the given tempo (beats per minute)
///
/// Returns `None` when the tempo is zero, negative or not finite; a caller
/// with no usable tempo cannot place anything in time.
///
/// ```rust
/// use segcraft_common::timing::try_micros_per_beat;
///
/// assert_eq!(try_micros_per_beat(60.0), Some(1_000_000.0));
/// assert_eq!(try_micros_per_beat(0.0), None);
/// ```
pub fn try_micros_per_beat(tempo: f64) -> Option<f64> {
    if tempo.is_finite() && tempo > 0.0 {
        Some(MICROS_PER_MINUTE as f64 / tempo)
    } else {
        None
    }
}

/// Microseconds per beat at the given tempo (beats per minute)
///
/// Non-positive tempos yield `f64::INFINITY`; prefer
/// [`try_micros_per_beat`] where the tempo is not already validated.
pub fn micros_per_beat(tempo: f64) -> f64 {
    try_micros_per_beat(tempo).unwrap_or(f64::INFINITY)
}

/// Segment-relative microseconds at a beat position
///
/// Truncates toward zero, matching integer microsecond storage.
pub fn micros_at_position(micros_per_beat: f64, position: f64) -> i64 {
    (micros_per_beat * position) as i64
}

/// Clamp a tempo into `[min, max]`
///
/// Used to keep a catalog tempo inside the bounds configured on a template.
pub fn clamp_tempo(tempo: f64, min: f64, max: f64) -> f64 {
    tempo.max(min).min(max)
}

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micros_per_minute_constant() {
        assert_eq!(MICROS_PER_MINUTE, 60_000_000);
    }

    #[test]
    fn test_micros_per_beat_common_tempos() {
        assert_eq!(micros_per_beat(60.0), 1_000_000.0);
        assert_eq!(micros_per_beat(120.0), 500_000.0);
        assert_eq!(micros_per_beat(240.0), 250_000.0);
    }

    #[test]
    fn test_micros_per_beat_rejects_unusable_tempo() {
        assert_eq!(try_micros_per_beat(0.0), None);
        assert_eq!(try_micros_per_beat(-120.0), None);
        assert_eq!(try_micros_per_beat(f64::NAN), None);
        assert!(micros_per_beat(0.0).is_infinite());
    }

    #[test]
    fn test_micros_at_position() {
        let mpb = micros_per_beat(120.0);
        assert_eq!(micros_at_position(mpb, 0.0), 0);
        assert_eq!(micros_at_position(mpb, 1.5), 750_000);
        assert_eq!(micros_at_position(mpb, 16.0), 8_000_000);
    }

    #[test]
    fn test_micros_at_position_truncates() {
        // 90 BPM = 666,666.66.. micros per beat
        let mpb = micros_per_beat(90.0);
        assert_eq!(micros_at_position(mpb, 1.0), 666_666);
    }

    #[test]
    fn test_clamp_tempo() {
        assert_eq!(clamp_tempo(120.0, 40.0, 200.0), 120.0);
        assert_eq!(clamp_tempo(20.0, 40.0, 200.0), 40.0);
        assert_eq!(clamp_tempo(300.0, 40.0, 200.0), 200.0);
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }
}
