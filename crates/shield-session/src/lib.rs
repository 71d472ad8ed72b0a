//! PrivacyShield Session Statistics
//!
//! One counter per page lifetime:
//! - Tracking tokens stripped (query parameters and fragment rewrites)
//! - Manual data clears performed
//!
//! Counts only go up; a reload starts a fresh session.

mod stats;

pub use stats::{SessionStats, StatsCounter};
