//! Per-platform classification and extraction rules.
//!
//! Both supported platforms export the same two concepts (a guest booking
//! vs. a blocked date range) but label them differently. All platform
//! branching lives behind `PlatformProfile`, keyed on the platform enum,
//! so supporting a third platform stays a local change.

use crate::event::{Classification, SourcePlatform};
use crate::feed::extract;

/// Classification and extraction rules for one source platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformProfile {
    pub platform: SourcePlatform,
}

impl PlatformProfile {
    pub fn for_platform(platform: SourcePlatform) -> Self {
        PlatformProfile { platform }
    }

    /// Classify a summary line.
    ///
    /// Reservation and Blocked are mutually exclusive; a label matching
    /// neither vocabulary is Ignored.
    pub fn classify(&self, label: &str) -> Classification {
        let lower = label.to_lowercase();

        match self.platform {
            SourcePlatform::Airbnb => {
                if lower.contains("not available") {
                    Classification::Blocked
                } else if lower.starts_with("reserved") {
                    Classification::Reservation
                } else {
                    Classification::Ignored
                }
            }
            SourcePlatform::Booking => {
                if lower.contains("closed") || lower.contains("not available") {
                    Classification::Blocked
                } else if lower.contains("booked") || lower.contains("reservation") {
                    Classification::Reservation
                } else {
                    Classification::Ignored
                }
            }
            // Without a fingerprint we accept the union of both
            // vocabularies, blocked checks first.
            SourcePlatform::Unknown => {
                if lower.contains("not available")
                    || lower.contains("blocked")
                    || lower.contains("closed")
                {
                    Classification::Blocked
                } else if lower.contains("reserved") || lower.contains("booked") {
                    Classification::Reservation
                } else {
                    Classification::Ignored
                }
            }
        }
    }

    /// Whether this platform ever exposes phone digits in its feed.
    /// Booking never does, so extraction is skipped entirely there.
    pub fn exposes_phone(&self) -> bool {
        !matches!(self.platform, SourcePlatform::Booking)
    }

    /// Best-effort guest name from the label. May legitimately return
    /// None: Booking rarely carries a usable name at all.
    pub fn guest_name(&self, label: &str) -> Option<String> {
        extract::guest_name(label)
    }
}
