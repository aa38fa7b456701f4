//! Feed parsing using the icalendar crate's parser.

use chrono::NaiveDate;
use icalendar::{
    parser::{read_calendar, unfold, Component},
    CalendarDateTime, DatePerhapsTime,
};
use tracing::{debug, warn};

use crate::event::{CanonicalEvent, Classification, SourcePlatform};
use crate::feed::{extract, platform::PlatformProfile};

/// Detect the source platform from feed-level fingerprints.
///
/// Runs once per feed, not per event: Airbnb brands its exports with the
/// marketplace name, Booking feeds carry the booking.com hostname.
pub fn detect_platform(raw: &str) -> SourcePlatform {
    let lower = raw.to_lowercase();
    if lower.contains("airbnb") {
        SourcePlatform::Airbnb
    } else if lower.contains("booking.com") {
        SourcePlatform::Booking
    } else {
        SourcePlatform::Unknown
    }
}

/// Parse a raw feed into canonical events.
///
/// Pure and deterministic: the same text always yields the same events in
/// the same order. Events that cannot be dated, that violate
/// `stay_start < stay_end`, or that match neither the reservation nor the
/// blocked heuristics are dropped here and never reach the delta engine.
pub fn normalize(raw: &str) -> Vec<CanonicalEvent> {
    let platform = detect_platform(raw);
    let profile = PlatformProfile::for_platform(platform);

    let unfolded = unfold(raw);
    let calendar = match read_calendar(&unfolded) {
        Ok(calendar) => calendar,
        Err(err) => {
            warn!(%err, "feed is not readable as a calendar");
            return Vec::new();
        }
    };

    let mut events: Vec<CanonicalEvent> = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| canonical_event(vevent, &profile))
        .collect();

    // Stable order keeps checksums and diffs reproducible across fetches
    events.sort_by(|a, b| {
        a.stay_start
            .cmp(&b.stay_start)
            .then_with(|| a.uid.cmp(&b.uid))
    });
    events
}

fn canonical_event(vevent: &Component, profile: &PlatformProfile) -> Option<CanonicalEvent> {
    let raw_label = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());

    let stay_start = match event_date(vevent, "DTSTART") {
        Some(date) => date,
        None => {
            warn!(label = %raw_label, "dropping event with unparseable start");
            return None;
        }
    };
    let stay_end = match event_date(vevent, "DTEND") {
        Some(date) => date,
        None => {
            warn!(label = %raw_label, "dropping event with unparseable end");
            return None;
        }
    };

    if stay_start >= stay_end {
        warn!(label = %raw_label, %stay_start, %stay_end, "dropping event with inverted stay range");
        return None;
    }

    let classification = profile.classify(&raw_label);
    if classification == Classification::Ignored {
        // Expected and frequent, not an error
        debug!(label = %raw_label, "ignoring unclassifiable event");
        return None;
    }

    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| {
            format!(
                "{}-{}@derived",
                stay_start.format("%Y%m%d"),
                stay_end.format("%Y%m%d")
            )
        });

    let guest_name_guess = if classification == Classification::Reservation {
        profile.guest_name(&raw_label)
    } else {
        None
    };
    let phone_last_four_guess = if profile.exposes_phone() {
        extract::phone_last_four(&raw_label, description.as_deref())
    } else {
        None
    };
    let external_reference_url = description.as_deref().and_then(extract::reference_url);
    let external_reference_id = external_reference_url
        .as_deref()
        .and_then(extract::reference_id);

    // Carry the source properties opaquely for debugging
    let raw_block = vevent
        .properties
        .iter()
        .map(|p| format!("{}:{}", p.name, p.val))
        .collect::<Vec<_>>()
        .join("\n");

    Some(CanonicalEvent {
        uid,
        stay_start,
        stay_end,
        raw_label,
        classification,
        source_platform: profile.platform,
        guest_name_guess,
        phone_last_four_guess,
        external_reference_id,
        external_reference_url,
        raw_block: Some(raw_block),
    })
}

/// Reduce a DTSTART/DTEND property to a calendar date.
///
/// Whole-day values are used as-is: the format already makes the end of a
/// range exclusive, so subtracting a day here would double-adjust.
/// Date-time values only need their time and zone component stripped.
fn event_date(vevent: &Component, prop: &str) -> Option<NaiveDate> {
    let property = vevent.find_prop(prop)?;
    let parsed = DatePerhapsTime::try_from(property).ok()?;
    Some(match parsed {
        DatePerhapsTime::Date(date) => date,
        DatePerhapsTime::DateTime(dt) => match dt {
            CalendarDateTime::Utc(dt) => dt.date_naive(),
            CalendarDateTime::Floating(dt) => dt.date(),
            CalendarDateTime::WithTimezone { date_time, .. } => date_time.date(),
        },
    })
}
