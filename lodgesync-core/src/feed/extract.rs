//! Best-effort field extraction from feed labels and descriptions.
//!
//! Nothing in here is required for correctness downstream; every helper
//! returns None when the feed doesn't carry the information.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_IN_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{4})\)").expect("valid regex"));

static PHONE_IN_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)phone number \(last 4 digits\):\s*(\d{4})").expect("valid regex")
});

// Backslash ends a match: ICS descriptions carry literal \n escapes
static URL_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"'\\]+"#).expect("valid regex"));

/// Boilerplate label prefixes stripped before treating the remainder as a
/// guest name. Longest first so "reservation" wins over "reserved".
const LABEL_PREFIXES: &[&str] = &["reservation", "reserved", "booked"];

/// Guest name from a label like "Reserved - Jane Doe (4321)".
pub fn guest_name(label: &str) -> Option<String> {
    let without_phone = PHONE_IN_LABEL.replace(label, "");
    let mut rest = without_phone.trim();

    let lower = rest.to_lowercase();
    for prefix in LABEL_PREFIXES {
        if lower.starts_with(prefix) {
            rest = rest[prefix.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == ':' || c == '–');
            break;
        }
    }

    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Last four phone digits: a 4-digit parenthetical in the label first,
/// then the labeled field in the free-text description.
pub fn phone_last_four(label: &str, description: Option<&str>) -> Option<String> {
    if let Some(caps) = PHONE_IN_LABEL.captures(label) {
        return Some(caps[1].to_string());
    }
    description
        .and_then(|d| PHONE_IN_DESCRIPTION.captures(d))
        .map(|caps| caps[1].to_string())
}

/// First well-formed URL in the free text.
pub fn reference_url(text: &str) -> Option<String> {
    URL_IN_TEXT
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')']).to_string())
}

/// Trailing path segment of a reference URL, used as the external id.
pub fn reference_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_name_strips_prefix_and_phone() {
        assert_eq!(
            guest_name("Reserved - Jane Doe (4321)"),
            Some("Jane Doe".to_string())
        );
        assert_eq!(guest_name("Reserved"), None);
        assert_eq!(guest_name("Booked: Ana Martins"), Some("Ana Martins".to_string()));
    }

    #[test]
    fn phone_prefers_label_parenthetical() {
        let desc = "Phone Number (Last 4 Digits): 9999";
        assert_eq!(
            phone_last_four("Reserved - Jane (4321)", Some(desc)),
            Some("4321".to_string())
        );
        assert_eq!(phone_last_four("Reserved", Some(desc)), Some("9999".to_string()));
        assert_eq!(phone_last_four("Reserved", None), None);
    }

    #[test]
    fn reference_url_takes_first_url() {
        let desc = "Reservation URL: https://www.airbnb.com/hosting/reservations/details/HMABC123\nPhone Number (Last 4 Digits): 4321";
        assert_eq!(
            reference_url(desc),
            Some("https://www.airbnb.com/hosting/reservations/details/HMABC123".to_string())
        );
        assert_eq!(reference_url("no links here"), None);
    }

    #[test]
    fn reference_id_is_trailing_segment() {
        assert_eq!(
            reference_id("https://www.airbnb.com/hosting/reservations/details/HMABC123"),
            Some("HMABC123".to_string())
        );
        assert_eq!(
            reference_id("https://example.com/r/42?tab=details"),
            Some("42".to_string())
        );
    }
}
