//! Feed normalization: raw ICS feed text into canonical events.

mod extract;
mod parse;
mod platform;

pub use parse::{detect_platform, normalize};
pub use platform::PlatformProfile;
