use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Rendition tier produced for every uploaded asset.
///
/// The set is fixed policy; it is never derived from the source video.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum Resolution {
    #[serde(rename = "360")]
    P360,
    #[serde(rename = "1080")]
    P1080,
}

impl Resolution {
    /// Tiers in transcode order.
    pub const ALL: [Resolution; 2] = [Resolution::P360, Resolution::P1080];

    /// Short tag used in object keys and URLs (`360`, `1080`).
    pub fn tag(self) -> &'static str {
        match self {
            Resolution::P360 => "360",
            Resolution::P1080 => "1080",
        }
    }

    pub fn height(self) -> u32 {
        match self {
            Resolution::P360 => 360,
            Resolution::P1080 => 1080,
        }
    }

    pub fn width(self) -> u32 {
        match self {
            Resolution::P360 => 640,
            Resolution::P1080 => 1920,
        }
    }

    pub fn from_height(height: i32) -> Option<Self> {
        match height {
            360 => Some(Resolution::P360),
            1080 => Some(Resolution::P1080),
            _ => None,
        }
    }

    /// Parse a path segment such as `360`, `360p` or `1080P`.
    pub fn parse_tag(value: &str) -> Option<Self> {
        let value = value.trim();
        let digits = value
            .strip_suffix('p')
            .or_else(|| value.strip_suffix('P'))
            .unwrap_or(value);
        digits.parse::<i32>().ok().and_then(Self::from_height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.tag())
    }
}
