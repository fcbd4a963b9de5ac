//! Source platform detection from a URL.
//!
//! Classifies a URL by case-insensitive matching against an ordered list of
//! domain markers. The first marker that matches wins.
//!
//! # Detection Logic
//!
//! ```text
//! youtube | youtu.be    → YouTube
//! facebook | fb.watch   → Facebook
//! instagram             → Instagram
//! twitter | x.com       → X
//! tiktok                → TikTok
//! snapchat              → Snapchat
//! (nothing)             → Unknown
//! ```
//!
//! Brand names match anywhere in the string. Short-link domains only match at
//! a host boundary, so `netflix.com` is not mistaken for `x.com`.

use std::fmt;

/// Platform a URL originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    YouTube,
    Facebook,
    Instagram,
    /// Formerly Twitter.
    X,
    TikTok,
    Snapchat,
    /// No marker matched.
    #[default]
    Unknown,
}

impl Platform {
    /// Short label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::X => "X",
            Platform::TikTok => "TikTok",
            Platform::Snapchat => "Snapchat",
            Platform::Unknown => "Unknown",
        }
    }

    /// Whether this is a recognised platform.
    pub fn is_known(&self) -> bool {
        !matches!(self, Platform::Unknown)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a marker is compared against the lowercased URL.
#[derive(Debug, Clone, Copy)]
enum Marker {
    /// Matches anywhere.
    Keyword(&'static str),
    /// Matches only at the start of a host label.
    Domain(&'static str),
}

impl Marker {
    fn matches(&self, haystack: &str) -> bool {
        match *self {
            Marker::Keyword(needle) => haystack.contains(needle),
            Marker::Domain(needle) => haystack
                .match_indices(needle)
                .any(|(idx, _)| at_host_boundary(haystack, idx)),
        }
    }
}

/// Ordered marker table. Order matters: first match wins.
const MARKERS: &[(Marker, Platform)] = &[
    (Marker::Keyword("youtube"), Platform::YouTube),
    (Marker::Domain("youtu.be"), Platform::YouTube),
    (Marker::Keyword("facebook"), Platform::Facebook),
    (Marker::Domain("fb.watch"), Platform::Facebook),
    (Marker::Keyword("instagram"), Platform::Instagram),
    (Marker::Keyword("twitter"), Platform::X),
    (Marker::Domain("x.com"), Platform::X),
    (Marker::Keyword("tiktok"), Platform::TikTok),
    (Marker::Keyword("snapchat"), Platform::Snapchat),
];

fn at_host_boundary(haystack: &str, idx: usize) -> bool {
    idx == 0
        || matches!(
            haystack.as_bytes().get(idx - 1),
            Some(b'/') | Some(b'.') | Some(b'@')
        )
}

/// Detect the platform a URL belongs to.
///
/// Never fails; anything unrecognised is [`Platform::Unknown`].
pub fn detect(url: &str) -> Platform {
    let lowered = url.to_lowercase();
    MARKERS
        .iter()
        .find(|(marker, _)| marker.matches(&lowered))
        .map(|(_, platform)| *platform)
        .unwrap_or_default()
}
