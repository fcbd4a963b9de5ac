//! Request and result types shared by the client and the orchestrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Title shown when the service did not report one.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Duration shown when the service did not report one.
pub const UNKNOWN_DURATION: &str = "--:--";

/// Message shown when a failure carries no usable text.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Check if Backend is running.";

/// Output container requested from the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MediaFormat {
    /// Video with audio, merged into an MP4 container.
    #[default]
    #[serde(rename = "mp4")]
    Video,

    /// Audio only, extracted to MP3.
    #[serde(rename = "mp3")]
    Audio,
}

impl MediaFormat {
    /// Wire name used by the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Video => "mp4",
            MediaFormat::Audio => "mp3",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp4" | "video" => Ok(MediaFormat::Video),
            "mp3" | "audio" => Ok(MediaFormat::Audio),
            other => Err(format!("unknown format '{}' (expected mp4 or mp3)", other)),
        }
    }
}

/// Target video resolution. Ignored by the service for audio requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    /// 2160p.
    #[serde(rename = "4k")]
    Ultra,

    /// 1080p.
    #[default]
    #[serde(rename = "1080p")]
    High,

    /// 720p.
    #[serde(rename = "720p")]
    Medium,

    /// 480p.
    #[serde(rename = "480p")]
    Low,
}

impl Quality {
    /// Wire name used by the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Ultra => "4k",
            Quality::High => "1080p",
            Quality::Medium => "720p",
            Quality::Low => "480p",
        }
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Quality::Ultra => "4K (Ultra HD)",
            Quality::High => "1080p (Full HD)",
            Quality::Medium => "720p (HD)",
            Quality::Low => "480p (SD)",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4k" | "2160p" | "ultra" => Ok(Quality::Ultra),
            "1080p" | "high" => Ok(Quality::High),
            "720p" | "medium" => Ok(Quality::Medium),
            "480p" | "low" => Ok(Quality::Low),
            other => Err(format!(
                "unknown quality '{}' (expected 4k, 1080p, 720p or 480p)",
                other
            )),
        }
    }
}

/// A user's request to convert and download one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Source page URL as typed by the user.
    pub url: String,
    /// Requested output format.
    pub format: MediaFormat,
    /// Requested resolution (video only).
    pub quality: Quality,
}

impl DownloadRequest {
    /// Create a new request.
    pub fn new(url: impl Into<String>, format: MediaFormat, quality: Quality) -> Self {
        Self {
            url: url.into(),
            format,
            quality,
        }
    }

    /// Create a video request at the given quality.
    pub fn video(url: impl Into<String>, quality: Quality) -> Self {
        Self::new(url, MediaFormat::Video, quality)
    }

    /// Create an audio-only request.
    pub fn audio(url: impl Into<String>) -> Self {
        Self::new(url, MediaFormat::Audio, Quality::default())
    }

    /// The URL with surrounding whitespace removed.
    pub fn trimmed_url(&self) -> &str {
        self.url.trim()
    }

    /// Whether this request may start an orchestration cycle.
    pub fn is_submittable(&self) -> bool {
        !self.trimmed_url().is_empty()
    }

    /// Quality that actually affects the result, if any.
    pub fn effective_quality(&self) -> Option<Quality> {
        match self.format {
            MediaFormat::Video => Some(self.quality),
            MediaFormat::Audio => None,
        }
    }
}

/// Metadata returned by the service for a source URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Display form, e.g. "3:45".
    pub duration: Option<String>,
    /// Originating platform. Empty when neither the service nor detection knew.
    pub platform_label: String,
}

impl VideoMetadata {
    /// Title to display, falling back to a placeholder.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_TITLE)
    }

    /// Duration to display, falling back to a placeholder.
    pub fn display_duration(&self) -> &str {
        self.duration
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(UNKNOWN_DURATION)
    }
}

/// Successful result of a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    /// Absolute location the finished file is retrieved from.
    pub retrieval_target: String,
}

/// Which of the two remote calls an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The `/api/info` call.
    Metadata,
    /// The `/api/download` call.
    Download,
}

impl Phase {
    /// Message used when the service supplied nothing better.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Phase::Metadata => "Failed to fetch video info.",
            Phase::Download => "Download failed from server.",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Metadata => write!(f, "metadata"),
            Phase::Download => write!(f, "download"),
        }
    }
}

/// Failure surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub phase: Phase,
}

impl ErrorInfo {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase,
        }
    }

    /// Message to display; never empty.
    pub fn display_message(&self) -> &str {
        if self.message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE
        } else {
            &self.message
        }
    }
}
