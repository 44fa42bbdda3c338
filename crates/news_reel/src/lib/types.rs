use serde::{Deserialize, Serialize};

/// A single news story's card data, built from the digest and the composer's
/// output. Feeds the overview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    /// Two-digit ordinal shown on the page, e.g. "01".
    pub number: String,
    pub title: String,
    pub summary: String,
}

/// Where a narrated section sits inside the combined audio track.
///
/// `end_ms` includes the trailing silence gap between sections; `audio_ms` is
/// the spoken part only and is what subtitle timing is scaled against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTiming {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub audio_ms: u64,
}

/// Timeline file consumed by the video assembly step. Times are kept as
/// `HH:MM:SS,mmm` strings, same format the subtitle file uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub title: String,
    pub start_seconds: String,
    pub end_seconds: String,
}
