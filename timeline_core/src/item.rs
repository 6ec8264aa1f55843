//! Items - the dated, prioritized labels that populate a lane
//!
//! `RawRecord` is what the caller hands in and is never modified. `Item` is
//! the owned value built from it, carrying layout state that is recomputed
//! every frame.

use serde::{Deserialize, Serialize};

use crate::date::{parse_raw_date, ItemDate, RawDate};
use crate::error::RecordError;

/// Kind of playable media attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Playable media source, forwarded untouched to the player collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub start_time: Option<f64>,
}

/// A record as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub date: RawDate,
    /// Occlusion priority; `p` in hand-written data files
    #[serde(default, alias = "p")]
    pub priority: i32,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub media: Option<MediaSource>,
    #[serde(default)]
    pub popup_max_width: Option<String>,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, date: impl Into<RawDate>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            priority: 0,
            detail: None,
            media: None,
            popup_max_width: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_media(mut self, media: MediaSource) -> Self {
        self.media = Some(media);
        self
    }
}

/// Measures label text in pixels
pub trait TextMetrics {
    /// Returns `(width, height)` of a single-line label
    fn measure(&self, text: &str) -> (f64, f64);
}

/// Monospace approximation: fixed advance per character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 16.0,
        }
    }
}

impl TextMetrics for FixedMetrics {
    fn measure(&self, text: &str) -> (f64, f64) {
        (text.chars().count() as f64 * self.char_width, self.line_height)
    }
}

/// One laid-out entry of a lane
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    pub date: ItemDate,
    pub priority: i32,
    pub detail: Option<String>,
    pub media: Option<MediaSource>,
    pub popup_max_width: Option<String>,
    /// Label center in lane-local pixels
    pub screen_y: f64,
    pub width: f64,
    pub height: f64,
    /// Indices (into the lane's item list) of items colliding with this one
    pub overlap_neighbors: Vec<usize>,
    pub hidden: bool,
}

impl Item {
    /// Build an owned item from a raw record; the record is left untouched
    pub fn from_record(
        index: usize,
        record: &RawRecord,
        metrics: &dyn TextMetrics,
    ) -> Result<Self, RecordError> {
        let date = parse_raw_date(&record.date).map_err(|source| RecordError {
            index,
            title: record.title.clone(),
            source,
        })?;
        let (width, height) = metrics.measure(&record.title);

        Ok(Self {
            title: record.title.clone(),
            date,
            priority: record.priority,
            detail: record.detail.clone(),
            media: record.media.clone(),
            popup_max_width: record.popup_max_width.clone(),
            screen_y: 0.0,
            width,
            height,
            overlap_neighbors: Vec::new(),
            hidden: false,
        })
    }

    pub fn is_playable(&self) -> bool {
        self.media.is_some()
    }

    /// Top edge of the label box; labels are vertically centered on `screen_y`
    pub fn top(&self) -> f64 {
        self.screen_y - self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.top() + self.height
    }
}

/// Pixels of vertical overlap between two label boxes (0 when disjoint)
///
/// Measures how far either edge of `b` reaches into `a`, the larger of the two.
pub fn overlap_y(a: &Item, b: &Item) -> f64 {
    let (a_top, a_bottom) = (a.top(), a.bottom());
    let (b_top, b_bottom) = (b.top(), b.bottom());
    let from_top = if b_top >= a_top && b_top < a_bottom {
        a_bottom - b_top
    } else {
        0.0
    };
    let from_bottom = if b_bottom > a_top && b_bottom <= a_bottom {
        b_bottom - a_top
    } else {
        0.0
    };
    from_top.max(from_bottom)
}
