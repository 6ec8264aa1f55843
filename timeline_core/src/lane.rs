//! Lane - one vertical sub-timeline with its own clipped date scale
//!
//! The lane's scale always expresses the part of its configured date range
//! that the master canvas currently shows, so item positions come straight
//! out of it with no further clamping.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::date::{date_to_year_float, year_float_to_date, LabelStyle};
use crate::error::{RecordError, TimelineError};
use crate::item::{Item, RawRecord, TextMetrics};
use crate::occlusion;
use crate::scale::{LinearScale, Scale, TimeScale};
use crate::zoom::Point;

/// Caller-facing options for `MasterCanvas::add_lane`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneOptions {
    #[serde(default)]
    pub title: Option<String>,
    /// Configured `[start, end]` dates of the lane
    #[serde(default)]
    pub date_range: Option<[NaiveDate; 2]>,
}

/// Resolved lane configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LaneConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Offset of the lane from the left edge of the canvas
    pub left: f64,
    /// Offset of item labels from the lane's left edge
    pub events_left: f64,
    pub title: String,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1800, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            left: 0.0,
            events_left: 50.0,
            title: String::new(),
        }
    }
}

/// A tick on one of the lane's axes, `y` in lane-local pixels
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub y: f64,
    pub label: String,
}

/// One lane and its items
#[derive(Debug, Clone)]
pub struct Lane {
    name: String,
    config: LaneConfig,
    items: Vec<Item>,
    by_priority: Vec<usize>,
    rejected: Vec<RecordError>,
    scale: TimeScale,
    /// Screen y of the lane's top edge after clipping
    range_start: f64,
    on_screen: bool,
    overlap_threshold: f64,
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

impl Lane {
    pub fn new(
        name: impl Into<String>,
        config: LaneConfig,
        overlap_threshold: f64,
    ) -> Result<Self, TimelineError> {
        if config.start >= config.end {
            return Err(TimelineError::InvalidDateRange {
                start: config.start.to_string(),
                end: config.end.to_string(),
            });
        }
        let scale = TimeScale::new([midnight(config.start), midnight(config.end)], [0.0, 100.0]);
        Ok(Self {
            name: name.into(),
            config,
            items: Vec::new(),
            by_priority: Vec::new(),
            rejected: Vec::new(),
            scale,
            range_start: 0.0,
            on_screen: true,
            overlap_threshold,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LaneConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn find_item(&self, title: &str) -> Option<usize> {
        self.items.iter().position(|item| item.title == title)
    }

    /// Records rejected by the last data load
    pub fn rejected(&self) -> &[RecordError] {
        &self.rejected
    }

    pub fn scale(&self) -> &TimeScale {
        &self.scale
    }

    pub fn range_start(&self) -> f64 {
        self.range_start
    }

    /// Visible height of the lane in pixels
    pub fn height(&self) -> f64 {
        let [r0, r1] = self.scale.range();
        r1 - r0
    }

    /// False when the configured range lies entirely outside the viewport
    pub fn is_on_screen(&self) -> bool {
        self.on_screen
    }

    /// Dates currently shown by the lane
    pub fn visible_range(&self) -> [NaiveDateTime; 2] {
        self.scale.domain()
    }

    /// Replace all items with ones built from `records`
    ///
    /// Records with unusable dates are skipped and reported through the
    /// returned slice (also kept in `rejected()`).
    pub fn set_data(&mut self, records: &[RawRecord], metrics: &dyn TextMetrics) -> &[RecordError] {
        let mut items = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match Item::from_record(index, record, metrics) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!("lane `{}`: {}", self.name, err);
                    rejected.push(err);
                }
            }
        }

        items.sort_by_key(|item| item.date.value);
        for pair in items.windows(2) {
            if pair[0].title == pair[1].title {
                warn!("lane `{}`: duplicate item title `{}`", self.name, pair[0].title);
            }
        }

        self.by_priority = occlusion::priority_order(&items);
        self.items = items;
        self.rejected = rejected;
        debug!(
            "lane `{}`: loaded {} items, rejected {}",
            self.name,
            self.items.len(),
            self.rejected.len()
        );
        &self.rejected
    }

    /// Rebuild the lane scale from the master canvas's current y scale
    pub fn rescale(&mut self, master: &LinearScale) {
        let max_height = master.range()[1];
        let mut domain_start = midnight(self.config.start);
        let mut domain_end = midnight(self.config.end);
        let mut range_start = master.forward(date_to_year_float(domain_start));
        let mut range_end = master.forward(date_to_year_float(domain_end));

        if range_start < 0.0 {
            domain_start = year_float_to_date(master.invert(0.0)).unwrap_or(domain_start);
            range_start = 0.0;
        }
        if range_end > max_height {
            domain_end = year_float_to_date(master.invert(max_height)).unwrap_or(domain_end);
            range_end = max_height;
        }

        self.on_screen = range_end > range_start;
        let height = (range_end - range_start).max(0.0);
        self.range_start = range_start;
        self.scale = TimeScale::new([domain_start, domain_end], [0.0, height]);
    }

    /// Position every item on the current scale and resolve occlusion
    pub fn update(&mut self) {
        for item in self.items.iter_mut() {
            item.screen_y = self.scale.forward(item.date.datetime());
        }
        occlusion::resolve(&mut self.items, &self.by_priority, self.overlap_threshold);
        if !self.on_screen {
            for item in self.items.iter_mut() {
                item.hidden = true;
            }
        }
    }

    pub fn visible_items(&self) -> impl Iterator<Item = (usize, &Item)> {
        self.items.iter().enumerate().filter(|(_, item)| !item.hidden)
    }

    /// Ticks for the lane's date axis, aligned to the style's year step
    pub fn year_ticks(&self, style: LabelStyle) -> Vec<AxisTick> {
        if !self.on_screen {
            return Vec::new();
        }
        let every = style.tick_every_years();
        let [start, end] = self.scale.domain();
        let mut year = start.year();
        let rem = year.rem_euclid(every);
        if rem != 0 {
            year += every - rem;
        }

        let mut ticks = Vec::new();
        while year <= end.year() {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
                let dt = midnight(date);
                if dt >= start && dt <= end {
                    ticks.push(AxisTick {
                        y: self.scale.forward(dt),
                        label: year.to_string(),
                    });
                }
            }
            year += every;
        }
        ticks
    }

    /// Ticks for the event axis: one per visible item
    pub fn event_ticks(&self, style: LabelStyle) -> Vec<AxisTick> {
        self.visible_items()
            .map(|(_, item)| AxisTick {
                y: item.screen_y,
                label: style.format(&item.date),
            })
            .collect()
    }

    /// Screen y of an item, resolved through the lane's own offset
    pub fn item_screen_y(&self, index: usize) -> Option<f64> {
        self.items.get(index).map(|item| item.screen_y + self.range_start)
    }

    /// Visible item whose label box contains `local`
    ///
    /// `local` is relative to the lane's label origin
    /// (`left + events_left`, `range_start`).
    pub fn hit_test(&self, local: Point) -> Option<usize> {
        self.visible_items()
            .find(|(_, item)| {
                local.x >= 0.0
                    && local.x <= item.width
                    && local.y >= item.top()
                    && local.y <= item.bottom()
            })
            .map(|(index, _)| index)
    }
}

/// Resolve caller options into a lane configuration
pub fn resolve_config(name: &str, options: &LaneOptions, left: f64, events_left: f64) -> LaneConfig {
    let defaults = LaneConfig::default();
    let [start, end] = options.date_range.unwrap_or([defaults.start, defaults.end]);
    LaneConfig {
        start,
        end,
        left,
        events_left,
        title: options.title.clone().unwrap_or_else(|| name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::FixedMetrics;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lane(start: NaiveDate, end: NaiveDate) -> Lane {
        let config = LaneConfig {
            start,
            end,
            ..LaneConfig::default()
        };
        Lane::new("test", config, 4.0).unwrap()
    }

    #[test]
    fn test_clips_to_master_visible_range() {
        let mut lane = lane(ymd(1900, 1, 1), ymd(1950, 1, 1));
        let master = LinearScale::new([1920.0, 1930.0], [0.0, 600.0]);
        lane.rescale(&master);

        assert_eq!(lane.visible_range(), [midnight(ymd(1920, 1, 1)), midnight(ymd(1930, 1, 1))]);
        assert_eq!(lane.range_start(), 0.0);
        assert_eq!(lane.height(), 600.0);
    }

    #[test]
    fn test_unclipped_lane_keeps_config_range() {
        let mut lane = lane(ymd(1900, 1, 1), ymd(1950, 1, 1));
        let master = LinearScale::new([1850.0, 2050.0], [0.0, 800.0]);
        lane.rescale(&master);

        assert_eq!(lane.visible_range(), [midnight(ymd(1900, 1, 1)), midnight(ymd(1950, 1, 1))]);
        assert!((lane.range_start() - 200.0).abs() < 1e-9);
        assert!((lane.height() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_lane_off_screen_hides_items() {
        let mut lane = lane(ymd(1800, 1, 1), ymd(1820, 1, 1));
        lane.set_data(&[RawRecord::new("a", "1810")], &FixedMetrics::default());
        let master = LinearScale::new([1900.0, 2000.0], [0.0, 800.0]);
        lane.rescale(&master);
        lane.update();
        assert!(!lane.is_on_screen());
        assert_eq!(lane.visible_items().count(), 0);
        assert!(lane.year_ticks(LabelStyle::Decades).is_empty());
    }

    #[test]
    fn test_set_data_sorts_and_rejects() {
        let mut lane = lane(ymd(1900, 1, 1), ymd(2000, 1, 1));
        let records = vec![
            RawRecord::new("c", "1985-06-15"),
            RawRecord::new("bad", "not a date"),
            RawRecord::new("a", "1985"),
            RawRecord::new("b", "1985-06"),
        ];
        let rejected = lane.set_data(&records, &FixedMetrics::default());
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].index, 1);

        let titles: Vec<&str> = lane.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_positions_and_event_ticks() {
        let mut lane = lane(ymd(1900, 1, 1), ymd(2000, 1, 1));
        let records = vec![
            RawRecord::new("early", "1910"),
            RawRecord::new("crowded", "1950-01-02"),
            RawRecord::new("important", "1950").with_priority(2),
        ];
        lane.set_data(&records, &FixedMetrics::default());
        lane.rescale(&LinearScale::new([1900.0, 2000.0], [0.0, 1000.0]));
        lane.update();

        let important = lane.find_item("important").unwrap();
        let crowded = lane.find_item("crowded").unwrap();
        assert!((lane.items()[important].screen_y - 500.0).abs() < 1e-6);
        assert!(lane.items()[crowded].hidden);

        let ticks = lane.event_ticks(LabelStyle::Decades);
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["1910", "1950"]);
    }

    #[test]
    fn test_year_ticks() {
        let mut lane = lane(ymd(1903, 5, 1), ymd(1941, 1, 1));
        lane.rescale(&LinearScale::new([1850.0, 2050.0], [0.0, 800.0]));
        let labels: Vec<String> = lane
            .year_ticks(LabelStyle::Decades)
            .into_iter()
            .map(|t| t.label)
            .collect();
        assert_eq!(labels, vec!["1910", "1920", "1930", "1940"]);
    }

    #[test]
    fn test_hit_test_ignores_hidden() {
        let mut lane = lane(ymd(1900, 1, 1), ymd(2000, 1, 1));
        lane.set_data(
            &[RawRecord::new("low", "1950"), RawRecord::new("high", "1950").with_priority(1)],
            &FixedMetrics::default(),
        );
        lane.rescale(&LinearScale::new([1900.0, 2000.0], [0.0, 1000.0]));
        lane.update();
        let y = lane.items()[0].screen_y;
        let hit = lane.hit_test(Point::new(5.0, y)).unwrap();
        assert_eq!(lane.items()[hit].title, "high");
        assert_eq!(lane.hit_test(Point::new(5.0, y + 200.0)), None);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let config = LaneConfig {
            start: ymd(1950, 1, 1),
            end: ymd(1900, 1, 1),
            ..LaneConfig::default()
        };
        assert!(matches!(
            Lane::new("x", config, 4.0),
            Err(TimelineError::InvalidDateRange { .. })
        ));
    }
}
