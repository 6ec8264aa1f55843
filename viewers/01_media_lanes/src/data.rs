//! Lane data files
//!
//! A data file is TOML with one `[[lanes]]` table per lane and the lane's
//! records under `[[lanes.records]]`. The built-in demo is compiled in; a
//! path on the command line replaces it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use timeline_core::{LaneOptions, RawRecord};

pub const DEMO_DATA: &str = include_str!("../data/demo.toml");

#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("built-in demo data is invalid: {0}")]
    Demo(#[source] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaneData {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date_range: Option<[NaiveDate; 2]>,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

impl LaneData {
    pub fn options(&self) -> LaneOptions {
        LaneOptions {
            title: self.title.clone(),
            date_range: self.date_range,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataFile {
    #[serde(default)]
    pub lanes: Vec<LaneData>,
}

pub fn parse_data(text: &str) -> Result<DataFile, toml::de::Error> {
    toml::from_str(text)
}

/// Load the data file at `path`, or the built-in demo when `path` is `None`
pub fn load_data(path: Option<&Path>) -> Result<DataFile, DataError> {
    let Some(path) = path else {
        return parse_data(DEMO_DATA).map_err(DataError::Demo);
    };
    let text = fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_data(&text).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_core::RawDate;

    #[test]
    fn test_demo_data_parses() {
        let data = parse_data(DEMO_DATA).unwrap();
        assert_eq!(data.lanes.len(), 2);
        assert_eq!(data.lanes[0].name, "recording");
        assert!(data.lanes[0].records.len() > 10);
        assert!(data.lanes[1].records.iter().any(|r| r.media.is_some()));
    }

    #[test]
    fn test_lane_options_from_data() {
        let data = parse_data(
            r#"
            [[lanes]]
            name = "a"
            date_range = ["1900-01-01", "1950-01-01"]

            [[lanes.records]]
            title = "x"
            date = "1920"
            p = 4
            "#,
        )
        .unwrap();
        let options = data.lanes[0].options();
        assert_eq!(options.title, None);
        assert_eq!(
            options.date_range,
            Some([
                NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(1950, 1, 1).unwrap()
            ])
        );
        assert_eq!(data.lanes[0].records[0].priority, 4);
        assert_eq!(data.lanes[0].records[0].date, RawDate::Text("1920".into()));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = load_data(Some(Path::new("/nonexistent/lanes.toml"))).unwrap_err();
        assert!(matches!(err, DataError::Read { .. }));
        assert!(err.to_string().starts_with("cannot read /nonexistent/lanes.toml"));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("media_lanes_bad_{}.toml", std::process::id()));
        fs::write(&path, "[[lanes]]\nname = \n").unwrap();
        let err = load_data(Some(&path)).unwrap_err();
        fs::remove_file(&path).unwrap();
        match err {
            DataError::Parse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_demo_loads_without_path() {
        assert_eq!(load_data(None).unwrap().lanes.len(), 2);
    }
}
