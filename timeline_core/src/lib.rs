//! Zoomable multi-lane timeline
//!
//! A `MasterCanvas` owns one vertical time axis shared by any number of
//! side-by-side lanes. Pointer input is normalized into pan/zoom deltas,
//! buffered, and applied once per animation frame; each lane then derives its
//! own clipped date scale, lays out its items and hides labels that collide
//! with higher-priority ones. Hover, click, playback and popup traffic leaves
//! the canvas through channels the host drains.
//!
//! The crate draws nothing itself: a renderer reads lanes, items and axis
//! ticks after each frame.

pub mod canvas;
pub mod config;
pub mod date;
pub mod error;
pub mod events;
pub mod frame;
pub mod gesture;
pub mod item;
pub mod lane;
pub mod occlusion;
pub mod scale;
pub mod zoom;

pub use canvas::{FrameReport, Lifecycle, MasterCanvas};
pub use config::{load_config, save_config, CanvasConfig};
pub use date::{DatePrecision, ItemDate, LabelStyle, RawDate};
pub use error::{ConfigError, DateError, RecordError, TimelineError};
pub use events::{
    canvas_channels, CanvasEmitters, CanvasEvents, HoverEvent, ItemRef, OverlayCommand,
    PlaybackIntent,
};
pub use gesture::{InputEvent, MouseButton, TouchPhase, TouchPoint, WheelDeltaMode};
pub use item::{FixedMetrics, Item, MediaKind, MediaSource, RawRecord, TextMetrics};
pub use lane::{AxisTick, Lane, LaneOptions};
pub use scale::{LinearScale, Scale, TimeScale};
pub use zoom::{Point, ZoomTransform};
