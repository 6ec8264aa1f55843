//! Frame batching and debouncing
//!
//! Input arrives whenever the host delivers it; layout only runs on the
//! animation-frame tick. `FrameBatcher` holds what arrived in between,
//! `Debouncer` holds a value until its quiet period has elapsed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::warn;

use crate::gesture::GestureDelta;

/// Values that can be folded together when a bounded queue is full
pub trait Coalesce {
    fn coalesce(&mut self, later: &Self);
}

impl Coalesce for GestureDelta {
    fn coalesce(&mut self, later: &Self) {
        self.merge(later);
    }
}

/// Everything collected for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBatch<T> {
    pub items: Vec<T>,
    /// Set when a layout was requested without any input (resize, data load)
    pub forced: bool,
}

/// Bounded per-frame buffer
///
/// At capacity, new values are folded into the newest buffered one instead of
/// being dropped.
#[derive(Debug, Clone)]
pub struct FrameBatcher<T> {
    pending: VecDeque<T>,
    capacity: usize,
    forced: bool,
    coalesced: u64,
}

impl<T: Coalesce> FrameBatcher<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            forced: false,
            coalesced: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.pending.len() >= self.capacity {
            if let Some(last) = self.pending.back_mut() {
                last.coalesce(&value);
                self.coalesced += 1;
                if self.coalesced == 1 || self.coalesced % 100 == 0 {
                    warn!(
                        "frame queue full ({} entries), {} inputs coalesced so far",
                        self.capacity, self.coalesced
                    );
                }
                return;
            }
        }
        self.pending.push_back(value);
    }

    /// Ask for a layout pass on the next frame even if no input arrives
    pub fn request_frame(&mut self) {
        self.forced = true;
    }

    pub fn is_pending(&self) -> bool {
        self.forced || !self.pending.is_empty()
    }

    /// Drain the frame's input, `None` when nothing is due
    pub fn take_frame(&mut self) -> Option<FrameBatch<T>> {
        if !self.is_pending() {
            return None;
        }
        let batch = FrameBatch {
            items: self.pending.drain(..).collect(),
            forced: self.forced,
        };
        self.forced = false;
        Some(batch)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.forced = false;
    }
}

/// Holds the latest scheduled value until `quiet` passes without a new one
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Replace any pending value and restart the quiet window
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// Take the pending value if its quiet window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sum(i32);

    impl Coalesce for Sum {
        fn coalesce(&mut self, later: &Self) {
            self.0 += later.0;
        }
    }

    #[test]
    fn test_one_batch_per_frame() {
        let mut batcher = FrameBatcher::new(16);
        assert!(batcher.take_frame().is_none());
        batcher.push(Sum(1));
        batcher.push(Sum(2));
        batcher.push(Sum(3));
        let batch = batcher.take_frame().unwrap();
        assert_eq!(batch.items, vec![Sum(1), Sum(2), Sum(3)]);
        assert!(!batch.forced);
        assert!(batcher.take_frame().is_none());
    }

    #[test]
    fn test_full_queue_coalesces() {
        let mut batcher = FrameBatcher::new(2);
        for i in 1..=5 {
            batcher.push(Sum(i));
        }
        let batch = batcher.take_frame().unwrap();
        assert_eq!(batch.items, vec![Sum(1), Sum(14)]);
    }

    #[test]
    fn test_full_queue_keeps_each_zoom_anchor() {
        use crate::gesture::ZoomStep;
        use crate::zoom::{Point, ZoomConstraints, ZoomTransform};

        let zoom_at = |factor: f64, y: f64| GestureDelta {
            zoom: Some(ZoomStep { factor, anchor: Point::new(0.0, y) }),
            translate: [0.0, 0.0],
            pan_x: 0.0,
        };
        let steps = [zoom_at(2.0, 100.0), zoom_at(2.0, 500.0)];
        let constraints = ZoomConstraints {
            scale_extent: [0.1, 10.0],
            translate_extent: [[-1e6, -1e6], [1e6, 1e6]],
            viewport: [[0.0, 0.0], [800.0, 600.0]],
        };

        let mut batcher = FrameBatcher::new(1);
        for step in steps {
            batcher.push(step);
        }
        let batch = batcher.take_frame().unwrap();
        assert_eq!(batch.items.len(), 1);

        let expected = steps
            .iter()
            .fold(ZoomTransform::IDENTITY, |t, s| s.apply_to(t, &constraints));
        let folded = batch.items[0].apply_to(ZoomTransform::IDENTITY, &constraints);
        assert_eq!(folded.k, 4.0);
        // 100 then 500 as anchors: y = 2 * (100 * (1 - 2)) + 500 * (1 - 2)
        assert!((expected.y + 700.0).abs() < 1e-9);
        assert!((folded.y - expected.y).abs() < 1e-9);
    }

    #[test]
    fn test_forced_frame_without_input() {
        let mut batcher: FrameBatcher<Sum> = FrameBatcher::new(4);
        batcher.request_frame();
        let batch = batcher.take_frame().unwrap();
        assert!(batch.forced);
        assert!(batch.items.is_empty());
        assert!(batcher.take_frame().is_none());
    }

    #[test]
    fn test_debounce_resets_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(550));
        d.schedule("first", t0);
        assert_eq!(d.poll(t0 + Duration::from_millis(400)), None);
        d.schedule("second", t0 + Duration::from_millis(400));
        assert_eq!(d.poll(t0 + Duration::from_millis(600)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(950)), Some("second"));
        assert_eq!(d.poll(t0 + Duration::from_millis(2000)), None);
    }
}
