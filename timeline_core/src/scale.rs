//! Scales - mapping between world values and screen pixels
//!
//! Two flavors share the same contract: `LinearScale` maps float years (or
//! any plain number) to pixels, `TimeScale` maps calendar date-times to
//! pixels. Both extrapolate linearly outside their domain.

use chrono::{DateTime, NaiveDateTime};

/// A monotonic, invertible mapping from a world domain to a pixel range
pub trait Scale {
    type Domain;

    fn forward(&self, value: Self::Domain) -> f64;
    fn invert(&self, pixel: f64) -> Self::Domain;
    fn range(&self) -> [f64; 2];
}

/// Linear scale over plain numbers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    /// Identity mapping over `[0, extent]`
    pub fn identity(extent: f64) -> Self {
        Self::new([0.0, extent], [0.0, extent])
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// Shift the domain by `delta` world units
    pub fn shift_domain(&mut self, delta: f64) {
        self.domain = [self.domain[0] + delta, self.domain[1] + delta];
    }

    /// Derive a scale from this one after zooming by `k` and translating by `t`
    ///
    /// The new domain is the world interval this scale shows at pixels
    /// `(range - t) / k`. Always call on the un-zoomed scale: the result does
    /// not depend on any previously rescaled scale.
    pub fn rescaled(&self, k: f64, t: f64) -> Self {
        let domain = [
            self.invert((self.range[0] - t) / k),
            self.invert((self.range[1] - t) / k),
        ];
        Self::new(domain, self.range)
    }

    /// Pixels per world unit
    pub fn density(&self) -> f64 {
        let span = self.domain[1] - self.domain[0];
        if span == 0.0 {
            return 0.0;
        }
        (self.range[1] - self.range[0]) / span
    }

    /// Evenly stepped values covering the domain, starting at a multiple of `step`
    pub fn ticks(&self, step: f64) -> Vec<f64> {
        if !(step > 0.0) {
            return Vec::new();
        }
        let lo = self.domain[0].min(self.domain[1]);
        let hi = self.domain[0].max(self.domain[1]);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

impl Scale for LinearScale {
    type Domain = f64;

    fn forward(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) * (r1 - r0) / (d1 - d0)
    }

    fn invert(&self, pixel: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if r1 == r0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (pixel - r0) * (d1 - d0) / (r1 - r0)
    }

    fn range(&self) -> [f64; 2] {
        self.range
    }
}

/// Linear scale over calendar date-times (millisecond resolution)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: [NaiveDateTime; 2],
    millis: LinearScale,
}

fn to_millis(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64
}

fn from_millis(millis: f64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis.round() as i64).map(|dt| dt.naive_utc())
}

impl TimeScale {
    pub fn new(domain: [NaiveDateTime; 2], range: [f64; 2]) -> Self {
        Self {
            domain,
            millis: LinearScale::new([to_millis(domain[0]), to_millis(domain[1])], range),
        }
    }

    pub fn domain(&self) -> [NaiveDateTime; 2] {
        self.domain
    }

    /// Like `invert`, but `None` when the pixel lies beyond representable dates
    pub fn try_invert(&self, pixel: f64) -> Option<NaiveDateTime> {
        from_millis(self.millis.invert(pixel))
    }
}

impl Scale for TimeScale {
    type Domain = NaiveDateTime;

    fn forward(&self, value: NaiveDateTime) -> f64 {
        self.millis.forward(to_millis(value))
    }

    /// Saturates to the nearest domain edge when the pixel maps past the
    /// representable calendar
    fn invert(&self, pixel: f64) -> NaiveDateTime {
        self.try_invert(pixel).unwrap_or(if pixel < self.millis.range()[0] {
            self.domain[0]
        } else {
            self.domain[1]
        })
    }

    fn range(&self) -> [f64; 2] {
        self.millis.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_linear_round_trip() {
        let scale = LinearScale::new([1850.0, 2050.0], [0.0, 731.0]);
        for v in [1850.0, 1901.25, 1999.999, 2050.0] {
            assert!((scale.invert(scale.forward(v)) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_linear_extrapolates() {
        let scale = LinearScale::new([0.0, 10.0], [0.0, 100.0]);
        assert_eq!(scale.forward(-1.0), -10.0);
        assert_eq!(scale.forward(20.0), 200.0);
        assert_eq!(scale.invert(150.0), 15.0);
    }

    #[test]
    fn test_rescaled_is_anchored_to_base() {
        let base = LinearScale::new([1850.0, 2050.0], [0.0, 800.0]);
        let once = base.rescaled(2.0, -100.0);
        let twice = base.rescaled(2.0, -100.0);
        assert_eq!(once, twice);
        // zoom 2x: a quarter of the base span is hidden above, viewport shows 100 years
        assert!((once.domain()[1] - once.domain()[0] - 100.0).abs() < 1e-9);
        assert!((once.domain()[0] - 1862.5).abs() < 1e-9);
    }

    #[test]
    fn test_ticks() {
        let scale = LinearScale::new([1913.0, 1951.0], [0.0, 100.0]);
        assert_eq!(scale.ticks(10.0), vec![1920.0, 1930.0, 1940.0, 1950.0]);
        assert!(scale.ticks(0.0).is_empty());
    }

    #[test]
    fn test_time_round_trip() {
        let scale = TimeScale::new([dt(1900, 1, 1), dt(1950, 1, 1)], [0.0, 500.0]);
        let v = dt(1932, 8, 17);
        assert_eq!(scale.invert(scale.forward(v)), v);
        assert_eq!(scale.forward(dt(1900, 1, 1)), 0.0);
        assert_eq!(scale.forward(dt(1950, 1, 1)), 500.0);
    }
}
