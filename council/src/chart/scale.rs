//! Axis scales and tick generation

/// Fallback log domain when a metric has no positive values
pub const LOG_FALLBACK_DOMAIN: (f64, f64) = (0.01, 1.0);

/// Above this many units the x axis switches from integer to "nice" ticks
const MAX_UNIT_TICKS: f64 = 12.0;

/// Linear mapping from a data domain onto a pixel range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    pub fn ticks(&self) -> Vec<f64> {
        linear_ticks(self.domain.0, self.domain.1)
    }
}

/// Base-10 logarithmic mapping; the domain must be strictly positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LogScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a positive value; callers draw non-positive values at the floor
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = (self.domain.0.log10(), self.domain.1.log10());
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value.log10() - d0) / span * (r1 - r0)
    }

    /// Pixel position of the axis floor (the low end of the domain)
    pub fn floor(&self) -> f64 {
        self.range.0
    }

    pub fn ticks(&self) -> Vec<f64> {
        log_ticks(self.domain.0, self.domain.1)
    }
}

/// Rank domain padded by half a unit on each side
pub fn rank_domain(ranks: &[f64]) -> (f64, f64) {
    let finite = ranks.iter().copied().filter(|r| r.is_finite());
    let min = finite.clone().reduce(f64::min);
    let max = finite.reduce(f64::max);
    match (min, max) {
        (Some(min), Some(max)) => (min - 0.5, max + 0.5),
        _ => (0.5, 1.5),
    }
}

/// Log domain over the positive values, padded to 90% / 110%
///
/// Never empty or inverted: with no positive values the fixed fallback
/// range is used.
pub fn log_domain(values: &[f64]) -> (f64, f64) {
    let positive = values.iter().copied().filter(|v| v.is_finite() && *v > 0.0);
    let min = positive.clone().reduce(f64::min);
    let max = positive.reduce(f64::max);
    match (min, max) {
        (Some(min), Some(max)) => (min * 0.9, max * 1.1),
        _ => LOG_FALLBACK_DOMAIN,
    }
}

/// Integer ticks for short domains, 1/2/5 x 10^k steps otherwise
pub fn linear_ticks(lo: f64, hi: f64) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return Vec::new();
    }
    let span = hi - lo;
    let step = if span <= MAX_UNIT_TICKS {
        1.0
    } else {
        nice_step(span / MAX_UNIT_TICKS)
    };

    let mut ticks = Vec::new();
    let mut i = (lo / step).ceil();
    while i * step <= hi + 1e-9 {
        ticks.push(i * step);
        i += 1.0;
    }
    ticks
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude)
}

/// One tick per decade; 2x and 5x sub-ticks when fewer than two decades fit
pub fn log_ticks(lo: f64, hi: f64) -> Vec<f64> {
    if !(lo > 0.0 && hi.is_finite()) || hi < lo {
        return Vec::new();
    }
    let within = |v: f64| v >= lo * (1.0 - 1e-9) && v <= hi * (1.0 + 1e-9);

    let first = lo.log10().floor() as i32;
    let last = hi.log10().ceil() as i32;

    let decades: Vec<f64> = (first..=last)
        .map(|k| 10f64.powi(k))
        .filter(|v| within(*v))
        .collect();
    if decades.len() >= 2 {
        return decades;
    }

    let mut ticks: Vec<f64> = (first..=last)
        .flat_map(|k| [1.0, 2.0, 5.0].map(|m| m * 10f64.powi(k)))
        .filter(|v| within(*v))
        .collect();
    ticks.sort_by(f64::total_cmp);
    ticks
}
