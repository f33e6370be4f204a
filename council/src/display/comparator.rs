//! Qualitative indicators for per-model time and cost

use serde::{Deserialize, Serialize};

/// Multipliers over the baseline that bound each indicator level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// `value <= baseline * good` is good
    pub good: f64,
    /// `value <= baseline * fair` is fair; anything above is poor
    pub fair: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            good: 1.2,
            fair: 1.4,
        }
    }
}

/// Three-level comparison against the best value in a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Good,
    Fair,
    Poor,
}

impl Indicator {
    /// Compact marker for inline stats lines
    pub fn glyph(&self) -> &'static str {
        match self {
            Indicator::Good => "🟢",
            Indicator::Fair => "🟡",
            Indicator::Poor => "🔴",
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Indicator::Good => write!(f, "good"),
            Indicator::Fair => write!(f, "fair"),
            Indicator::Poor => write!(f, "poor"),
        }
    }
}

fn classify(value: f64, reference: f64, thresholds: Thresholds) -> Indicator {
    if value <= reference * thresholds.good {
        Indicator::Good
    } else if value <= reference * thresholds.fair {
        Indicator::Fair
    } else {
        Indicator::Poor
    }
}

/// Compare a value with a baseline that is known to be non-zero
///
/// Returns `None` when either side is missing or non-finite. A zero
/// baseline needs the rest of the column to resolve; use
/// [`StatsComparator`] for that case.
pub fn compare(value: Option<f64>, baseline: Option<f64>, thresholds: Thresholds) -> Option<Indicator> {
    let value = value.filter(|v| v.is_finite())?;
    let baseline = baseline.filter(|b| b.is_finite())?;
    if baseline == 0.0 {
        return Some(if value == 0.0 {
            Indicator::Good
        } else {
            Indicator::Poor
        });
    }
    Some(classify(value, baseline, thresholds))
}

/// Indicator source for one metric column (e.g. total time across models)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsComparator {
    baseline: Option<f64>,
    /// Smallest value above zero; the reference when the baseline is zero
    nonzero_floor: Option<f64>,
    thresholds: Thresholds,
}

impl StatsComparator {
    /// Build from every value in the column; missing and non-finite
    /// entries do not participate in the baseline
    pub fn from_values<I>(values: I, thresholds: Thresholds) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let finite: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        let baseline = finite.iter().copied().reduce(f64::min);
        let nonzero_floor = finite
            .iter()
            .copied()
            .filter(|v| *v > 0.0)
            .reduce(f64::min);

        Self {
            baseline,
            nonzero_floor,
            thresholds,
        }
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn indicator(&self, value: Option<f64>) -> Option<Indicator> {
        let value = value.filter(|v| v.is_finite())?;
        let baseline = self.baseline?;
        if baseline != 0.0 {
            return Some(classify(value, baseline, self.thresholds));
        }
        if value == 0.0 {
            return Some(Indicator::Good);
        }
        Some(match self.nonzero_floor {
            Some(floor) => classify(value, floor, self.thresholds),
            None => Indicator::Poor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Thresholds = Thresholds {
        good: 1.2,
        fair: 1.4,
    };

    #[test]
    fn test_boundaries() {
        let baselines = [0.5, 1.0, 3.0, 12.5, 1000.0];
        for baseline in baselines {
            let b = Some(baseline);
            assert_eq!(compare(Some(baseline), b, T), Some(Indicator::Good));
            assert_eq!(compare(Some(baseline * 1.2), b, T), Some(Indicator::Good));

            let eps = baseline * 1e-6;
            assert_eq!(
                compare(Some(baseline * 1.2 + eps), b, T),
                Some(Indicator::Fair)
            );
            assert_eq!(compare(Some(baseline * 1.4), b, T), Some(Indicator::Fair));
            assert_eq!(
                compare(Some(baseline * 1.4 + eps), b, T),
                Some(Indicator::Poor)
            );
        }
    }

    #[test]
    fn test_missing_or_non_finite_yields_none() {
        assert_eq!(compare(None, Some(1.0), T), None);
        assert_eq!(compare(Some(f64::NAN), Some(1.0), T), None);
        assert_eq!(compare(Some(1.0), None, T), None);
        assert_eq!(compare(Some(1.0), Some(f64::INFINITY), T), None);
    }

    #[test]
    fn test_comparator_uses_column_minimum() {
        let cmp = StatsComparator::from_values([Some(10.0), Some(11.5), None, Some(20.0)], T);
        assert_eq!(cmp.baseline(), Some(10.0));
        assert_eq!(cmp.indicator(Some(10.0)), Some(Indicator::Good));
        assert_eq!(cmp.indicator(Some(13.0)), Some(Indicator::Fair));
        assert_eq!(cmp.indicator(Some(20.0)), Some(Indicator::Poor));
        assert_eq!(cmp.indicator(None), None);
    }

    #[test]
    fn test_zero_baseline_falls_back_to_smallest_nonzero() {
        let cmp = StatsComparator::from_values([Some(0.0), Some(2.0), Some(2.6), Some(5.0)], T);
        assert_eq!(cmp.baseline(), Some(0.0));
        assert_eq!(cmp.indicator(Some(0.0)), Some(Indicator::Good));
        assert_eq!(cmp.indicator(Some(2.0)), Some(Indicator::Good));
        assert_eq!(cmp.indicator(Some(2.6)), Some(Indicator::Fair));
        assert_eq!(cmp.indicator(Some(5.0)), Some(Indicator::Poor));
    }

    #[test]
    fn test_all_zero_column() {
        let cmp = StatsComparator::from_values([Some(0.0), Some(0.0)], T);
        assert_eq!(cmp.indicator(Some(0.0)), Some(Indicator::Good));
        assert_eq!(cmp.indicator(Some(0.1)), Some(Indicator::Poor));
    }

    #[test]
    fn test_empty_column_has_no_baseline() {
        let cmp = StatsComparator::from_values(std::iter::empty(), T);
        assert_eq!(cmp.baseline(), None);
        assert_eq!(cmp.indicator(Some(1.0)), None);
    }

    #[test]
    fn test_indicator_display() {
        assert_eq!(Indicator::Good.to_string(), "good");
        assert_eq!(Indicator::Poor.to_string(), "poor");
        assert_ne!(Indicator::Fair.glyph(), Indicator::Good.glyph());
    }
}
