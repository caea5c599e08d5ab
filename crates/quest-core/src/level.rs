//! XP-to-level curves.
//!
//! A [`LevelCurve`] is pure data: it is loaded from the `app_settings` table
//! and never hard-coded at a call site. Every curve satisfies
//! `level_for(0) == 1` and is non-decreasing in XP.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::setting::keys;
use crate::validation::ValidationError;

/// Upper bound on computed levels; keeps geometric iteration finite.
pub const MAX_LEVEL: i32 = 10_000;

/// Maps accumulated XP to a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelCurve {
    /// Every level costs the same amount of XP.
    Linear { xp_per_level: i64 },
    /// Level `n -> n+1` costs `base * ratio^(n-1)` XP.
    Geometric { base: i64, ratio: f64 },
    /// Cumulative XP needed for levels 2, 3, ... in ascending order.
    Table { thresholds: Vec<i64> },
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::Linear { xp_per_level: 100 }
    }
}

/// A level increase detected between two XP totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub from: i32,
    pub to: i32,
}

/// Position of an XP total within its level, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: i32,
    /// XP earned since reaching `level`.
    pub xp_into_level: i64,
    /// XP still needed for the next level; `None` at the top of a table.
    pub xp_to_next: Option<i64>,
}

impl LevelCurve {
    /// Builds a curve from `app_settings` values.
    ///
    /// Missing keys fall back to the defaults of the linear curve.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let get = |key: &str| settings.get(key).map(|v| v.trim());
        let int = |key: &str, default: i64| -> Result<i64, ValidationError> {
            match get(key) {
                None | Some("") => Ok(default),
                Some(v) => v.parse::<i64>().map_err(|_| ValidationError::InvalidSettingValue {
                    key: key.to_owned(),
                    reason: format!("expected an integer, got {v:?}"),
                }),
            }
        };

        let curve = match get(keys::LEVEL_CURVE).unwrap_or("linear") {
            "linear" | "" => Self::Linear {
                xp_per_level: int(keys::XP_PER_LEVEL, 100)?,
            },
            "geometric" => {
                let ratio = match get(keys::LEVEL_GROWTH) {
                    None | Some("") => 1.5,
                    Some(v) => v.parse::<f64>().map_err(|_| {
                        ValidationError::InvalidSettingValue {
                            key: keys::LEVEL_GROWTH.to_owned(),
                            reason: format!("expected a number, got {v:?}"),
                        }
                    })?,
                };
                Self::Geometric {
                    base: int(keys::LEVEL_BASE_XP, 100)?,
                    ratio,
                }
            }
            "table" => {
                let raw = get(keys::LEVEL_THRESHOLDS).unwrap_or("[]");
                let thresholds: Vec<i64> = serde_json::from_str(raw).map_err(|e| {
                    ValidationError::InvalidSettingValue {
                        key: keys::LEVEL_THRESHOLDS.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                Self::Table { thresholds }
            }
            other => {
                return Err(ValidationError::InvalidSettingValue {
                    key: keys::LEVEL_CURVE.to_owned(),
                    reason: format!("unknown curve {other:?} (expected linear, geometric or table)"),
                });
            }
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Checks that the curve parameters describe a valid, increasing curve.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Linear { xp_per_level } if *xp_per_level <= 0 => Err(
                ValidationError::InvalidCurve(format!("xp_per_level must be positive (got {xp_per_level})")),
            ),
            Self::Geometric { base, .. } if *base <= 0 => Err(ValidationError::InvalidCurve(
                format!("base xp must be positive (got {base})"),
            )),
            Self::Geometric { ratio, .. } if !ratio.is_finite() || *ratio < 1.0 => Err(
                ValidationError::InvalidCurve(format!("growth ratio must be >= 1 (got {ratio})")),
            ),
            Self::Table { thresholds } => {
                let mut prev = 0;
                for &t in thresholds {
                    if t <= prev {
                        return Err(ValidationError::InvalidCurve(format!(
                            "thresholds must be positive and strictly ascending (got {t} after {prev})"
                        )));
                    }
                    prev = t;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Returns the level reached with `total_xp` accumulated XP.
    pub fn level_for(&self, total_xp: i64) -> i32 {
        let xp = total_xp.max(0);
        match self {
            Self::Linear { xp_per_level } => {
                let step = (*xp_per_level).max(1);
                let level = 1 + xp / step;
                level.min(MAX_LEVEL as i64) as i32
            }
            Self::Geometric { base, ratio } => {
                let mut level = 1;
                let mut threshold: i64 = 0;
                let mut cost = (*base).max(1) as f64;
                while level < MAX_LEVEL {
                    threshold = threshold.saturating_add(whole_xp(cost));
                    if threshold > xp {
                        break;
                    }
                    level += 1;
                    cost *= ratio;
                }
                level
            }
            Self::Table { thresholds } => {
                let reached = thresholds.iter().take_while(|&&t| t <= xp).count();
                1 + reached.min((MAX_LEVEL - 1) as usize) as i32
            }
        }
    }

    /// Returns the cumulative XP needed to reach `level`.
    ///
    /// Level 1 always needs 0 XP. For a table curve, levels past the last
    /// threshold are unreachable and return `i64::MAX`.
    pub fn xp_for_level(&self, level: i32) -> i64 {
        self.try_xp_for_level(level).unwrap_or(i64::MAX)
    }

    fn try_xp_for_level(&self, level: i32) -> Option<i64> {
        if level <= 1 {
            return Some(0);
        }
        match self {
            Self::Linear { xp_per_level } => {
                Some(i64::from(level - 1).saturating_mul((*xp_per_level).max(1)))
            }
            Self::Geometric { base, ratio } => {
                let mut total: i64 = 0;
                let mut cost = (*base).max(1) as f64;
                for _ in 1..level {
                    total = total.saturating_add(whole_xp(cost));
                    cost *= ratio;
                }
                Some(total)
            }
            Self::Table { thresholds } => thresholds.get((level - 2) as usize).copied(),
        }
    }

    /// Describes how far `total_xp` is into its current level.
    pub fn progress(&self, total_xp: i64) -> LevelProgress {
        let level = self.level_for(total_xp);
        let floor = self.xp_for_level(level);
        let xp_to_next = if level >= MAX_LEVEL {
            None
        } else {
            self.try_xp_for_level(level + 1)
                .map(|next| next.saturating_sub(total_xp.max(0)))
        };
        LevelProgress {
            level,
            xp_into_level: total_xp.max(0).saturating_sub(floor),
            xp_to_next,
        }
    }
}

/// Rounds a geometric step cost to whole XP, at least 1.
fn whole_xp(cost: f64) -> i64 {
    cost.round().clamp(1.0, i64::MAX as f64) as i64
}

/// Returns the level change between two XP totals, if the level rose.
pub fn detect_level_up(curve: &LevelCurve, xp_before: i64, xp_after: i64) -> Option<LevelUp> {
    let from = curve.level_for(xp_before);
    let to = curve.level_for(xp_after);
    (to > from).then_some(LevelUp { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn linear_default_curve() {
        let curve = LevelCurve::default();
        assert_eq!(curve.level_for(0), 1);
        assert_eq!(curve.level_for(99), 1);
        assert_eq!(curve.level_for(100), 2);
        assert_eq!(curve.level_for(105), 2);
        assert_eq!(curve.level_for(1000), 11);
        assert_eq!(curve.xp_for_level(3), 200);
    }

    #[test]
    fn negative_xp_is_level_one() {
        assert_eq!(LevelCurve::default().level_for(-50), 1);
    }

    #[test]
    fn geometric_curve_grows() {
        let curve = LevelCurve::Geometric {
            base: 100,
            ratio: 2.0,
        };
        assert_eq!(curve.xp_for_level(2), 100);
        assert_eq!(curve.xp_for_level(3), 300);
        assert_eq!(curve.xp_for_level(4), 700);
        assert_eq!(curve.level_for(0), 1);
        assert_eq!(curve.level_for(299), 2);
        assert_eq!(curve.level_for(300), 3);
        assert!(curve.level_for(i64::MAX) <= MAX_LEVEL);
    }

    #[test]
    fn table_curve_caps_at_last_threshold() {
        let curve = LevelCurve::Table {
            thresholds: vec![50, 150, 400],
        };
        assert_eq!(curve.level_for(0), 1);
        assert_eq!(curve.level_for(50), 2);
        assert_eq!(curve.level_for(399), 3);
        assert_eq!(curve.level_for(10_000), 4);
        assert_eq!(curve.progress(10_000).xp_to_next, None);
    }

    #[test]
    fn curves_are_non_decreasing() {
        let curves = [
            LevelCurve::default(),
            LevelCurve::Linear { xp_per_level: 7 },
            LevelCurve::Geometric {
                base: 10,
                ratio: 1.3,
            },
            LevelCurve::Table {
                thresholds: vec![1, 2, 3, 10, 100],
            },
        ];
        for curve in &curves {
            let mut prev = curve.level_for(0);
            assert_eq!(prev, 1);
            for xp in 1..2_000 {
                let level = curve.level_for(xp);
                assert!(level >= prev, "{curve:?} decreased at {xp}");
                prev = level;
            }
        }
    }

    #[test]
    fn detect_level_up_across_boundary() {
        let curve = LevelCurve::default();
        assert_eq!(
            detect_level_up(&curve, 95, 105),
            Some(LevelUp { from: 1, to: 2 })
        );
        assert_eq!(detect_level_up(&curve, 100, 150), None);
    }

    #[test]
    fn progress_within_level() {
        let p = LevelCurve::default().progress(250);
        assert_eq!(
            p,
            LevelProgress {
                level: 3,
                xp_into_level: 50,
                xp_to_next: Some(50),
            }
        );
    }

    #[test]
    fn from_settings_selects_curve() {
        let mut settings = HashMap::new();
        assert_eq!(
            LevelCurve::from_settings(&settings).unwrap(),
            LevelCurve::default()
        );

        settings.insert(keys::LEVEL_CURVE.to_string(), "table".to_string());
        settings.insert(keys::LEVEL_THRESHOLDS.to_string(), "[10, 30]".to_string());
        assert_eq!(
            LevelCurve::from_settings(&settings).unwrap(),
            LevelCurve::Table {
                thresholds: vec![10, 30]
            }
        );
    }

    #[test]
    fn invalid_curves_rejected() {
        assert!(LevelCurve::Linear { xp_per_level: 0 }.validate().is_err());
        assert!(
            LevelCurve::Geometric {
                base: 10,
                ratio: 0.5
            }
            .validate()
            .is_err()
        );
        assert!(
            LevelCurve::Table {
                thresholds: vec![10, 10]
            }
            .validate()
            .is_err()
        );

        let mut settings = HashMap::new();
        settings.insert(keys::LEVEL_CURVE.to_string(), "cubic".to_string());
        assert!(LevelCurve::from_settings(&settings).is_err());
    }
}
