#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::motion::Easing;
use crate::viewport::{Activation, FocalPolicy};

/// Smallest accepted cell size in CSS pixels. The neighbour build is
/// quadratic in the point count, so denser grids are rejected.
pub const MIN_SPACING: f64 = 10.0;

/// Largest accepted `n` for [`SpacingPolicy::Fraction`].
pub const MAX_DIVISIONS: u32 = 200;

/// How far apart grid cells are, as a function of the viewport.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum SpacingPolicy {
    /// Square cells. The first breakpoint whose width bound exceeds the
    /// viewport width wins; otherwise `fallback`.
    Breakpoints {
        /// `(max_width_exclusive, spacing)` pairs, ascending by width.
        steps: Vec<(f64, f64)>,
        fallback: f64,
    },
    /// `width / n` by `height / n` cells, i.e. an `n x n` grid at any size.
    Fraction { divisions: u32 },
}

impl SpacingPolicy {
    /// `<768 -> 100`, `<1200 -> 90`, else `80`.
    pub fn responsive() -> Self {
        Self::Breakpoints {
            steps: vec![(768.0, 100.0), (1200.0, 90.0)],
            fallback: 80.0,
        }
    }

    /// Denser variant: `<768 -> 80`, `<1200 -> 70`, else `60`.
    pub fn dense() -> Self {
        Self::Breakpoints {
            steps: vec![(768.0, 80.0), (1200.0, 70.0)],
            fallback: 60.0,
        }
    }

    /// Cell size `(sx, sy)` for a viewport.
    pub fn cell_size(&self, width: f64, height: f64) -> (f64, f64) {
        match self {
            Self::Breakpoints { steps, fallback } => {
                let s = steps
                    .iter()
                    .find(|(bound, _)| width < *bound)
                    .map(|&(_, s)| s)
                    .unwrap_or(*fallback);
                (s, s)
            }
            Self::Fraction { divisions: 0 } => (0.0, 0.0),
            Self::Fraction { divisions } => {
                let n = *divisions as f64;
                (width / n, height / n)
            }
        }
    }

    fn validate(&self) -> Result<(), FieldError> {
        match self {
            Self::Breakpoints { steps, fallback } => {
                if !(*fallback >= MIN_SPACING) || steps.iter().any(|&(_, s)| !(s >= MIN_SPACING)) {
                    return Err(FieldError::InvalidConfig("spacing must be >= 10 px"));
                }
                if steps.windows(2).any(|w| w[0].0 >= w[1].0) {
                    return Err(FieldError::InvalidConfig(
                        "spacing breakpoints must be strictly ascending",
                    ));
                }
                Ok(())
            }
            Self::Fraction { divisions: 0 } => {
                Err(FieldError::InvalidConfig("spacing divisions must be > 0"))
            }
            Self::Fraction { divisions } if *divisions > MAX_DIVISIONS => {
                Err(FieldError::InvalidConfig("spacing divisions must be <= 200"))
            }
            Self::Fraction { .. } => Ok(()),
        }
    }
}

impl Default for SpacingPolicy {
    fn default() -> Self {
        Self::responsive()
    }
}

/// Squared-distance tiers mapping proximity to the focal target onto
/// line and dot opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpacityTiers {
    /// Exclusive upper bounds, ascending.
    pub thresholds: [f64; 3],
    pub line: [f64; 3],
    pub dot: [f64; 3],
}

impl Default for OpacityTiers {
    fn default() -> Self {
        Self {
            thresholds: [4000.0, 20000.0, 40000.0],
            line: [0.3, 0.1, 0.02],
            dot: [0.6, 0.3, 0.1],
        }
    }
}

impl OpacityTiers {
    /// `(line, dot)` opacity for a squared distance. Beyond the last
    /// threshold the point is invisible.
    pub fn tier(&self, dist_sq: f64) -> (f64, f64) {
        let d = dist_sq.abs();
        self.thresholds
            .iter()
            .position(|&t| d < t)
            .map(|i| (self.line[i], self.dot[i]))
            .unwrap_or((0.0, 0.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FieldConfig {
    pub spacing: SpacingPolicy,
    /// Lines drawn per point.
    pub neighbor_count: usize,
    /// Max drift from the anchor on each axis.
    pub jitter_radius: f64,
    /// Tween duration range in seconds, `[min, max)`.
    pub tween_duration_s: (f64, f64),
    pub easing: Easing,
    pub opacity: OpacityTiers,
    /// Dot radius range, `[min, max)`.
    pub dot_radius: (f64, f64),
    /// Width changes smaller than this do not rebuild the field.
    pub resize_debounce: f64,
    /// Shadow blur for lines; 0 disables the glow.
    pub glow_blur: f64,
    pub activation: Activation,
    pub focal: FocalPolicy,
    /// Fixed seed for reproducible fields. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            spacing: SpacingPolicy::responsive(),
            neighbor_count: 5,
            jitter_radius: 50.0,
            tween_duration_s: (2.0, 4.0),
            easing: Easing::CircInOut,
            opacity: OpacityTiers::default(),
            dot_radius: (2.0, 4.0),
            resize_debounce: 50.0,
            glow_blur: 6.0,
            activation: Activation::Always,
            focal: FocalPolicy::Center,
            seed: None,
        }
    }
}

impl FieldConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_spacing(mut self, spacing: SpacingPolicy) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_neighbor_count(mut self, n: usize) -> Self {
        self.neighbor_count = n;
        self
    }

    pub fn with_jitter(mut self, radius: f64) -> Self {
        self.jitter_radius = radius;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_focal(mut self, focal: FocalPolicy) -> Self {
        self.focal = focal;
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.spacing.validate()?;
        if self.neighbor_count == 0 {
            return Err(FieldError::InvalidConfig("neighbor_count must be > 0"));
        }
        if !(self.jitter_radius >= 0.0) {
            return Err(FieldError::InvalidConfig("jitter_radius must be >= 0"));
        }
        let (lo, hi) = self.tween_duration_s;
        if !(lo > 0.0) || hi < lo {
            return Err(FieldError::InvalidConfig(
                "tween_duration_s must satisfy 0 < min <= max",
            ));
        }
        let (rlo, rhi) = self.dot_radius;
        if !(rlo >= 0.0) || rhi < rlo {
            return Err(FieldError::InvalidConfig(
                "dot_radius must satisfy 0 <= min <= max",
            ));
        }
        let t = self.opacity.thresholds;
        if !(t[0] < t[1] && t[1] < t[2]) {
            return Err(FieldError::InvalidConfig(
                "opacity thresholds must be strictly ascending",
            ));
        }
        if !(self.resize_debounce >= 0.0) {
            return Err(FieldError::InvalidConfig("resize_debounce must be >= 0"));
        }
        if !(self.glow_blur >= 0.0) {
            return Err(FieldError::InvalidConfig("glow_blur must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responsive_spacing_breakpoints() {
        let p = SpacingPolicy::responsive();
        assert_eq!(p.cell_size(767.0, 500.0), (100.0, 100.0));
        assert_eq!(p.cell_size(768.0, 500.0), (90.0, 90.0));
        assert_eq!(p.cell_size(1199.0, 500.0), (90.0, 90.0));
        assert_eq!(p.cell_size(1920.0, 500.0), (80.0, 80.0));

        let d = SpacingPolicy::dense();
        assert_eq!(d.cell_size(500.0, 500.0), (80.0, 80.0));
        assert_eq!(d.cell_size(2000.0, 500.0), (60.0, 60.0));
    }

    #[test]
    fn fraction_spacing_scales_with_viewport() {
        let p = SpacingPolicy::Fraction { divisions: 20 };
        assert_eq!(p.cell_size(1000.0, 600.0), (50.0, 30.0));
        let empty = SpacingPolicy::Fraction { divisions: 0 };
        assert_eq!(empty.cell_size(1000.0, 600.0), (0.0, 0.0));
    }

    #[test]
    fn opacity_tier_boundaries_are_exclusive() {
        let tiers = OpacityTiers::default();
        assert_eq!(tiers.tier(3999.0), (0.3, 0.6));
        assert_eq!(tiers.tier(4000.0), (0.1, 0.3));
        assert_eq!(tiers.tier(19999.0), (0.1, 0.3));
        assert_eq!(tiers.tier(20000.0), (0.02, 0.1));
        assert_eq!(tiers.tier(40000.0), (0.0, 0.0));
        assert_eq!(tiers.tier(40001.0), (0.0, 0.0));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(FieldConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = FieldConfig::default().with_neighbor_count(0);
        assert!(matches!(cfg.validate(), Err(FieldError::InvalidConfig(_))));

        let mut cfg = FieldConfig::default();
        cfg.tween_duration_s = (3.0, 1.0);
        assert!(cfg.validate().is_err());

        let mut cfg = FieldConfig::default();
        cfg.opacity.thresholds = [4000.0, 4000.0, 40000.0];
        assert!(cfg.validate().is_err());

        let cfg = FieldConfig::default().with_spacing(SpacingPolicy::Breakpoints {
            steps: vec![(1200.0, 90.0), (768.0, 100.0)],
            fallback: 80.0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_caps_point_density() {
        let cfg = FieldConfig::default().with_spacing(SpacingPolicy::Fraction {
            divisions: 1_000_000,
        });
        assert!(matches!(cfg.validate(), Err(FieldError::InvalidConfig(_))));
        let cfg = FieldConfig::default().with_spacing(SpacingPolicy::Fraction {
            divisions: MAX_DIVISIONS,
        });
        assert!(cfg.validate().is_ok());

        let tiny = |s: f64| {
            FieldConfig::default().with_spacing(SpacingPolicy::Breakpoints {
                steps: vec![(768.0, s)],
                fallback: 80.0,
            })
        };
        assert!(tiny(0.001).validate().is_err());
        assert!(tiny(f64::NAN).validate().is_err());
        assert!(tiny(MIN_SPACING).validate().is_ok());

        let cfg = FieldConfig::default().with_spacing(SpacingPolicy::Breakpoints {
            steps: vec![],
            fallback: 9.5,
        });
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn oversized_json_grid_is_rejected() {
        let cfg: FieldConfig =
            serde_json::from_str(r#"{ "spacing": { "kind": "fraction", "divisions": 1000000 } }"#)
                .unwrap();
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_config_fills_defaults() {
        let cfg: FieldConfig =
            serde_json::from_str(r#"{ "neighbor_count": 3, "seed": 9 }"#).unwrap();
        assert_eq!(cfg.neighbor_count, 3);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.jitter_radius, 50.0);
        assert_eq!(cfg.spacing, SpacingPolicy::responsive());
    }
}
