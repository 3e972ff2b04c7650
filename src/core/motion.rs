//! Per-point drift animation.
//!
//! Every point runs an endless chain of eased tweens: from where it is to a
//! random offset within `jitter_radius` of its origin, over a random
//! duration. When one tween completes the next one starts at the completion
//! instant, so chains never stall and never recurse.
//!
//! All tweens advance on one clock supplied by the host (milliseconds).
//! A [`MotionDriver`] is bound to the generation of the field it was started
//! for; once the field is replaced, the driver refuses to write into it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::field::{Field, Vec2};
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Easing {
    Linear,
    SineInOut,
    /// Circular ease-in-out: slow start, quick middle, slow landing.
    #[default]
    CircInOut,
}

impl Easing {
    /// Map progress `t` in `[0, 1]` onto eased progress in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::SineInOut => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::CircInOut => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
        }
    }
}

/// One leg of a point's drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub start_ms: f64,
    pub duration_ms: f64,
    pub from: Vec2,
    pub to: Vec2,
}

impl Tween {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Position at `now_ms`. Before the start it is `from`, after the end `to`.
    pub fn sample(&self, now_ms: f64, easing: Easing) -> Vec2 {
        let t = if self.duration_ms > 0.0 {
            (now_ms - self.start_ms) / self.duration_ms
        } else {
            1.0
        };
        let e = easing.apply(t);
        Vec2::new(
            self.from.x + (self.to.x - self.from.x) * e,
            self.from.y + (self.to.y - self.from.y) * e,
        )
    }
}

/// Drives every point of one field generation.
#[derive(Debug, Clone)]
pub struct MotionDriver {
    generation: Option<u64>,
    tweens: Vec<Tween>,
    rng: Prng,
    jitter_radius: f64,
    duration_s: (f64, f64),
    easing: Easing,
}

impl MotionDriver {
    pub fn new(cfg: &FieldConfig, rng: Prng) -> Self {
        Self {
            generation: None,
            tweens: Vec::new(),
            rng,
            jitter_radius: cfg.jitter_radius,
            duration_s: cfg.tween_duration_s,
            easing: cfg.easing,
        }
    }

    /// Generation this driver is bound to, if running.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.generation.is_some()
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Bind to `field` and start one tween per point from its current position.
    /// Any previous tweens are dropped first.
    pub fn start(&mut self, field: &Field, now_ms: f64) {
        self.cancel_all();
        self.tweens.reserve(field.len());
        for p in &field.points {
            let tween = self.next_tween(p.pos(), p.origin(), now_ms);
            self.tweens.push(tween);
        }
        self.generation = Some(field.generation);
    }

    /// Drop every in-flight tween. The driver writes nothing until restarted.
    pub fn cancel_all(&mut self) {
        self.tweens.clear();
        self.generation = None;
    }

    /// Move every point to its position at `now_ms`, chaining new tweens for
    /// those that completed. Returns how many tweens were restarted.
    ///
    /// A driver bound to another generation (or cancelled) leaves the field
    /// untouched.
    pub fn advance(&mut self, field: &mut Field, now_ms: f64) -> usize {
        if self.generation != Some(field.generation) || self.tweens.len() != field.len() {
            return 0;
        }

        let easing = self.easing;
        let mut restarted = 0;
        for i in 0..self.tweens.len() {
            let origin = field.points[i].origin();
            let mut tween = self.tweens[i];

            if now_ms >= tween.end_ms() {
                // A long stall (hidden tab) can skip many legs; only the
                // last one matters, so restart from the landing point now.
                let start = if now_ms - tween.end_ms() > tween.duration_ms {
                    now_ms
                } else {
                    tween.end_ms()
                };
                tween = self.next_tween(tween.to, origin, start);
                while now_ms >= tween.end_ms() && tween.duration_ms > 0.0 {
                    tween = self.next_tween(tween.to, origin, tween.end_ms());
                }
                self.tweens[i] = tween;
                restarted += 1;
            }

            let pos = tween.sample(now_ms, easing);
            let p = &mut field.points[i];
            p.x = pos.x;
            p.y = pos.y;
        }
        restarted
    }

    fn next_tween(&mut self, from: Vec2, origin: Vec2, start_ms: f64) -> Tween {
        let r = self.jitter_radius;
        let to = Vec2::new(
            origin.x + self.rng.gen_range_f64(-r, r),
            origin.y + self.rng.gen_range_f64(-r, r),
        );
        let duration_ms = self.rng.gen_range_f64(self.duration_s.0, self.duration_s.1) * 1000.0;
        Tween {
            start_ms,
            duration_ms,
            from,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(generation: u64) -> Field {
        let cfg = FieldConfig::default();
        Field::generate(800.0, 600.0, &cfg, &mut Prng::new(21), generation)
    }

    #[test]
    fn easing_endpoints_and_monotonic() {
        for e in [Easing::Linear, Easing::SineInOut, Easing::CircInOut] {
            assert!(e.apply(0.0).abs() < 1e-12);
            assert!((e.apply(1.0) - 1.0).abs() < 1e-12);
            assert!((e.apply(0.5) - 0.5).abs() < 1e-12);
            let mut prev = 0.0;
            for i in 1..=100 {
                let v = e.apply(i as f64 / 100.0);
                assert!(v >= prev);
                prev = v;
            }
        }
        assert_eq!(Easing::CircInOut.apply(-1.0), 0.0);
        assert_eq!(Easing::CircInOut.apply(2.0), 1.0);
    }

    #[test]
    fn tweens_respect_jitter_and_duration() {
        let cfg = FieldConfig::default();
        let f = field(1);
        let mut driver = MotionDriver::new(&cfg, Prng::new(8));
        driver.start(&f, 0.0);

        assert_eq!(driver.tweens().len(), f.len());
        for (t, p) in driver.tweens().iter().zip(&f.points) {
            assert!((t.to.x - p.origin_x).abs() <= 50.0);
            assert!((t.to.y - p.origin_y).abs() <= 50.0);
            assert!(t.duration_ms >= 2000.0 && t.duration_ms < 4000.0);
            assert_eq!(t.from, p.pos());
        }
    }

    #[test]
    fn points_stay_within_jitter_over_time() {
        let cfg = FieldConfig::default();
        let mut f = field(1);
        let mut driver = MotionDriver::new(&cfg, Prng::new(8));
        driver.start(&f, 0.0);

        let mut restarted = 0;
        let mut now = 0.0;
        while now < 20_000.0 {
            restarted += driver.advance(&mut f, now);
            for p in &f.points {
                assert!((p.x - p.origin_x).abs() <= 50.0 + 1e-9);
                assert!((p.y - p.origin_y).abs() <= 50.0 + 1e-9);
            }
            now += 16.0;
        }
        // 20s with legs of at most 4s: every point chained at least 4 times.
        assert!(restarted >= 4 * f.len());
    }

    #[test]
    fn completed_tween_lands_on_target_and_chains() {
        let cfg = FieldConfig::default();
        let mut f = field(1);
        let mut driver = MotionDriver::new(&cfg, Prng::new(2));
        driver.start(&f, 0.0);

        let first = driver.tweens()[0];
        let restarted = driver.advance(&mut f, first.end_ms());
        assert!(restarted >= 1);

        let next = driver.tweens()[0];
        assert_eq!(next.from, first.to);
        assert_eq!(next.start_ms, first.end_ms());
        assert_eq!(f.points[0].pos(), first.to);
    }

    #[test]
    fn stale_driver_never_writes_new_field() {
        let cfg = FieldConfig::default();
        let old = field(1);
        let mut driver = MotionDriver::new(&cfg, Prng::new(4));
        driver.start(&old, 0.0);

        let mut new_field = field(2);
        let before = new_field.clone();
        assert_eq!(driver.advance(&mut new_field, 3000.0), 0);
        assert_eq!(new_field, before);

        driver.cancel_all();
        let mut same_gen = old.clone();
        let snapshot = same_gen.clone();
        assert_eq!(driver.advance(&mut same_gen, 3000.0), 0);
        assert_eq!(same_gen, snapshot);
        assert!(!driver.is_running());
    }

    #[test]
    fn long_stall_restarts_from_now() {
        let cfg = FieldConfig::default();
        let mut f = field(1);
        let mut driver = MotionDriver::new(&cfg, Prng::new(6));
        driver.start(&f, 0.0);

        driver.advance(&mut f, 60_000.0);
        for t in driver.tweens() {
            assert_eq!(t.start_ms, 60_000.0);
        }
    }
}
