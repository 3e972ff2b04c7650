//! Viewport adapter: turns host notifications (resize, theme, scroll,
//! pointer) into engine decisions.
//!
//! The host never touches the field directly. It reports what changed and
//! the adapter decides whether that warrants a rebuild, a surface resize,
//! or just a new value read by the next frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::field::Vec2;
use crate::render::Theme;

/// When the render loop performs visible work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activation {
    #[default]
    Always,
    /// Draw only while the page is scrolled less than one viewport height.
    WithinFirstViewport,
}

/// What the field fades towards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FocalPolicy {
    /// Fixed at the viewport centre.
    #[default]
    Center,
    /// Follows the last reported pointer position.
    Pointer,
}

/// Explicit host state read by the engine each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// CSS pixels.
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
    pub theme: Theme,
    pub scroll_y: f64,
    pub pointer: Option<Vec2>,
}

impl Environment {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
            theme: Theme::Light,
            scroll_y: 0.0,
            pointer: None,
        }
    }

    pub fn with_dpr(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn backing_store(&self) -> BackingStore {
        BackingStore::for_viewport(self.width, self.height, self.device_pixel_ratio)
    }
}

/// Pixel size of the drawing surface's backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BackingStore {
    pub width: u32,
    pub height: u32,
}

impl BackingStore {
    /// CSS size scaled by the device pixel ratio. A missing or bogus ratio
    /// counts as 1.
    pub fn for_viewport(width: f64, height: f64, dpr: f64) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        Self {
            width: (width.max(0.0) * dpr).round() as u32,
            height: (height.max(0.0) * dpr).round() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Nothing relevant changed.
    Ignored,
    /// Surface must be resized; the field is kept.
    Resized,
    /// Width moved past the debounce threshold; the field must be rebuilt.
    Regenerate,
}

#[derive(Debug, Clone)]
pub struct ViewportAdapter {
    env: Environment,
    /// Width the current field was generated for.
    built_width: f64,
    resize_debounce: f64,
    activation: Activation,
    focal: FocalPolicy,
}

impl ViewportAdapter {
    pub fn new(
        env: Environment,
        resize_debounce: f64,
        activation: Activation,
        focal: FocalPolicy,
    ) -> Self {
        Self {
            env,
            built_width: env.width,
            resize_debounce,
            activation,
            focal,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn built_width(&self) -> f64 {
        self.built_width
    }

    /// Width deltas below the debounce threshold, measured against the width
    /// of the last rebuild, never rebuild the field. Any other size or
    /// pixel-ratio change still resizes the surface to the live viewport.
    pub fn on_resize(&mut self, width: f64, height: f64, dpr: f64) -> ResizeOutcome {
        let unchanged = width == self.env.width
            && height == self.env.height
            && dpr == self.env.device_pixel_ratio;
        self.env.width = width;
        self.env.height = height;
        self.env.device_pixel_ratio = dpr;

        if (width - self.built_width).abs() >= self.resize_debounce {
            self.built_width = width;
            ResizeOutcome::Regenerate
        } else if unchanged {
            ResizeOutcome::Ignored
        } else {
            ResizeOutcome::Resized
        }
    }

    /// Returns true if the theme actually changed.
    pub fn on_theme(&mut self, theme: Theme) -> bool {
        let changed = self.env.theme != theme;
        self.env.theme = theme;
        changed
    }

    pub fn on_scroll(&mut self, scroll_y: f64) {
        self.env.scroll_y = scroll_y;
    }

    pub fn on_pointer(&mut self, x: f64, y: f64) {
        self.env.pointer = Some(Vec2::new(x, y));
    }

    pub fn on_pointer_leave(&mut self) {
        self.env.pointer = None;
    }

    pub fn should_animate(&self) -> bool {
        match self.activation {
            Activation::Always => true,
            Activation::WithinFirstViewport => self.env.scroll_y <= self.env.height,
        }
    }

    /// Current focal target: the pointer under [`FocalPolicy::Pointer`] when
    /// one has been reported, otherwise the viewport centre.
    pub fn focal_point(&self) -> Vec2 {
        match (self.focal, self.env.pointer) {
            (FocalPolicy::Pointer, Some(p)) => p,
            _ => Vec2::new(self.env.width / 2.0, self.env.height / 2.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ViewportAdapter {
        ViewportAdapter::new(
            Environment::new(1000.0, 800.0),
            50.0,
            Activation::Always,
            FocalPolicy::Center,
        )
    }

    #[test]
    fn small_width_changes_resize_without_rebuild() {
        let mut va = adapter();
        assert_eq!(va.on_resize(1049.0, 800.0, 1.0), ResizeOutcome::Resized);
        assert_eq!(va.environment().width, 1049.0);
        assert_eq!(va.on_resize(951.0, 800.0, 1.0), ResizeOutcome::Resized);
        assert_eq!(va.on_resize(951.0, 800.0, 1.0), ResizeOutcome::Ignored);
        // The debounce still measures against the width the field was built for.
        assert_eq!(va.built_width(), 1000.0);
        assert_eq!(va.environment().backing_store().width, 951);
    }

    #[test]
    fn debounce_threshold_is_inclusive() {
        let mut va = adapter();
        assert_eq!(va.on_resize(1050.0, 800.0, 1.0), ResizeOutcome::Regenerate);
        assert_eq!(va.built_width(), 1050.0);
        // Deltas are measured against the last regeneration, not the last event.
        assert_eq!(va.on_resize(1090.0, 800.0, 1.0), ResizeOutcome::Resized);
        assert_eq!(va.on_resize(1100.0, 800.0, 1.0), ResizeOutcome::Regenerate);
        assert_eq!(va.on_resize(1080.0, 800.0, 1.0), ResizeOutcome::Resized);
        assert_eq!(va.on_resize(1060.0, 800.0, 1.0), ResizeOutcome::Resized);
        assert_eq!(va.on_resize(1050.0, 800.0, 1.0), ResizeOutcome::Regenerate);
    }

    #[test]
    fn height_or_dpr_change_resizes_without_rebuild() {
        let mut va = adapter();
        assert_eq!(va.on_resize(1000.0, 600.0, 1.0), ResizeOutcome::Resized);
        assert_eq!(va.on_resize(1000.0, 600.0, 2.0), ResizeOutcome::Resized);
        assert_eq!(va.environment().backing_store(), BackingStore { width: 2000, height: 1200 });
    }

    #[test]
    fn backing_store_handles_bad_ratio() {
        assert_eq!(
            BackingStore::for_viewport(375.0, 667.0, 0.0),
            BackingStore { width: 375, height: 667 }
        );
        assert_eq!(
            BackingStore::for_viewport(375.0, 667.0, 1.5),
            BackingStore { width: 563, height: 1001 }
        );
    }

    #[test]
    fn scroll_activation_policy() {
        let mut va = ViewportAdapter::new(
            Environment::new(1000.0, 800.0),
            50.0,
            Activation::WithinFirstViewport,
            FocalPolicy::Center,
        );
        assert!(va.should_animate());
        va.on_scroll(800.0);
        assert!(va.should_animate());
        va.on_scroll(801.0);
        assert!(!va.should_animate());

        let mut always = adapter();
        always.on_scroll(10_000.0);
        assert!(always.should_animate());
    }

    #[test]
    fn focal_point_follows_policy() {
        let mut center = adapter();
        center.on_pointer(10.0, 20.0);
        assert_eq!(center.focal_point(), Vec2::new(500.0, 400.0));

        let mut pointer = ViewportAdapter::new(
            Environment::new(1000.0, 800.0),
            50.0,
            Activation::Always,
            FocalPolicy::Pointer,
        );
        assert_eq!(pointer.focal_point(), Vec2::new(500.0, 400.0));
        pointer.on_pointer(10.0, 20.0);
        assert_eq!(pointer.focal_point(), Vec2::new(10.0, 20.0));
        pointer.on_pointer_leave();
        assert_eq!(pointer.focal_point(), Vec2::new(500.0, 400.0));
    }

    #[test]
    fn theme_change_reports_transitions() {
        let mut va = adapter();
        assert!(!va.on_theme(Theme::Light));
        assert!(va.on_theme(Theme::Dark));
        assert_eq!(va.environment().theme, Theme::Dark);
    }
}
