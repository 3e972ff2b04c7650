//! The animated background engine.
//!
//! Owns the current [`Field`], the [`MotionDriver`] bound to it, the
//! [`Renderer`] and the [`ViewportAdapter`]. Hosts call [`Background::tick`]
//! once per display refresh and forward resize/theme/scroll/pointer events.
//! Everything runs on the caller's thread; there is no internal scheduling.

use tracing::{debug, trace};

use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::field::Field;
use crate::motion::MotionDriver;
use crate::prng::Prng;
use crate::render::{FrameStats, Renderer, Surface, Theme};
use crate::viewport::{Environment, ResizeOutcome, ViewportAdapter};

pub struct Background {
    config: FieldConfig,
    viewport: ViewportAdapter,
    field: Field,
    motion: MotionDriver,
    renderer: Renderer,
    rng: Prng,
    /// Added to the frame clock for the colour oscillation only.
    color_epoch_ms: f64,
    regenerations: u64,
    running: bool,
}

impl Background {
    /// Build the first field for `env`. Nothing moves until [`Self::start`].
    pub fn new(config: FieldConfig, env: Environment) -> Result<Self, FieldError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => Prng::new(seed),
            None => Prng::from_time(),
        };
        let motion = MotionDriver::new(&config, rng.fork());
        let viewport = ViewportAdapter::new(
            env,
            config.resize_debounce,
            config.activation,
            config.focal,
        );
        let field = Field::generate(env.width, env.height, &config, &mut rng, 0);
        debug!(
            points = field.len(),
            width = env.width,
            height = env.height,
            "particle field built"
        );

        Ok(Self {
            renderer: Renderer::new(&config),
            config,
            viewport,
            field,
            motion,
            rng,
            color_epoch_ms: 0.0,
            regenerations: 0,
            running: false,
        })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn environment(&self) -> &Environment {
        self.viewport.environment()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of rebuilds since construction.
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Anchor the colour oscillation to a wall clock. Hosts whose frame clock
    /// starts at zero pass the wall-clock time (ms) of that zero, so colours
    /// follow `epoch + now_ms` while tweens keep using `now_ms`.
    pub fn set_color_epoch(&mut self, epoch_ms: f64) {
        self.color_epoch_ms = epoch_ms;
    }

    pub fn should_animate(&self) -> bool {
        self.running && self.viewport.should_animate()
    }

    /// Size the surface and start every point's drift at `now_ms`.
    pub fn start<S: Surface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) {
        let env = *self.viewport.environment();
        surface.resize(env.backing_store(), env.device_pixel_ratio);
        self.motion.start(&self.field, now_ms);
        self.running = true;
    }

    /// One display refresh: advance motion, then draw if the activation
    /// policy allows. Returns `None` when nothing was drawn.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) -> Option<FrameStats> {
        if !self.running {
            return None;
        }
        let restarted = self.motion.advance(&mut self.field, now_ms);
        if restarted > 0 {
            trace!(restarted, "tweens chained");
        }

        if !self.viewport.should_animate() {
            return None;
        }
        self.field.target = self.viewport.focal_point();
        let theme = self.viewport.environment().theme;
        let color_ms = self.color_epoch_ms + now_ms;
        Some(self.renderer.render(surface, &mut self.field, theme, color_ms))
    }

    /// Forward a viewport resize. Rebuilds the field only when the width moved
    /// by at least the debounce threshold.
    pub fn resize<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        width: f64,
        height: f64,
        dpr: f64,
        now_ms: f64,
    ) -> ResizeOutcome {
        let outcome = self.viewport.on_resize(width, height, dpr);
        match outcome {
            ResizeOutcome::Ignored => {}
            ResizeOutcome::Resized => {
                let env = *self.viewport.environment();
                surface.resize(env.backing_store(), env.device_pixel_ratio);
                self.field.width = env.width;
                self.field.height = env.height;
                self.field.target = self.viewport.focal_point();
            }
            ResizeOutcome::Regenerate => {
                let env = *self.viewport.environment();
                surface.resize(env.backing_store(), env.device_pixel_ratio);
                self.regenerate(now_ms);
            }
        }
        outcome
    }

    /// Replace the field with a freshly generated one for the current
    /// viewport. The new field is complete before the old one is dropped,
    /// and old tweens are cancelled before new ones start.
    pub fn regenerate(&mut self, now_ms: f64) {
        let env = *self.viewport.environment();
        let generation = self.field.generation + 1;
        let mut next = Field::generate(env.width, env.height, &self.config, &mut self.rng, generation);
        next.target = self.viewport.focal_point();

        self.motion.cancel_all();
        self.field = next;
        if self.running {
            self.motion.start(&self.field, now_ms);
        }
        self.regenerations += 1;
        debug!(
            generation,
            points = self.field.len(),
            width = env.width,
            "particle field regenerated"
        );
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.viewport.on_theme(theme) {
            debug!(?theme, "theme changed");
        }
    }

    pub fn set_scroll(&mut self, scroll_y: f64) {
        self.viewport.on_scroll(scroll_y);
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.viewport.on_pointer(x, y);
    }

    pub fn clear_pointer(&mut self) {
        self.viewport.on_pointer_leave();
    }

    /// Stop drawing and drop every in-flight tween.
    pub fn teardown(&mut self) {
        self.motion.cancel_all();
        self.running = false;
        debug!("particle field torn down");
    }
}
