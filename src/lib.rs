//! # particle_field
//!
//! Animated particle-field background: a jittered grid of points, each
//! joined by lines to a handful of nearby points, drifting around its anchor
//! and fading with distance from a focal target.
//!
//! The engine is host independent. A host supplies a clock, viewport events
//! and a [`render::Surface`]; see `crates/particle_field_web` for the browser
//! canvas host and `field-cli` for a headless one.
//!
//! ## Quick Start
//!
//! ```
//! use particle_field::prelude::*;
//!
//! let cfg = FieldConfig::default().with_seed(42);
//! let env = Environment::new(1280.0, 720.0).with_theme(Theme::Dark);
//! let mut bg = Background::new(cfg, env).unwrap();
//!
//! let mut surface = RecordingSurface::new();
//! bg.start(&mut surface, 0.0);
//! let stats = bg.tick(&mut surface, 16.0);
//! assert!(stats.is_some());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): (de)serialize configs and field snapshots
//! - `parallel`: build the neighbour index with rayon
//! - `cli` (default): the `field-cli` binary and its `tracing-subscriber` setup
//!
//! ## Modules
//!
//! - [`field`]: point generation
//! - [`neighbors`]: neighbour index
//! - [`motion`]: per-point drift tweens
//! - [`render`]: opacity tiers, theme colours, drawing
//! - [`viewport`]: resize/theme/scroll/pointer handling
//! - [`background`]: the engine tying them together

#[path = "core/background.rs"]
pub mod background;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/field.rs"]
pub mod field;

#[path = "core/motion.rs"]
pub mod motion;

#[path = "core/neighbors.rs"]
pub mod neighbors;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/render.rs"]
pub mod render;

#[path = "core/viewport.rs"]
pub mod viewport;

pub mod prelude {
    pub use crate::background::Background;
    pub use crate::config::{FieldConfig, OpacityTiers, SpacingPolicy};
    pub use crate::error::FieldError;
    pub use crate::field::{Field, Point, Vec2};
    pub use crate::motion::{Easing, MotionDriver};
    pub use crate::render::{
        draw_point, opacity_tier, theme_color, DrawCommand, FrameStats, RecordingSurface,
        Renderer, Rgba, Surface, Theme,
    };
    pub use crate::viewport::{Activation, Environment, FocalPolicy, ResizeOutcome};
}
