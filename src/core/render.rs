//! Frame rendering: opacity by proximity, theme colour, lines and dots.
//!
//! Drawing goes through the [`Surface`] trait so the engine never depends
//! on a particular canvas API. The browser host implements it for a 2d
//! canvas context; [`RecordingSurface`] keeps the commands in memory.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{FieldConfig, OpacityTiers};
use crate::field::{dist_sq, Field, Vec2};
use crate::viewport::BackingStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_flag(is_dark: bool) -> Self {
        if is_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// `rgba(r,g,b,a)` with channels rounded to integers.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            self.r.round().clamp(0.0, 255.0) as u8,
            self.g.round().clamp(0.0, 255.0) as u8,
            self.b.round().clamp(0.0, 255.0) as u8,
            self.a.clamp(0.0, 1.0)
        )
    }
}

/// Base colour for the field at wall-clock `now_ms`. Channels drift slowly
/// with `t = now_ms * 0.001`.
pub fn theme_color(theme: Theme, now_ms: f64) -> Rgba {
    let t = now_ms * 0.001;
    match theme {
        Theme::Dark => Rgba {
            r: 245.0 + 10.0 * t.sin(),
            g: 245.0 + 10.0 * t.cos(),
            b: 255.0,
            a: 1.0,
        },
        Theme::Light => Rgba {
            r: 30.0 + 15.0 * t.sin(),
            g: 30.0,
            b: 60.0 + 15.0 * t.cos(),
            a: 1.0,
        },
    }
}

/// `(line, dot)` opacity for a squared distance under the default tiers.
pub fn opacity_tier(dist_sq: f64) -> (f64, f64) {
    OpacityTiers::default().tier(dist_sq)
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Glow {
    pub color: Rgba,
    pub blur: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineStyle {
    pub color: Rgba,
    pub glow: Option<Glow>,
}

/// Minimal 2d drawing API the renderer needs.
pub trait Surface {
    /// Resize the backing store; drawing coordinates stay in CSS pixels.
    fn resize(&mut self, store: BackingStore, device_pixel_ratio: f64);
    fn clear(&mut self, width: f64, height: f64);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, style: &LineStyle);
    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Rgba);
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum DrawCommand {
    Resize { store: BackingStore, dpr: f64 },
    Clear { width: f64, height: f64 },
    Line { from: Vec2, to: Vec2, style: LineStyle },
    Circle { center: Vec2, radius: f64, color: Rgba },
}

/// In-memory surface. Used by tests and the headless CLI.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count_lines(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count()
    }

    pub fn count_circles(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, store: BackingStore, device_pixel_ratio: f64) {
        self.commands.push(DrawCommand::Resize {
            store,
            dpr: device_pixel_ratio,
        });
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, style: &LineStyle) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            style: *style,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }
}

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameStats {
    pub visible_points: usize,
    pub lines: usize,
}

/// Draw point `idx` using its current `active_line`/`active_dot`: a line
/// to each neighbour, then the dot. Points with zero line opacity are
/// skipped. Returns the number of lines drawn.
pub fn draw_point<S: Surface + ?Sized>(
    surface: &mut S,
    field: &Field,
    idx: usize,
    base: Rgba,
    glow_blur: f64,
) -> usize {
    let p = &field.points[idx];
    if p.active_line <= 0.0 {
        return 0;
    }

    let style = LineStyle {
        color: base.with_alpha(p.active_line),
        glow: (glow_blur > 0.0).then(|| Glow {
            color: base.with_alpha(0.6),
            blur: glow_blur,
        }),
    };
    let from = p.pos();
    let mut lines = 0;
    for to in field.neighbor_positions(idx) {
        surface.stroke_line(from, to, &style);
        lines += 1;
    }
    surface.fill_circle(from, p.radius, base.with_alpha(p.active_dot));
    lines
}

#[derive(Debug, Clone)]
pub struct Renderer {
    tiers: OpacityTiers,
    glow_blur: f64,
}

impl Renderer {
    pub fn new(cfg: &FieldConfig) -> Self {
        Self {
            tiers: cfg.opacity,
            glow_blur: cfg.glow_blur,
        }
    }

    /// Clear the surface and draw the whole field for one frame.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        field: &mut Field,
        theme: Theme,
        now_ms: f64,
    ) -> FrameStats {
        surface.clear(field.width, field.height);

        let base = theme_color(theme, now_ms);
        let target = field.target;
        let mut stats = FrameStats::default();
        for i in 0..field.points.len() {
            let (line, dot) = self.tiers.tier(dist_sq(target, field.points[i].pos()));
            let p = &mut field.points[i];
            p.active_line = line;
            p.active_dot = dot;

            let drawn = draw_point(surface, field, i, base, self.glow_blur);
            if field.points[i].active_line > 0.0 {
                stats.visible_points += 1;
                stats.lines += drawn;
            }
        }
        stats
    }
}
