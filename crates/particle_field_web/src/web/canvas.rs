use std::f64::consts::TAU;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use particle_field::field::Vec2;
use particle_field::render::{LineStyle, Rgba, Surface};
use particle_field::viewport::BackingStore;

/// 2d canvas context behind the engine's `Surface` trait.
pub(super) struct CanvasSurface {
    canvas: web_sys::HtmlCanvasElement,
    ctx: web_sys::CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub(super) fn new(canvas: web_sys::HtmlCanvasElement) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| "canvas: get_context threw".to_string())?
            .ok_or("canvas: missing 2d context".to_string())?
            .dyn_into::<web_sys::CanvasRenderingContext2d>()
            .map_err(|_| "canvas: context is not 2d".to_string())?;
        Ok(Self { canvas, ctx })
    }
}

impl Surface for CanvasSurface {
    fn resize(&mut self, store: BackingStore, device_pixel_ratio: f64) {
        self.canvas.set_width(store.width);
        self.canvas.set_height(store.height);

        // Keep the CSS box at viewport size; the backing store carries the
        // extra density.
        let dpr = if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", store.width as f64 / dpr));
        let _ = style.set_property("height", &format!("{}px", store.height as f64 / dpr));

        // Setting width/height resets the transform; draw in CSS pixels.
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    #[allow(deprecated)]
    fn stroke_line(&mut self, from: Vec2, to: Vec2, style: &LineStyle) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx
            .set_stroke_style(&JsValue::from_str(&style.color.to_css()));
        match style.glow {
            Some(glow) => {
                self.ctx.set_shadow_color(&glow.color.to_css());
                self.ctx.set_shadow_blur(glow.blur);
            }
            None => self.ctx.set_shadow_blur(0.0),
        }
        self.ctx.stroke();
    }

    #[allow(deprecated)]
    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Rgba) {
        // Dots are drawn without the line glow.
        self.ctx.set_shadow_blur(0.0);
        self.ctx.begin_path();
        if self.ctx.arc(center.x, center.y, radius, 0.0, TAU).is_err() {
            return;
        }
        self.ctx.set_fill_style(&JsValue::from_str(&color.to_css()));
        self.ctx.fill();
    }
}
