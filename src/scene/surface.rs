//! Drawing seam between the scene and the browser canvas.
//!
//! Entities paint through the small [`Surface`] trait instead of talking to
//! `CanvasRenderingContext2d` directly, so the whole frame step can run on the
//! host under `cargo test` with a recording surface. The browser implementation
//! forwards one-to-one and drops the (practically infallible) JS errors the
//! same way the rest of the rendering code does (`.ok()`).

use std::fmt;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

// --- Color -------------------------------------------------------------------

/// HSL color as used by every entity. Displays as a CSS `hsl()` string.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub hue: f64,        // degrees
    pub saturation: f64, // percent
    pub lightness: f64,  // percent
}

impl Hsl {
    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({:.1}, {:.0}%, {:.0}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Two-stop radial gradient description (inner circle -> outer circle).
#[derive(Clone, Copy, Debug)]
pub struct RadialFill {
    pub inner: (f64, f64, f64), // x, y, radius
    pub outer: (f64, f64, f64),
    pub from: Hsl,
    pub to: Hsl,
}

// --- Surface -----------------------------------------------------------------

/// The subset of the 2D canvas API the scene needs.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn set_alpha(&mut self, alpha: f64);
    fn set_fill(&mut self, css: &str);
    fn set_radial_fill(&mut self, fill: &RadialFill);
    fn set_stroke(&mut self, css: &str, width: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn bezier_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    /// Full circle path segment centred on (x, y).
    fn circle(&mut self, x: f64, y: f64, radius: f64);
    /// Full axis-aligned ellipse path segment centred on (x, y).
    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64);
    fn fill(&mut self);
    fn stroke(&mut self);
}

impl Surface for CanvasRenderingContext2d {
    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }
    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }
    fn translate(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::translate(self, x, y).ok();
    }
    fn rotate(&mut self, angle: f64) {
        CanvasRenderingContext2d::rotate(self, angle).ok();
    }
    fn set_alpha(&mut self, alpha: f64) {
        self.set_global_alpha(alpha);
    }
    fn set_fill(&mut self, css: &str) {
        self.set_fill_style(&JsValue::from_str(css));
    }
    fn set_radial_fill(&mut self, fill: &RadialFill) {
        let (x0, y0, r0) = fill.inner;
        let (x1, y1, r1) = fill.outer;
        // Negative radii throw in the browser; a degenerate gradient falls back to flat.
        match self.create_radial_gradient(x0, y0, r0.max(0.0), x1, y1, r1.max(0.0)) {
            Ok(gradient) => {
                gradient.add_color_stop(0.0, &fill.from.css()).ok();
                gradient.add_color_stop(1.0, &fill.to.css()).ok();
                self.set_fill_style(&gradient);
            }
            Err(_) => self.set_fill_style(&JsValue::from_str(&fill.from.css())),
        }
    }
    fn set_stroke(&mut self, css: &str, width: f64) {
        self.set_stroke_style(&JsValue::from_str(css));
        self.set_line_width(width);
    }
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }
    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }
    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }
    fn quadratic_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.quadratic_curve_to(cpx, cpy, x, y);
    }
    fn bezier_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }
    fn circle(&mut self, x: f64, y: f64, radius: f64) {
        self.arc(x, y, radius.max(0.0), 0.0, std::f64::consts::TAU).ok();
    }
    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64) {
        let (rx, ry) = (rx.max(0.0), ry.max(0.0));
        CanvasRenderingContext2d::ellipse(self, x, y, rx, ry, 0.0, 0.0, std::f64::consts::TAU).ok();
    }
    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }
    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }
}

// --- Test recorder -----------------------------------------------------------

/// Surface that records calls by name; shared by the scene unit tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct Recorder {
    pub ops: Vec<&'static str>,
    pub alphas: Vec<f64>,
    pub fills: Vec<String>,
    pub gradients: usize,
}

#[cfg(test)]
impl Recorder {
    pub fn count(&self, op: &str) -> usize {
        self.ops.iter().filter(|o| **o == op).count()
    }
}

#[cfg(test)]
impl Surface for Recorder {
    fn save(&mut self) {
        self.ops.push("save");
    }
    fn restore(&mut self) {
        self.ops.push("restore");
    }
    fn translate(&mut self, _x: f64, _y: f64) {
        self.ops.push("translate");
    }
    fn rotate(&mut self, _angle: f64) {
        self.ops.push("rotate");
    }
    fn set_alpha(&mut self, alpha: f64) {
        self.alphas.push(alpha);
    }
    fn set_fill(&mut self, css: &str) {
        self.fills.push(css.to_string());
    }
    fn set_radial_fill(&mut self, _fill: &RadialFill) {
        self.gradients += 1;
    }
    fn set_stroke(&mut self, _css: &str, _width: f64) {
        self.ops.push("set_stroke");
    }
    fn fill_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64) {
        self.ops.push("fill_rect");
    }
    fn begin_path(&mut self) {
        self.ops.push("begin_path");
    }
    fn close_path(&mut self) {
        self.ops.push("close_path");
    }
    fn move_to(&mut self, _x: f64, _y: f64) {
        self.ops.push("move_to");
    }
    fn line_to(&mut self, _x: f64, _y: f64) {
        self.ops.push("line_to");
    }
    fn quadratic_to(&mut self, _cpx: f64, _cpy: f64, _x: f64, _y: f64) {
        self.ops.push("quadratic_to");
    }
    fn bezier_to(&mut self, _a: f64, _b: f64, _c: f64, _d: f64, _x: f64, _y: f64) {
        self.ops.push("bezier_to");
    }
    fn circle(&mut self, _x: f64, _y: f64, _r: f64) {
        self.ops.push("circle");
    }
    fn ellipse(&mut self, _x: f64, _y: f64, _rx: f64, _ry: f64) {
        self.ops.push("ellipse");
    }
    fn fill(&mut self) {
        self.ops.push("fill");
    }
    fn stroke(&mut self) {
        self.ops.push("stroke");
    }
}
