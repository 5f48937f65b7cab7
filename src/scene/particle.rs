//! Explosion particles: ballistic dots or little star flowers that fade out.

use std::f64::consts::TAU;

use super::surface::{Hsl, Surface};

pub const GRAVITY: f64 = 0.04; // px / frame^2
pub const FADE_STEP: f64 = 0.01; // alpha lost per frame

const FLOWER_RADIUS: f64 = 6.0;
const DOT_RADIUS: f64 = 2.0;

/// Burst pattern of the firework a particle came from; also picks its glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstShape {
    Circle,
    Flower,
}

impl BurstShape {
    /// Total angle swept by a burst of this shape (three turns for a flower).
    pub fn sweep(self) -> f64 {
        match self {
            BurstShape::Circle => TAU,
            BurstShape::Flower => TAU * 3.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub alpha: f64,
    pub color: Hsl,
    pub shape: BurstShape,
}

impl Particle {
    pub fn new(x: f64, y: f64, angle: f64, speed: f64, color: Hsl, shape: BurstShape) -> Self {
        Self {
            x,
            y,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            alpha: 1.0,
            color,
            shape,
        }
    }

    pub fn update(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += GRAVITY;
        self.alpha -= FADE_STEP;
    }

    pub fn is_alive(&self) -> bool {
        self.alpha > 0.0
    }

    pub fn draw(&self, surface: &mut dyn Surface, flower_points: usize) {
        if !self.is_alive() {
            return;
        }
        surface.save();
        surface.set_alpha(self.alpha.min(1.0));
        surface.set_fill(&self.color.css());
        surface.begin_path();
        match self.shape {
            BurstShape::Flower => {
                let points = flower_points.max(3);
                for i in 0..points {
                    let a = i as f64 / points as f64 * TAU;
                    surface.line_to(
                        self.x + a.cos() * FLOWER_RADIUS,
                        self.y + a.sin() * FLOWER_RADIUS,
                    );
                }
                surface.close_path();
            }
            BurstShape::Circle => surface.circle(self.x, self.y, DOT_RADIUS),
        }
        surface.fill();
        surface.restore();
    }
}
