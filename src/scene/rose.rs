//! Growing roses: a cyclic state machine that rises out of the bottom edge,
//! opens up, then sways in the wind until it drifts off-screen and starts over.
//!
//! Phase transitions:
//!
//! ```text
//!   Growing --(risen >= stem height)--> Blooming --(size >= max)--> Mature
//!      ^                                                               |
//!      +---------------- reset (off-canvas or negative size) ----------+
//! ```
//!
//! Reset can fire from any phase. All random jitter used while drawing is
//! drawn at reset time so a rose looks the same from frame to frame.

use std::f64::consts::{PI, TAU};

use super::config::{MAX_PETAL_LAYERS, MAX_PETALS, SceneConfig};
use super::random::RandomSource;
use super::surface::{Hsl, RadialFill, Surface};
use super::Viewport;

pub const RISE_PER_FRAME: f64 = 1.5;
/// Horizontal slack outside the viewport before a rose is recycled.
pub const OFFSCREEN_MARGIN: f64 = 50.0;
const SPAWN_DEPTH: f64 = 20.0; // start below the bottom edge

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RosePhase {
    Growing,
    Blooming,
    Mature,
}

impl RosePhase {
    /// How strongly the wind pushes the rose sideways in this phase.
    fn wind_coupling(self) -> f64 {
        match self {
            RosePhase::Growing => 0.0,
            RosePhase::Blooming => 0.1,
            RosePhase::Mature => 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Leaf {
    pub position: f64, // 0 = stem base, 1 = flower head
    pub size: f64,
    pub angle: f64,
}

#[derive(Clone, Copy, Debug)]
struct PetalJitter {
    length: f64,
    alpha: f64,
}

#[derive(Clone, Debug)]
pub struct GrowingRose {
    pub x: f64,
    pub y: f64,
    origin_y: f64,
    pub size: f64,
    pub max_size: f64,
    pub growth_speed: f64,
    pub stem_height: f64,
    pub phase: RosePhase,
    pub leaves: Vec<Leaf>,
    pub color: Hsl,
    stem_color: Hsl,
    leaf_color: Hsl,
    shade_color: Hsl,  // gradient edge of outer petals
    inner_color: Hsl,  // inner ellipse petals
    center_color: Hsl,
    petal_jitter: Vec<PetalJitter>,
    pub wind_time: f64,
    pub wind_strength: f64,
    pub wind_frequency: f64,
    resets: u32,
}

impl GrowingRose {
    pub fn new(rng: &mut dyn RandomSource, viewport: Viewport, config: &SceneConfig) -> Self {
        let mut rose = Self {
            x: 0.0,
            y: 0.0,
            origin_y: 0.0,
            size: 0.0,
            max_size: 0.0,
            growth_speed: 0.0,
            stem_height: 0.0,
            phase: RosePhase::Growing,
            leaves: Vec::new(),
            color: Hsl::new(0.0, 0.0, 0.0),
            stem_color: Hsl::new(0.0, 0.0, 0.0),
            leaf_color: Hsl::new(0.0, 0.0, 0.0),
            shade_color: Hsl::new(0.0, 0.0, 0.0),
            inner_color: Hsl::new(0.0, 0.0, 0.0),
            center_color: Hsl::new(0.0, 0.0, 0.0),
            petal_jitter: Vec::new(),
            wind_time: 0.0,
            wind_strength: 0.0,
            wind_frequency: 0.0,
            resets: 0,
        };
        rose.reset(rng, viewport, config);
        rose.resets = 0;
        rose
    }

    /// Override the randomized stem height (keeps everything else).
    pub fn with_stem_height(mut self, stem_height: f64) -> Self {
        self.stem_height = stem_height;
        self
    }

    /// Times this rose has been recycled since construction.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Back to a fresh seedling below the bottom edge with new geometry,
    /// colors, leaves, petal jitter and wind.
    pub fn reset(&mut self, rng: &mut dyn RandomSource, viewport: Viewport, config: &SceneConfig) {
        self.x = rng.next_f64() * viewport.width;
        self.origin_y = viewport.height + SPAWN_DEPTH;
        self.y = self.origin_y;
        self.size = 0.0;
        self.max_size = rng.range(15.0, 35.0);
        self.growth_speed = rng.range(0.2, 0.5);
        self.stem_height = rng.range(40.0, 100.0);
        self.phase = RosePhase::Growing;

        self.color = Hsl::new(rng.range(330.0, 360.0), 70.0, 50.0);
        self.stem_color = Hsl::new(rng.range(120.0, 150.0), 60.0, 30.0);
        self.leaf_color = Hsl::new(rng.range(120.0, 150.0), 60.0, 35.0);
        self.shade_color = Hsl::new(rng.range(330.0, 350.0), 60.0, 40.0);
        self.inner_color = Hsl::new(rng.range(350.0, 360.0), 80.0, 60.0);
        self.center_color = Hsl::new(rng.range(40.0, 60.0), 80.0, 50.0);

        let leaf_count = rng.range_usize(3, 5);
        self.leaves.clear();
        for _ in 0..leaf_count {
            self.leaves.push(Leaf {
                position: rng.range(0.2, 0.8),
                size: rng.range(8.0, 14.0),
                angle: rng.range(-PI / 2.0, PI / 2.0),
            });
        }

        let layers = config.petal_layers.min(MAX_PETAL_LAYERS);
        let petals = layers * config.outer_petals.min(MAX_PETALS);
        self.petal_jitter.clear();
        for _ in 0..petals {
            self.petal_jitter.push(PetalJitter {
                length: rng.range(0.8, 1.2),
                alpha: rng.range(0.7, 1.0),
            });
        }

        self.wind_strength = rng.range(-1.0, 1.0);
        self.wind_frequency = rng.range(0.01, 0.03);
        self.wind_time = rng.next_f64() * TAU;
        self.resets += 1;
    }

    /// Current sideways push before phase coupling.
    pub fn wind(&self) -> f64 {
        self.wind_time.sin() * self.wind_strength * 3.0
    }

    /// Stem bend at the flower head.
    fn stem_curve(&self) -> f64 {
        self.wind_time.sin() * self.wind_strength * 10.0
    }

    /// Distance the flower head has climbed since the last reset.
    pub fn risen(&self) -> f64 {
        self.origin_y - self.y
    }

    /// Advance one frame. Returns true if the frame ended in a reset.
    pub fn update(
        &mut self,
        rng: &mut dyn RandomSource,
        viewport: Viewport,
        config: &SceneConfig,
    ) -> bool {
        self.wind_time += self.wind_frequency;
        let push = self.wind() * self.phase.wind_coupling();

        match self.phase {
            RosePhase::Growing => {
                self.y -= RISE_PER_FRAME;
                self.size += self.growth_speed;
                if self.risen() >= self.stem_height {
                    self.phase = RosePhase::Blooming;
                }
            }
            RosePhase::Blooming => {
                self.size += self.growth_speed * 0.5;
                self.x += push;
                if self.size >= self.max_size {
                    self.phase = RosePhase::Mature;
                }
            }
            RosePhase::Mature => {
                self.x += push;
            }
        }

        let off_canvas = self.x < -OFFSCREEN_MARGIN || self.x > viewport.width + OFFSCREEN_MARGIN;
        if off_canvas || self.size < 0.0 || !self.x.is_finite() {
            self.reset(rng, viewport, config);
            return true;
        }
        false
    }

    pub fn draw(&self, surface: &mut dyn Surface, config: &SceneConfig) {
        surface.save();

        // Stem
        let curve = self.stem_curve();
        let end_x = self.x + curve;
        let end_y = self.y - self.stem_height;
        surface.begin_path();
        surface.move_to(self.x, self.y);
        surface.bezier_to(
            self.x + curve * 0.3,
            self.y - self.stem_height * 0.3,
            self.x + curve * 0.7,
            self.y - self.stem_height * 0.7,
            end_x,
            end_y,
        );
        surface.set_stroke(&self.stem_color.css(), 3.0);
        surface.stroke();

        // Leaves
        let leaf_css = self.leaf_color.css();
        for leaf in &self.leaves {
            let leaf_y = self.y - self.stem_height * leaf.position;
            let leaf_x = end_x + (self.x - end_x) * (1.0 - leaf.position);
            surface.save();
            surface.translate(leaf_x, leaf_y);
            surface.rotate(leaf.angle + curve * 0.01);
            surface.begin_path();
            surface.ellipse(0.0, 0.0, leaf.size, leaf.size * 0.6);
            surface.set_fill(&leaf_css);
            surface.fill();
            surface.restore();
        }

        // Flower head, outermost layer first
        let layers = config.petal_layers.max(1);
        let inner_css = self.inner_color.css();
        for layer in (1..=layers).rev() {
            let layer_size = self.size * (0.6 + layer as f64 * 0.15);
            let layer_alpha = 0.3 + (layer as f64 / layers as f64) * 0.7;
            surface.save();
            surface.translate(end_x, end_y);
            surface.rotate(curve * 0.005);
            for i in 0..config.outer_petals {
                let jitter = self
                    .petal_jitter
                    .get((layer - 1) * config.outer_petals + i)
                    .copied()
                    .unwrap_or(PetalJitter { length: 1.0, alpha: 1.0 });
                self.draw_outer_petal(surface, config, i, layer_size, layer_alpha, jitter);
            }
            for i in 0..config.inner_petals {
                let angle = i as f64 / config.inner_petals as f64 * TAU;
                let length = layer_size * 0.6;
                surface.save();
                surface.rotate(angle);
                surface.begin_path();
                surface.ellipse(0.0, -length * 0.3, layer_size * 0.4, length);
                surface.set_fill(&inner_css);
                surface.set_alpha(layer_alpha);
                surface.fill();
                surface.restore();
            }
            surface.restore();
        }

        surface.set_alpha(1.0);
        surface.begin_path();
        surface.circle(end_x, end_y, self.size * 0.2);
        surface.set_fill(&self.center_color.css());
        surface.fill();

        surface.restore();
    }

    /// Teardrop petal from three quadratic curves, in head-local coordinates.
    fn draw_outer_petal(
        &self,
        surface: &mut dyn Surface,
        config: &SceneConfig,
        index: usize,
        layer_size: f64,
        layer_alpha: f64,
        jitter: PetalJitter,
    ) {
        let angle = index as f64 / config.outer_petals as f64 * TAU;
        let length = layer_size * jitter.length;
        let width = layer_size * 0.7;
        surface.save();
        surface.rotate(angle);
        surface.begin_path();
        surface.move_to(0.0, 0.0);
        surface.quadratic_to(width * 0.5, -length * 0.3, width, -length * 0.1);
        surface.quadratic_to(width * 0.3, -length, -width * 0.3, -length);
        surface.quadratic_to(-width, -length * 0.1, -width * 0.5, -length * 0.3);
        surface.close_path();
        if config.petal_gradient {
            surface.set_radial_fill(&RadialFill {
                inner: (0.0, 0.0, 0.0),
                outer: (0.0, -length * 0.5, length),
                from: self.color,
                to: self.shade_color,
            });
        } else {
            surface.set_fill(&self.color.css());
        }
        surface.set_alpha(layer_alpha * jitter.alpha);
        surface.fill();
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::random::FastRng;
    use crate::scene::surface::Recorder;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    fn seedling(seed: u64) -> (GrowingRose, FastRng) {
        let mut rng = FastRng::with_seed(seed);
        let rose = GrowingRose::new(&mut rng, viewport(), &SceneConfig::desktop());
        (rose, rng)
    }

    #[test]
    fn test_fresh_rose_geometry() {
        let (rose, _) = seedling(5);
        assert_eq!(rose.phase, RosePhase::Growing);
        assert_eq!(rose.size, 0.0);
        assert_eq!(rose.y, 620.0);
        assert!((15.0..35.0).contains(&rose.max_size));
        assert!((40.0..100.0).contains(&rose.stem_height));
        assert!((3..=5).contains(&rose.leaves.len()));
        assert!((-1.0..1.0).contains(&rose.wind_strength));
        assert_eq!(rose.resets(), 0);
    }

    #[test]
    fn test_blooms_after_stem_height_rise() {
        let cfg = SceneConfig::desktop();
        let (rose, mut rng) = seedling(9);
        let mut rose = rose.with_stem_height(60.0);
        let x0 = rose.x;
        for step in 1..=40 {
            assert_eq!(rose.phase, RosePhase::Growing, "bloomed early at step {step}");
            rose.update(&mut rng, viewport(), &cfg);
            assert_eq!(rose.x, x0);
        }
        assert_eq!(rose.phase, RosePhase::Blooming);
    }

    #[test]
    fn test_matures_once_size_reaches_cap() {
        let cfg = SceneConfig::desktop();
        let (mut rose, mut rng) = seedling(21);
        rose.wind_strength = 0.0;
        let mut phases = vec![rose.phase];
        for _ in 0..1_000 {
            assert!(!rose.update(&mut rng, viewport(), &cfg));
            assert!(rose.size >= 0.0);
            if *phases.last().unwrap() != rose.phase {
                phases.push(rose.phase);
            }
        }
        assert_eq!(phases, vec![RosePhase::Growing, RosePhase::Blooming, RosePhase::Mature]);
        assert!(rose.size >= rose.max_size);
    }

    #[test]
    fn test_reset_when_blown_off_canvas() {
        let cfg = SceneConfig::desktop();
        let (mut rose, mut rng) = seedling(2);
        rose.phase = RosePhase::Mature;
        rose.size = 20.0;
        rose.x = 800.0 + OFFSCREEN_MARGIN + 1.0;
        assert!(rose.update(&mut rng, viewport(), &cfg));
        assert_eq!(rose.phase, RosePhase::Growing);
        assert_eq!(rose.size, 0.0);
        assert_eq!(rose.resets(), 1);
        assert!((0.0..800.0).contains(&rose.x));
    }

    #[test]
    fn test_reset_on_negative_size() {
        let cfg = SceneConfig::desktop();
        let (mut rose, mut rng) = seedling(4);
        rose.phase = RosePhase::Blooming;
        rose.growth_speed = -5.0;
        rose.size = 1.0;
        assert!(rose.update(&mut rng, viewport(), &cfg));
        assert_eq!(rose.phase, RosePhase::Growing);
        assert!(rose.size >= 0.0);
    }

    #[test]
    fn test_draw_is_stable_between_frames() {
        let cfg = SceneConfig::desktop();
        let (mut rose, mut rng) = seedling(8);
        for _ in 0..80 {
            rose.update(&mut rng, viewport(), &cfg);
        }
        let mut a = Recorder::default();
        let mut b = Recorder::default();
        rose.draw(&mut a, &cfg);
        rose.draw(&mut b, &cfg);
        assert_eq!(a.ops, b.ops);
        assert_eq!(a.alphas, b.alphas);
        assert_eq!(a.fills, b.fills);
    }

    #[test]
    fn test_oversized_petal_counts_stay_bounded() {
        let cfg = SceneConfig {
            petal_layers: usize::MAX,
            outer_petals: usize::MAX,
            ..SceneConfig::desktop()
        };
        let mut rng = FastRng::with_seed(6);
        let rose = GrowingRose::new(&mut rng, viewport(), &cfg);
        assert_eq!(rose.petal_jitter.len(), MAX_PETAL_LAYERS * MAX_PETALS);
    }

    #[test]
    fn test_draw_detail_follows_config() {
        let desktop = SceneConfig::desktop();
        let mobile = SceneConfig::mobile();
        let (rose, _) = seedling(13);

        let mut rec = Recorder::default();
        rose.draw(&mut rec, &desktop);
        assert_eq!(rec.count("bezier_to"), 1);
        let outer = desktop.outer_petals * desktop.petal_layers;
        assert_eq!(rec.count("quadratic_to"), 3 * outer);
        assert_eq!(rec.gradients, outer);
        assert_eq!(
            rec.count("ellipse"),
            rose.leaves.len() + desktop.inner_petals * desktop.petal_layers
        );
        assert_eq!(rec.count("save"), rec.count("restore"));

        let mut rec = Recorder::default();
        rose.draw(&mut rec, &mobile);
        assert_eq!(rec.gradients, 0);
        assert_eq!(rec.count("quadratic_to"), 3 * mobile.outer_petals * mobile.petal_layers);
    }
}
