//! Rising fireworks and their explosion bursts.

use std::collections::VecDeque;

use super::config::{MAX_TRAIL_LENGTH, SceneConfig};
use super::particle::{BurstShape, Particle};
use super::random::RandomSource;
use super::surface::{Hsl, Surface};
use super::Viewport;

const FLOWER_BURST_CHANCE: f64 = 0.4;
const HEAD_RADIUS: f64 = 3.0;
const TRAIL_WIDTH: f64 = 2.0;

#[derive(Clone, Debug)]
pub struct Firework {
    pub x: f64,
    pub y: f64,
    pub target_y: f64,
    pub color: Hsl,
    pub speed: f64,
    trail: VecDeque<(f64, f64)>, // oldest first
    trail_cap: usize,
}

impl Firework {
    pub fn new(x: f64, y: f64, target_y: f64, color: Hsl, speed: f64, trail_cap: usize) -> Self {
        let trail_cap = trail_cap.clamp(1, MAX_TRAIL_LENGTH);
        Self {
            x,
            y,
            target_y,
            color,
            speed,
            trail: VecDeque::with_capacity(trail_cap + 1),
            trail_cap,
        }
    }

    /// Randomized launch from just above the bottom edge.
    pub fn launch(rng: &mut dyn RandomSource, viewport: Viewport, config: &SceneConfig) -> Self {
        let x = rng.next_f64() * viewport.width;
        let y = viewport.height - 10.0;
        let mut target_y = 200.0 + rng.next_f64() * (viewport.height / 2.0);
        let color = Hsl::new(rng.next_f64() * 360.0, 100.0, 60.0);
        let speed = 5.0 + rng.next_f64() * 2.0;
        // Short viewports can put the target at or below the launch point.
        if target_y >= y {
            target_y = y - speed;
        }
        Self::new(x, y, target_y, color, speed, config.trail_length)
    }

    pub fn trail(&self) -> impl ExactSizeIterator<Item = &(f64, f64)> {
        self.trail.iter()
    }

    /// Advance one frame. Returns true once the target altitude is reached;
    /// the caller then calls [`Firework::explode`] and drops the firework.
    pub fn update(&mut self) -> bool {
        self.trail.push_back((self.x, self.y));
        while self.trail.len() > self.trail_cap {
            self.trail.pop_front();
        }
        self.y -= self.speed;
        self.y <= self.target_y
    }

    /// Emit the burst into `particles`, stopping early at the population cap.
    /// Returns the number of particles created.
    pub fn explode(
        &self,
        rng: &mut dyn RandomSource,
        config: &SceneConfig,
        particles: &mut Vec<Particle>,
    ) -> usize {
        let count = rng.range_usize(config.burst_min, config.burst_max);
        let shape = if rng.chance(FLOWER_BURST_CHANCE) {
            BurstShape::Flower
        } else {
            BurstShape::Circle
        };
        let room = config.max_particles.saturating_sub(particles.len());
        let emitted = count.min(room);
        for i in 0..emitted {
            let angle = i as f64 / count as f64 * shape.sweep();
            let speed = 2.0 + rng.next_f64() * 3.0;
            particles.push(Particle::new(self.x, self.y, angle, speed, self.color, shape));
        }
        if emitted < count {
            log::debug!("burst truncated at particle cap ({emitted}/{count})");
        }
        emitted
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        let css = self.color.css();
        surface.begin_path();
        surface.move_to(self.x, self.y);
        for &(tx, ty) in self.trail.iter().rev() {
            surface.line_to(tx, ty);
        }
        surface.set_stroke(&css, TRAIL_WIDTH);
        surface.stroke();
        surface.begin_path();
        surface.circle(self.x, self.y, HEAD_RADIUS);
        surface.set_fill(&css);
        surface.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::random::FastRng;
    use crate::scene::surface::Recorder;
    use approx::assert_abs_diff_eq;

    fn rocket(trail_cap: usize) -> Firework {
        Firework::new(100.0, 500.0, 50.0, Hsl::new(200.0, 100.0, 60.0), 5.0, trail_cap)
    }

    #[test]
    fn test_trail_is_bounded_and_ordered() {
        let mut fw = rocket(4);
        for _ in 0..20 {
            fw.update();
            assert!(fw.trail().len() <= 4);
        }
        let ys: Vec<f64> = fw.trail().map(|&(_, y)| y).collect();
        // Oldest entries are lowest on screen (largest y).
        assert!(ys.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(*ys.last().unwrap(), fw.y + fw.speed);
    }

    #[test]
    fn test_reaches_target_after_expected_steps() {
        let mut fw = rocket(10);
        for step in 1..=90 {
            let done = fw.update();
            assert_eq!(done, step == 90, "unexpected state at step {step}");
        }
        assert!(fw.y <= 50.0);
    }

    #[test]
    fn test_explode_respects_range_and_cap() {
        let cfg = SceneConfig::desktop();
        let fw = rocket(10);
        let mut rng = FastRng::with_seed(3);
        for _ in 0..50 {
            let mut particles = Vec::new();
            let n = fw.explode(&mut rng, &cfg, &mut particles);
            assert_eq!(n, particles.len());
            assert!((cfg.burst_min..=cfg.burst_max).contains(&n));
        }

        let tight = SceneConfig {
            max_particles: 40,
            ..SceneConfig::desktop()
        };
        let mut particles = Vec::new();
        fw.explode(&mut rng, &tight, &mut particles);
        fw.explode(&mut rng, &tight, &mut particles);
        assert_eq!(particles.len(), 40);
        assert_eq!(fw.explode(&mut rng, &tight, &mut particles), 0);
    }

    #[test]
    fn test_burst_directions_follow_shape_sweep() {
        let cfg = SceneConfig::desktop();
        let fw = rocket(10);
        let mut rng = FastRng::with_seed(5);
        let (mut circles, mut flowers) = (0, 0);
        for _ in 0..64 {
            let mut particles = Vec::new();
            let n = fw.explode(&mut rng, &cfg, &mut particles);
            let shape = particles[0].shape;
            for (i, p) in particles.iter().enumerate() {
                assert_eq!(p.shape, shape);
                let angle = i as f64 / n as f64 * shape.sweep();
                let speed = p.vx.hypot(p.vy);
                assert!((2.0..=5.0).contains(&speed));
                assert_abs_diff_eq!(p.vx, angle.cos() * speed, epsilon = 1e-9);
                assert_abs_diff_eq!(p.vy, angle.sin() * speed, epsilon = 1e-9);
            }
            match shape {
                BurstShape::Circle => circles += 1,
                BurstShape::Flower => flowers += 1,
            }
        }
        assert!(circles > 0 && flowers > 0);
        assert_abs_diff_eq!(BurstShape::Circle.sweep(), std::f64::consts::TAU);
        assert_abs_diff_eq!(BurstShape::Flower.sweep(), 6.0 * std::f64::consts::PI);
    }

    #[test]
    fn test_huge_trail_cap_is_bounded() {
        let mut fw = rocket(usize::MAX);
        for _ in 0..(MAX_TRAIL_LENGTH + 10) {
            fw.update();
        }
        assert_eq!(fw.trail().len(), MAX_TRAIL_LENGTH);
        assert_eq!(rocket(0).trail_cap, 1);
    }

    #[test]
    fn test_launch_stays_inside_viewport() {
        let cfg = SceneConfig::desktop();
        let mut rng = FastRng::with_seed(11);
        let vp = Viewport::new(800.0, 600.0);
        let mut deepest: f64 = 0.0;
        for _ in 0..200 {
            let fw = Firework::launch(&mut rng, vp, &cfg);
            assert!((0.0..800.0).contains(&fw.x));
            assert_eq!(fw.y, 590.0);
            assert!((200.0..500.0).contains(&fw.target_y));
            assert!((5.0..7.0).contains(&fw.speed));
            deepest = deepest.max(fw.target_y);
        }
        // Tall viewports keep the full 200 + r * h/2 target range.
        assert!(deepest > 0.8 * 590.0);
    }

    #[test]
    fn test_short_viewport_target_stays_above_launch() {
        let cfg = SceneConfig::desktop();
        let mut rng = FastRng::with_seed(12);
        let vp = Viewport::new(400.0, 150.0);
        for _ in 0..50 {
            let mut fw = Firework::launch(&mut rng, vp, &cfg);
            assert_eq!(fw.y, 140.0);
            assert_abs_diff_eq!(fw.target_y, fw.y - fw.speed);
            assert!(fw.update(), "should burst on its first frame");
        }
    }

    #[test]
    fn test_draw_trail_and_head() {
        let mut fw = rocket(10);
        fw.update();
        fw.update();
        let mut rec = Recorder::default();
        fw.draw(&mut rec);
        assert_eq!(rec.count("line_to"), 2);
        assert_eq!(rec.count("stroke"), 1);
        assert_eq!(rec.count("circle"), 1);
        assert_eq!(rec.count("fill"), 1);
    }
}
