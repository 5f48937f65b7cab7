//! The finale scene: fireworks, their particle bursts and a bed of growing roses.
//!
//! [`Scene`] owns the three entity collections, the dismissal gate and the
//! random source. The browser glue drives it from two callbacks:
//!
//! - a recurring spawn timer calling [`Scene::spawn_tick`]
//! - the animation-frame loop calling [`Scene::step`]
//!
//! Both run on the page's single thread, so the scene is plain owned state with
//! no interior mutability of its own.

use std::collections::VecDeque;

pub mod config;
pub mod firework;
pub mod gate;
pub mod particle;
pub mod random;
pub mod rose;
pub mod surface;

use config::SceneConfig;
use firework::Firework;
use gate::{Dismissal, DismissalGate};
use particle::Particle;
use random::{FastRng, RandomSource};
use rose::GrowingRose;
use surface::Surface;

/// Translucent overlay painted every frame; leaves fading motion trails.
pub const FADE_OVERLAY: &str = "rgba(0,0,10,0.2)";

/// Logical (CSS pixel) drawing area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }
}

// --- Frame pacing --------------------------------------------------------------

/// Optional frame-rate ceiling on top of `requestAnimationFrame`.
#[derive(Clone, Debug)]
pub struct FrameThrottle {
    min_interval_ms: f64,
    last_ms: Option<f64>,
}

impl FrameThrottle {
    const SLACK_MS: f64 = 1.0; // tolerate rAF timestamp jitter

    pub fn new(target_fps: Option<f64>) -> Self {
        let min_interval_ms = target_fps
            .filter(|f| *f > 0.0)
            .map(|f| 1000.0 / f)
            .unwrap_or(0.0);
        Self {
            min_interval_ms,
            last_ms: None,
        }
    }

    /// True if a frame should be rendered at `now`.
    pub fn ready(&mut self, now: f64) -> bool {
        if self.min_interval_ms <= 0.0 {
            return true;
        }
        match self.last_ms {
            Some(last) if now - last + Self::SLACK_MS < self.min_interval_ms => false,
            _ => {
                self.last_ms = Some(now);
                true
            }
        }
    }

    /// Forget the last frame time (after the loop lapsed).
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

// --- Scene ---------------------------------------------------------------------

pub struct Scene<R: RandomSource = FastRng> {
    config: SceneConfig,
    viewport: Viewport,
    rng: R,
    fireworks: Vec<Firework>,
    particles: Vec<Particle>,
    roses: Vec<GrowingRose>,
    rose_queue: VecDeque<f64>, // planting times (ms) of roses not yet created
    gate: DismissalGate,
    launched: bool, // start() happened (one-shot)
    running: bool,  // cleared while the page is hidden
    frames: u64,
}

impl<R: RandomSource> Scene<R> {
    pub fn new(config: SceneConfig, viewport: Viewport, rng: R, card_count: usize) -> Self {
        Self {
            config: config.validate(),
            viewport,
            rng,
            fireworks: Vec::new(),
            particles: Vec::new(),
            roses: Vec::new(),
            rose_queue: VecDeque::new(),
            gate: DismissalGate::new(card_count),
            launched: false,
            running: false,
            frames: 0,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
    pub fn roses(&self) -> &[GrowingRose] {
        &self.roses
    }
    pub fn gate(&self) -> &DismissalGate {
        &self.gate
    }
    pub fn frames(&self) -> u64 {
        self.frames
    }
    /// Roses scheduled but not yet planted.
    pub fn pending_roses(&self) -> usize {
        self.rose_queue.len()
    }

    pub fn is_started(&self) -> bool {
        self.running
    }

    /// Whether the frame loop has anything left to do. Roses never die, so
    /// only the started flag and in-flight bursts keep the loop alive.
    pub fn is_active(&self) -> bool {
        self.running || !self.fireworks.is_empty() || !self.particles.is_empty()
    }

    /// Record a card dismissal; the last distinct card starts the scene.
    pub fn dismiss(&mut self, card: usize, now: f64) -> Dismissal {
        let outcome = self.gate.dismiss(card);
        match outcome {
            Dismissal::Ignored => log::debug!("dismissal of card {card} ignored"),
            Dismissal::Counted { remaining } => {
                log::debug!("card {card} dismissed, {remaining} left")
            }
            Dismissal::Completed => {
                log::info!("all {} cards dismissed", self.gate.card_count());
                self.start(now);
            }
        }
        outcome
    }

    /// Start spawning and schedule the rose bed. Only the first call does anything.
    pub fn start(&mut self, now: f64) -> bool {
        if self.launched {
            return false;
        }
        self.launched = true;
        self.running = true;
        let (min, max) = (self.config.rose_count_min, self.config.rose_count_max);
        let count = self.rng.range_usize(min, max);
        let stagger = self.config.rose_stagger_ms;
        self.rose_queue = (0..count).map(|i| now + i as f64 * stagger).collect();
        log::info!(
            "scene started: {count} roses, {}x{} viewport",
            self.viewport.width,
            self.viewport.height
        );
        true
    }

    /// Page hidden: stop spawning so the frame loop can lapse.
    pub fn pause(&mut self) {
        if self.running {
            log::debug!("scene paused");
        }
        self.running = false;
    }

    /// Page visible again. Returns true if the scene was started before and is
    /// now running again.
    pub fn resume(&mut self) -> bool {
        if !self.launched || self.running {
            return false;
        }
        self.running = true;
        log::debug!("scene resumed");
        true
    }

    pub fn resize(&mut self, viewport: Viewport) {
        log::debug!(
            "viewport resized to {}x{}",
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
    }

    /// Spawn-timer tick: launch one firework unless paused or at capacity.
    pub fn spawn_tick(&mut self) -> bool {
        if !self.running || self.fireworks.len() >= self.config.max_fireworks {
            return false;
        }
        let fw = Firework::launch(&mut self.rng, self.viewport, &self.config);
        self.launch(fw)
    }

    /// Add a firework if the live count is below the cap.
    pub fn launch(&mut self, firework: Firework) -> bool {
        if self.fireworks.len() >= self.config.max_fireworks {
            return false;
        }
        self.fireworks.push(firework);
        true
    }

    /// Emergency valve: past 1.5x the cap, drop the oldest particles down to
    /// exactly the cap. Returns the number dropped.
    pub fn trim_particles(&mut self) -> usize {
        let cap = self.config.max_particles;
        if self.particles.len() <= self.config.particle_trim_threshold() {
            return 0;
        }
        let excess = self.particles.len() - cap;
        self.particles.drain(..excess);
        log::warn!("particle storm: trimmed {excess} oldest particles");
        excess
    }

    /// One animation frame: fade, plant due roses, trim, then advance, draw
    /// and prune every entity.
    pub fn step(&mut self, surface: &mut dyn Surface, now: f64) {
        self.frames += 1;
        surface.set_alpha(1.0);
        surface.set_fill(FADE_OVERLAY);
        surface.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);

        self.plant_due_roses(now);
        self.trim_particles();

        let Self {
            config,
            viewport,
            rng,
            fireworks,
            particles,
            roses,
            ..
        } = self;

        fireworks.retain_mut(|fw| {
            if fw.update() {
                fw.explode(&mut *rng, config, particles);
                false
            } else {
                fw.draw(surface);
                true
            }
        });

        let flower_points = config.flower_points;
        particles.retain_mut(|p| {
            p.update();
            if p.is_alive() {
                p.draw(surface, flower_points);
                true
            } else {
                false
            }
        });

        for rose in roses.iter_mut() {
            rose.update(&mut *rng, *viewport, config);
            rose.draw(surface, config);
        }
    }

    /// Plant at most one rose per frame. A late planting (hidden page, stalled
    /// loop) pushes the rest of the queue back by the same lag, so the stagger
    /// between roses survives the gap.
    fn plant_due_roses(&mut self, now: f64) {
        let Some(&due) = self.rose_queue.front() else {
            return;
        };
        if due > now {
            return;
        }
        self.rose_queue.pop_front();
        let lag = now - due;
        if lag > 0.0 {
            self.rose_queue.iter_mut().for_each(|later| *later += lag);
        }
        let rose = GrowingRose::new(&mut self.rng, self.viewport, &self.config);
        self.roses.push(rose);
    }
}
