//! Tuning record for the scene and the coarse device probe that picks it.
//!
//! Desktop and mobile differ only in numbers: population caps, burst sizes,
//! trail length and how much detail goes into each rose. The record is chosen
//! once at startup and handed to [`super::Scene::new`].

/// Ceilings enforced by [`SceneConfig::validate`]. Values above these either
/// overflow size arithmetic or cannot be drawn at frame rate anyway.
pub const MAX_FIREWORKS: usize = 64;
pub const MAX_PARTICLES: usize = 20_000;
pub const MAX_TRAIL_LENGTH: usize = 256;
pub const MAX_FLOWER_POINTS: usize = 32;
pub const MAX_PETAL_LAYERS: usize = 8;
pub const MAX_PETALS: usize = 32;
pub const MAX_ROSES: usize = 64;
pub const MAX_ROSE_STAGGER_MS: f64 = 60_000.0;
pub const MIN_SPAWN_INTERVAL_MS: u32 = 16;
pub const MAX_SPAWN_INTERVAL_MS: u32 = 60_000;
pub const MAX_DPR: f64 = 4.0;

/// Per-device tuning constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneConfig {
    /// Live fireworks allowed at once; spawn ticks above this are no-ops.
    pub max_fireworks: usize,
    /// Live particles allowed at once (bursts are truncated here).
    pub max_particles: usize,
    pub burst_min: usize,
    pub burst_max: usize, // inclusive
    pub trail_length: usize,
    /// Points on a "flower" particle's star polygon.
    pub flower_points: usize,
    pub petal_layers: usize,
    pub outer_petals: usize,
    pub inner_petals: usize,
    /// Radial gradient on outer petals (flat fill when false).
    pub petal_gradient: bool,
    pub rose_count_min: usize,
    pub rose_count_max: usize, // inclusive
    pub rose_stagger_ms: f64,
    pub spawn_interval_ms: u32,
    /// Upper bound applied to `window.devicePixelRatio` when sizing the canvas.
    pub max_dpr: f64,
    /// Frame-rate ceiling for the render loop; `None` renders every animation frame.
    pub target_fps: Option<f64>,
}

impl SceneConfig {
    pub fn desktop() -> Self {
        Self {
            max_fireworks: 5,
            max_particles: 800,
            burst_min: 30,
            burst_max: 49,
            trail_length: 10,
            flower_points: 5,
            petal_layers: 3,
            outer_petals: 8,
            inner_petals: 5,
            petal_gradient: true,
            rose_count_min: 8,
            rose_count_max: 12,
            rose_stagger_ms: 500.0,
            spawn_interval_ms: 600,
            max_dpr: 2.0,
            target_fps: None,
        }
    }

    pub fn mobile() -> Self {
        Self {
            max_fireworks: 3,
            max_particles: 300,
            burst_min: 15,
            burst_max: 24,
            trail_length: 6,
            flower_points: 4,
            petal_layers: 2,
            outer_petals: 6,
            inner_petals: 3,
            petal_gradient: false,
            rose_count_min: 4,
            rose_count_max: 6,
            rose_stagger_ms: 500.0,
            spawn_interval_ms: 900,
            max_dpr: 1.5,
            target_fps: None,
        }
    }

    pub fn for_device(is_mobile: bool) -> Self {
        if is_mobile {
            Self::mobile()
        } else {
            Self::desktop()
        }
    }

    /// Parse a JSON override; missing fields fall back to the desktop preset.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, crate::error::SetupError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| crate::error::SetupError::Config(e.to_string()))?;
        Ok(cfg.validate())
    }

    /// Normalize values that would make the scene misbehave: empty ranges,
    /// zero-sized caps, sub-unit DPR, and anything past the ceilings above.
    pub fn validate(mut self) -> Self {
        self.max_fireworks = self.max_fireworks.min(MAX_FIREWORKS);
        self.max_particles = self.max_particles.clamp(1, MAX_PARTICLES);
        self.burst_min = self.burst_min.min(MAX_PARTICLES);
        self.burst_max = self.burst_max.min(MAX_PARTICLES);
        if self.burst_min > self.burst_max {
            std::mem::swap(&mut self.burst_min, &mut self.burst_max);
        }
        self.trail_length = self.trail_length.clamp(1, MAX_TRAIL_LENGTH);
        self.flower_points = self.flower_points.clamp(3, MAX_FLOWER_POINTS);
        self.petal_layers = self.petal_layers.clamp(1, MAX_PETAL_LAYERS);
        self.outer_petals = self.outer_petals.min(MAX_PETALS);
        self.inner_petals = self.inner_petals.min(MAX_PETALS);
        self.rose_count_min = self.rose_count_min.min(MAX_ROSES);
        self.rose_count_max = self.rose_count_max.min(MAX_ROSES);
        if self.rose_count_min > self.rose_count_max {
            std::mem::swap(&mut self.rose_count_min, &mut self.rose_count_max);
        }
        self.rose_stagger_ms = if self.rose_stagger_ms.is_nan() {
            0.0
        } else {
            self.rose_stagger_ms.clamp(0.0, MAX_ROSE_STAGGER_MS)
        };
        self.spawn_interval_ms =
            self.spawn_interval_ms.clamp(MIN_SPAWN_INTERVAL_MS, MAX_SPAWN_INTERVAL_MS);
        self.max_dpr = if self.max_dpr.is_nan() {
            1.0
        } else {
            self.max_dpr.clamp(1.0, MAX_DPR)
        };
        self.target_fps = self.target_fps.filter(|fps| *fps > 0.0);
        self
    }

    /// Emergency-trim threshold: 1.5x the particle cap.
    pub fn particle_trim_threshold(&self) -> usize {
        self.max_particles.saturating_add(self.max_particles / 2)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

const MOBILE_MARKERS: &[&str] = &[
    "android", "webos", "iphone", "ipad", "ipod", "blackberry", "iemobile", "opera mini", "mobi",
];

/// Coarse mobile classification from a `navigator.userAgent` string.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_MARKERS.iter().any(|m| ua.contains(m))
}
