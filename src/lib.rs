//! Petalfire core crate.
//!
//! A stack of dismissible cards hides a finale: once the last card is gone the
//! page fills with firework bursts while a bed of roses grows up from the
//! bottom edge and sways in the wind. The animation engine lives in [`scene`]
//! and runs natively (tests) or in the browser; [`web`] is the DOM glue used by
//! the exported `start*` functions.

use wasm_bindgen::prelude::*;

pub mod error;
pub mod scene;
mod web;

pub use error::SetupError;
pub use scene::config::SceneConfig;
pub use scene::firework::Firework;
pub use scene::gate::{Dismissal, DismissalGate};
pub use scene::particle::{BurstShape, Particle};
pub use scene::random::{FastRng, RandomSource};
pub use scene::rose::{GrowingRose, Leaf, RosePhase};
pub use scene::surface::{Hsl, RadialFill, Surface};
pub use scene::{FrameThrottle, Scene, Viewport};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("petalfire module loaded");
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Wire the cards and canvas using the preset matching this device.
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    let user_agent = web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default();
    let mobile = scene::config::is_mobile_user_agent(&user_agent);
    log::info!("starting with {} preset", if mobile { "mobile" } else { "desktop" });
    web::launch(SceneConfig::for_device(mobile))?;
    Ok(())
}

/// Like [`start`] but with an explicit JSON configuration (unset fields use the
/// desktop preset).
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_with_config(json: &str) -> Result<(), JsValue> {
    let config = SceneConfig::from_json(json)?;
    web::launch(config)?;
    Ok(())
}

#[wasm_bindgen]
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    scene::config::is_mobile_user_agent(user_agent)
}
