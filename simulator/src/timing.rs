//! Timing constants for the simulator.

use std::time::Duration;

/// Target frame time (~50 FPS). The main loop sleeps if a frame completes early.
pub const FRAME_TIME: Duration = Duration::from_millis(20);

/// How long a key-press notice stays on screen.
pub const POPUP_DURATION: Duration = Duration::from_secs(2);

/// Simulated hours that pass per real second.
pub const SIM_HOURS_PER_SECOND: f32 = 0.25;

/// Upper bound on waiting for the tween engine at startup.
pub const ENGINE_TIMEOUT: Duration = Duration::from_secs(2);
