//! Drift Pong - a drag-limited ping-pong rally simulator
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, collisions, rally state)
//! - `config`: Immutable physics, table, and serve configuration
//!
//! Rendering and input stay outside the crate: a driver implements
//! [`sim::RenderSink`] for notifications and feeds a [`sim::TickInput`]
//! once per tick.

pub mod config;
pub mod sim;

pub use config::{ConfigError, SimConfig};
pub use sim::{Session, TickInput};

/// Mapping between world coordinates (meters, origin at the bottom-left)
/// and screen coordinates (pixels, origin at the top-left)
#[derive(Debug, Clone, Copy)]
pub struct ScreenMap {
    /// Pixels per meter
    pub scale: f64,
    /// Screen height in pixels; world y = 0 maps here
    pub height_px: f64,
}

impl ScreenMap {
    pub fn new(scale: f64, height_px: f64) -> Self {
        Self { scale, height_px }
    }

    /// Fit a table of the given height (m) into `height_px` pixels
    pub fn for_table(table_height: f64, height_px: f64) -> Self {
        Self {
            scale: height_px / table_height,
            height_px,
        }
    }

    #[inline]
    pub fn to_screen_x(&self, x: f64) -> f64 {
        self.scale * x
    }

    #[inline]
    pub fn to_screen_y(&self, y: f64) -> f64 {
        self.height_px - y * self.scale
    }

    #[inline]
    pub fn to_world_x(&self, screen_x: f64) -> f64 {
        screen_x / self.scale
    }

    #[inline]
    pub fn to_world_y(&self, screen_y: f64) -> f64 {
        (self.height_px - screen_y) / self.scale
    }
}
