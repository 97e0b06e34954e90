//! Axis-aligned domain bounds and particle containment.
//!
//! The domain is a box with one corner at the origin. Collisions with
//! the walls are fully inelastic per axis: a coordinate at or beyond a
//! bound zeroes that axis's velocity component, then the coordinate is
//! clamped strictly inside the box. Clamping runs before every grid
//! query, so a particle can never index outside the grid.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Margin keeping clamped coordinates strictly inside the domain, so
/// kernel evaluation never sees an exact-boundary coordinate.
pub const WALL_MARGIN: f32 = 0.001;

/// Simulation box extents.
///
/// Width animates as a moving wall after a warm-up period; height and
/// depth are constant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DomainBounds {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Resting (maximum) width the wall returns to.
    pub base_width: f32,
    /// Frames before the wall starts moving.
    pub warmup_frames: u32,
    /// Peak distance the wall travels inward.
    pub wall_travel: f32,
}

impl Default for DomainBounds {
    fn default() -> Self {
        Self {
            width: 5.0,
            height: 8.0,
            depth: 3.0,
            base_width: 5.0,
            warmup_frames: 400,
            wall_travel: 3.0,
        }
    }
}

impl DomainBounds {
    /// Extents the spatial grid must cover. The wall only moves inward,
    /// so the base width is the maximum.
    pub fn max_extents(&self) -> Vec3 {
        Vec3::new(self.base_width, self.height, self.depth)
    }

    /// Advance the moving wall for the given frame counter.
    ///
    /// After the warm-up the wall oscillates inward and back:
    /// `width = base - travel * |sin((frame - warmup) * dt / 1.25 * pi/2)|`.
    pub fn advance(&mut self, frame: u32, dt: f32) {
        if frame >= self.warmup_frames {
            let t = (frame - self.warmup_frames) as f32 * (dt / 1.25) * 0.5 * PI;
            self.width = self.base_width - self.wall_travel * t.sin().abs();
        }
    }

    /// Contain a position inside the box, zeroing the velocity component
    /// of any axis that hit a wall. Idempotent for in-range positions.
    pub fn constrain(&self, position: &mut Vec3, velocity: &mut Vec3) {
        if out_of_range(position.x, self.width) {
            velocity.x = 0.0;
        }
        if out_of_range(position.y, self.height) {
            velocity.y = 0.0;
        }
        if out_of_range(position.z, self.depth) {
            velocity.z = 0.0;
        }

        position.x = clamp_coord(position.x, self.width);
        position.y = clamp_coord(position.y, self.height);
        position.z = clamp_coord(position.z, self.depth);
    }
}

fn out_of_range(x: f32, bound: f32) -> bool {
    x <= 0.0 || x >= bound
}

/// Clamp one coordinate strictly inside `(0, bound)`.
fn clamp_coord(x: f32, bound: f32) -> f32 {
    if x <= 0.0 {
        WALL_MARGIN
    } else if x >= bound {
        bound - WALL_MARGIN
    } else {
        x
    }
}
