//! Fluid particle storage for the PBF solver.

use glam::Vec3;
use rayon::prelude::*;

use crate::grid::SpatialGrid3D;

/// A primary fluid particle.
///
/// `position` is the last settled position, authoritative for rendering
/// and velocity derivation; `predicted` is the working value the
/// constraint solver corrects during a step.
#[derive(Clone, Copy, Debug)]
pub struct Particle3D {
    pub position: Vec3,
    pub predicted: Vec3,
    pub velocity: Vec3,
}

impl Particle3D {
    /// Create a particle at the given position with initial velocity.
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            predicted: position,
            velocity,
        }
    }

    /// Create a stationary particle at the given position.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO)
    }
}

/// Contiguous fluid particle arena.
///
/// Each particle keeps its slot for the frame's duration, so neighbor
/// relationships are plain slot indices. The lists live beside the
/// particles, are rebuilt from scratch every frame, and are never
/// carried across frames.
pub struct Particles3D {
    pub list: Vec<Particle3D>,
    /// Per-slot neighbor indices within the smoothing radius. Never
    /// contains the owning slot.
    pub neighbors: Vec<Vec<usize>>,
}

impl Particles3D {
    /// Create an empty particle collection.
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    /// Create with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: Vec::with_capacity(capacity),
            neighbors: Vec::with_capacity(capacity),
        }
    }

    /// Add a particle with the given position and velocity.
    pub fn spawn(&mut self, position: Vec3, velocity: Vec3) {
        self.list.push(Particle3D::new(position, velocity));
        self.neighbors.push(Vec::new());
    }

    /// Add a stationary particle.
    pub fn spawn_at(&mut self, position: Vec3) {
        self.spawn(position, Vec3::ZERO);
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Rebuild every neighbor list from predicted positions.
    ///
    /// Candidates come from the grid's 27-cell neighborhood around each
    /// particle and are filtered to Euclidean distance <= `h`
    /// (inclusive), excluding the particle's own slot. Lists are staged
    /// in parallel from a frozen snapshot of the positions and committed
    /// once all are complete.
    pub fn rebuild_neighbors(&mut self, grid: &SpatialGrid3D, h: f32) {
        let lists: Vec<Vec<usize>> = {
            let list = &self.list;
            list.par_iter()
                .enumerate()
                .map(|(i, p)| {
                    let mut found = Vec::new();
                    for j in grid.neighborhood(p.predicted) {
                        if j != i
                            && list[j].predicted.distance_squared(p.predicted) <= h * h
                        {
                            found.push(j);
                        }
                    }
                    found
                })
                .collect()
        };
        self.neighbors = lists;
    }
}

impl Default for Particles3D {
    fn default() -> Self {
        Self::new()
    }
}
