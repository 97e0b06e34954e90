//! 3D Position Based Fluids with a whitewater pass.
//!
//! A real-time implementation of the PBF method (Macklin & Müller,
//! "Position Based Fluids", 2013): particles are advected, iteratively
//! corrected toward a constant rest density, post-processed with
//! vorticity confinement and XSPH viscosity, and enriched with a
//! secondary foam/spray particle system driven by the fluid's velocity
//! and density fields. Each `update` call advances exactly one fixed
//! time step and publishes position buffers for an external renderer.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use pbf3d::{DomainBounds, PbfSimulation3D, SimParams};
//!
//! let mut sim = PbfSimulation3D::new(SimParams::default(), DomainBounds::default());
//!
//! // A small block of fluid above the floor
//! for i in 0..3 {
//!     for j in 0..3 {
//!         for k in 0..3 {
//!             sim.spawn_particle(Vec3::new(
//!                 1.0 + i as f32 * 0.05,
//!                 1.0 + j as f32 * 0.05,
//!                 1.0 + k as f32 * 0.05,
//!             ));
//!         }
//!     }
//! }
//!
//! sim.update();
//! assert_eq!(sim.fluid_positions().len(), 27);
//! ```

pub mod boundary;
pub mod foam;
pub mod grid;
pub mod kernels;
pub mod params;
pub mod particle;
pub mod solver;
pub mod vorticity;

pub use boundary::DomainBounds;
pub use foam::{Foam3D, FoamKind, FoamParticle3D};
pub use glam::{Vec3, Vec4};
pub use grid::SpatialGrid3D;
pub use params::SimParams;
pub use particle::{Particle3D, Particles3D};

use log::debug;
use rayon::prelude::*;

/// 3D PBF fluid simulation with secondary whitewater.
pub struct PbfSimulation3D {
    pub params: SimParams,
    pub bounds: DomainBounds,
    /// Primary fluid particles.
    pub particles: Particles3D,
    /// Secondary foam/spray particles.
    pub foam: Foam3D,

    grid: SpatialGrid3D,
    fluid_positions: Vec<Vec3>,
    foam_records: Vec<Vec4>,

    /// Current simulation frame.
    frame: u32,
}

impl PbfSimulation3D {
    /// Create an empty simulation over the given domain.
    pub fn new(params: SimParams, bounds: DomainBounds) -> Self {
        let grid = SpatialGrid3D::new(bounds.max_extents(), params.h);
        Self {
            foam: Foam3D::new(params.foam_seed),
            params,
            bounds,
            particles: Particles3D::new(),
            grid,
            fluid_positions: Vec::new(),
            foam_records: Vec::new(),
            frame: 0,
        }
    }

    /// Spawn a fluid particle at the given position with zero velocity.
    pub fn spawn_particle(&mut self, position: Vec3) {
        self.particles.spawn_at(position);
    }

    /// Spawn a fluid particle with the given position and velocity.
    pub fn spawn_particle_with_velocity(&mut self, position: Vec3, velocity: Vec3) {
        self.particles.spawn(position, velocity);
    }

    /// Seed the default dam-break block: a 0.05-spaced lattice over
    /// [0,2) x [0,2) x [0.5,2.5).
    pub fn seed_default_block(&mut self) {
        let spacing = 0.05;
        for i in 0..40 {
            for j in 0..40 {
                for k in 0..40 {
                    self.spawn_particle(Vec3::new(
                        i as f32 * spacing,
                        j as f32 * spacing,
                        0.5 + k as f32 * spacing,
                    ));
                }
            }
        }
    }

    /// Total fluid particle count.
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Current simulation frame.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advance the simulation by exactly one fixed time step.
    pub fn update(&mut self) {
        self.frame += 1;
        self.bounds.advance(self.frame, self.params.dt);

        let params = self.params;
        let bounds = self.bounds;

        // 1. Integrate external forces, predict positions, contain.
        self.particles.list.par_iter_mut().for_each(|p| {
            p.velocity += params.gravity * params.dt;
            p.predicted = p.position + p.velocity * params.dt;
            bounds.constrain(&mut p.predicted, &mut p.velocity);
        });

        // 2. Rebuild the grid and the per-particle neighbor lists from
        //    the predicted positions.
        self.grid.rebuild(&self.particles);
        self.particles.rebuild_neighbors(&self.grid, params.h);

        // 3. Iterative density-constraint solve on predicted positions.
        solver::solve(&mut self.particles, &params);

        // 4. Contain the corrected positions and derive velocities from
        //    the per-step displacement: pressure corrections become
        //    velocity here, not the other way around.
        self.particles.list.par_iter_mut().for_each(|p| {
            bounds.constrain(&mut p.predicted, &mut p.velocity);
            p.velocity = (p.predicted - p.position) / params.dt;
        });

        // 5. Staged vorticity confinement + XSPH viscosity, committed
        //    together, then the corrected position becomes authoritative.
        let corrections = vorticity::velocity_corrections(&self.particles, &params);
        self.particles
            .list
            .par_iter_mut()
            .zip(corrections)
            .for_each(|(p, dv)| {
                p.velocity += dv;
                p.position = p.predicted;
            });

        // 6. Publish fluid positions.
        self.fluid_positions.clear();
        self.fluid_positions
            .extend(self.particles.list.iter().map(|p| p.position));

        // 7. Whitewater: age out, reclassify + advect, regenerate from
        //    the fresh density field.
        let retired = self.foam.retire_expired(params.dt);
        self.foam
            .classify_and_advect(&self.particles, &self.grid, &bounds, &params);
        let densities = solver::compute_densities(&self.particles, &params);
        let emitted = self
            .foam
            .generate(&self.particles, &densities, &self.grid, &bounds, &params);
        if retired > 0 || emitted > 0 {
            debug!(
                "frame {}: foam +{} -{} ({} alive)",
                self.frame,
                emitted,
                retired,
                self.foam.len()
            );
        }

        // 8. Publish foam records.
        self.foam.render_records(&params, &mut self.foam_records);
    }

    /// Fluid particle positions for the renderer; valid until the next
    /// `update`.
    pub fn fluid_positions(&self) -> &[Vec3] {
        &self.fluid_positions
    }

    /// Foam render records (xyz plus a packed kind/age scalar); valid
    /// until the next `update`.
    pub fn foam_records(&self) -> &[Vec4] {
        &self.foam_records
    }
}
