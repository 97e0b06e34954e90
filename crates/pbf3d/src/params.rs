//! Unified tuning parameters for the PBF pipeline.
//!
//! All simulation modules read these instead of defining their own
//! constants. This prevents drift between subsystems, keeps multiple
//! simulation instances independent, and makes deterministic replay
//! possible.
//!
//! The defaults are tuned for visual plausibility, not validated
//! physics.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Every tunable of the simulation, passed explicitly to each phase.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SimParams {
    /// Fixed time step (s). One `update` call advances exactly this much.
    pub dt: f32,
    /// External gravity acceleration.
    pub gravity: Vec3,
    /// Constraint solver iterations per step.
    pub solver_iterations: usize,
    /// Smoothing radius H: maximum kernel interaction distance.
    pub h: f32,
    /// Interaction radius for foam classification and velocity sampling.
    pub fh: f32,
    /// Rest density the solver drives local density toward.
    pub rest_density: f32,
    /// Relaxation epsilon in the lambda denominator; keeps nearly
    /// isolated particles from producing unbounded corrections.
    pub epsilon_lambda: f32,
    /// Vorticity confinement strength.
    pub epsilon_vorticity: f32,
    /// XSPH viscosity coefficient.
    pub xsph_c: f32,
    /// Tensile-instability (artificial pressure) strength.
    pub scorr_k: f32,
    /// Reference distance of the tensile correction, as a fraction of H.
    pub scorr_dq_scale: f32,
    /// Seconds a settled foam particle lives.
    pub foam_lifetime: f32,
    /// Trapped-air potential above which a fluid particle emits foam.
    pub foam_potential_threshold: f32,
    /// Foam particles emitted per qualifying fluid particle per frame.
    pub foam_emission: usize,
    /// Fluid neighbor count at or above which a secondary particle
    /// classifies as Foam rather than Spray.
    pub foam_neighbor_threshold: usize,
    /// Seed for the foam emission jitter.
    pub foam_seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: 0.0083,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            solver_iterations: 4,
            h: 0.1,
            fh: 0.1,
            rest_density: 6378.0,
            epsilon_lambda: 600.0,
            epsilon_vorticity: 0.0001,
            xsph_c: 0.01,
            scorr_k: 0.00001,
            scorr_dq_scale: 0.3,
            foam_lifetime: 1.0,
            foam_potential_threshold: 1.0,
            foam_emission: 30,
            foam_neighbor_threshold: 8,
            foam_seed: 0,
        }
    }
}

impl SimParams {
    /// Poly6 normalization constant for this smoothing radius.
    pub fn poly6_coefficient(&self) -> f32 {
        315.0 / (64.0 * PI * self.h.powi(9))
    }

    /// Poly6 evaluated at the tensile-correction reference distance
    /// `scorr_dq_scale * h`.
    pub fn w_delta_q(&self) -> f32 {
        let dq = self.scorr_dq_scale * self.h;
        self.poly6_coefficient() * (self.h * self.h - dq * dq).powi(3)
    }
}
