//! Vorticity confinement and XSPH viscosity.
//!
//! Both corrections read velocities as they stood after the post-solve
//! velocity recompute; callers stage the returned deltas and commit them
//! in a separate pass so no particle observes a half-updated neighbor.

use glam::Vec3;
use rayon::prelude::*;

use crate::kernels;
use crate::params::SimParams;
use crate::particle::Particles3D;

/// Local angular velocity estimate
/// `omega_i = sum_j (v_j - v_i) x gradW_spiky`.
fn angular_velocity(i: usize, particles: &Particles3D, params: &SimParams) -> Vec3 {
    let p = &particles.list[i];
    let mut omega = Vec3::ZERO;
    for &j in &particles.neighbors[i] {
        let n = &particles.list[j];
        let velocity_diff = n.velocity - p.velocity;
        let gradient = kernels::spiky_gradient(p.predicted, n.predicted, params.h);
        omega += velocity_diff.cross(gradient);
    }
    omega
}

/// Location gradient pointing toward higher vorticity.
fn eta(i: usize, particles: &Particles3D, params: &SimParams, vorticity_mag: f32) -> Vec3 {
    let p = &particles.list[i];
    let mut eta = Vec3::ZERO;
    for &j in &particles.neighbors[i] {
        eta += kernels::spiky_gradient(p.predicted, particles.list[j].predicted, params.h)
            * vorticity_mag;
    }
    eta
}

/// Corrective force re-injecting the rotational energy the discrete
/// solver damps out.
///
/// Returns zero whenever a direction cannot be established: no local
/// rotation, an isolated particle, cancelling eta contributions, or a
/// non-finite normalization.
pub fn vorticity_force(i: usize, particles: &Particles3D, params: &SimParams) -> Vec3 {
    let omega = angular_velocity(i, particles, params);
    let omega_mag = omega.length();
    if omega_mag == 0.0 {
        return Vec3::ZERO;
    }

    let eta = eta(i, particles, params, omega_mag);
    if eta == Vec3::ZERO {
        return Vec3::ZERO;
    }

    let n = eta.normalize();
    if !n.is_finite() {
        return Vec3::ZERO;
    }

    n.cross(omega) * params.epsilon_vorticity
}

/// XSPH smoothing pulling a particle's velocity toward its neighborhood
/// average: `C * sum_j (v_j - v_i) * W_poly6`.
pub fn xsph_viscosity(i: usize, particles: &Particles3D, params: &SimParams) -> Vec3 {
    let p = &particles.list[i];
    let mut viscosity = Vec3::ZERO;
    for &j in &particles.neighbors[i] {
        let n = &particles.list[j];
        viscosity += (n.velocity - p.velocity) * kernels::poly6(p.predicted, n.predicted, params.h);
    }
    viscosity * params.xsph_c
}

/// Staged per-particle velocity corrections for one frame: vorticity
/// confinement plus XSPH viscosity, both scaled by dt.
pub fn velocity_corrections(particles: &Particles3D, params: &SimParams) -> Vec<Vec3> {
    (0..particles.len())
        .into_par_iter()
        .map(|i| {
            (vorticity_force(i, particles, params) + xsph_viscosity(i, particles, params))
                * params.dt
        })
        .collect()
}
