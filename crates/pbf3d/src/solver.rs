//! Iterative density-constraint (pressure) solver.
//!
//! Jacobi-style position correction: each iteration computes a Lagrange
//! multiplier per particle from the density constraint, then a position
//! correction, then commits the corrections. Every pass reads state as
//! it stood at the start of the pass; values consumed across particles
//! are staged in per-pass buffers, so the parallel phases stay
//! race-free and the commit is a hard phase barrier.

use glam::Vec3;
use rayon::prelude::*;

use crate::kernels;
use crate::params::SimParams;
use crate::particle::Particles3D;

/// Deviation of a particle's local density from rest, normalized:
/// `C = (sum_j W_poly6) / rho0 - 1`. Zero exactly at rest density; -1
/// for an isolated particle.
pub fn density_constraint(i: usize, particles: &Particles3D, params: &SimParams) -> f32 {
    let p = &particles.list[i];
    let mut sum = 0.0;
    for &j in &particles.neighbors[i] {
        sum += kernels::poly6(p.predicted, particles.list[j].predicted, params.h);
    }
    sum / params.rest_density - 1.0
}

/// Lagrange multiplier `lambda_i = -C_i / (sum |grad C|^2 + eps)`.
///
/// The gradient sum accumulates the squared per-neighbor gradients plus
/// the squared total gradient with respect to the particle itself. The
/// epsilon keeps an isolated particle finite (lambda = 1/eps).
pub fn lambda(i: usize, particles: &Particles3D, params: &SimParams) -> f32 {
    let p = &particles.list[i];
    let constraint = density_constraint(i, particles, params);

    let mut gradient_i = Vec3::ZERO;
    let mut sum_gradients = 0.0;
    for &j in &particles.neighbors[i] {
        let gradient_j =
            kernels::spiky_gradient(p.predicted, particles.list[j].predicted, params.h)
                / params.rest_density;
        sum_gradients += gradient_j.length_squared();
        gradient_i += gradient_j;
    }
    sum_gradients += gradient_i.length_squared();

    -constraint / (sum_gradients + params.epsilon_lambda)
}

/// Artificial-pressure term suppressing tensile clumping:
/// `-k * (W_poly6(pi, pj) / W(dq))^4`.
fn tensile_correction(pi: Vec3, pj: Vec3, w_dq: f32, params: &SimParams) -> f32 {
    let ratio = kernels::poly6(pi, pj, params.h) / w_dq;
    -params.scorr_k * ratio.powi(4)
}

/// Run the configured number of constraint iterations over predicted
/// positions. Neighbor lists must already be rebuilt for this frame.
pub fn solve(particles: &mut Particles3D, params: &SimParams) {
    let w_dq = params.w_delta_q();

    for _ in 0..params.solver_iterations {
        // Lambda pass, staged so the correction pass reads a consistent
        // snapshot.
        let lambdas: Vec<f32> = {
            let ps: &Particles3D = particles;
            (0..ps.len())
                .into_par_iter()
                .map(|i| lambda(i, ps, params))
                .collect()
        };

        // Correction pass.
        let deltas: Vec<Vec3> = {
            let ps: &Particles3D = particles;
            let lambdas = &lambdas;
            (0..ps.len())
                .into_par_iter()
                .map(|i| {
                    let p = &ps.list[i];
                    let mut delta = Vec3::ZERO;
                    for &j in &ps.neighbors[i] {
                        let pj = ps.list[j].predicted;
                        let scorr = tensile_correction(p.predicted, pj, w_dq, params);
                        delta += kernels::spiky_gradient(p.predicted, pj, params.h)
                            * (lambdas[i] + lambdas[j] + scorr);
                    }
                    delta / params.rest_density
                })
                .collect()
        };

        // Commit.
        particles
            .list
            .par_iter_mut()
            .zip(deltas)
            .for_each(|(p, delta)| p.predicted += delta);
    }
}

/// Local density estimate per particle (`sum_j W_poly6`), staged for the
/// foam generation dampening term.
pub fn compute_densities(particles: &Particles3D, params: &SimParams) -> Vec<f32> {
    particles
        .list
        .par_iter()
        .enumerate()
        .map(|(i, p)| {
            particles.neighbors[i]
                .iter()
                .map(|&j| kernels::poly6(p.predicted, particles.list[j].predicted, params.h))
                .sum()
        })
        .collect()
}
