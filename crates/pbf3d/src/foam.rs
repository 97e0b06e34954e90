//! Secondary foam/spray ("whitewater") particles.
//!
//! Foam particles never interact with each other; they sample the fluid
//! field through the same grid the solver uses. The collection owns its
//! particles outright and is only appended to or culled outside the
//! parallel sections.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f32::consts::PI;

use crate::boundary::DomainBounds;
use crate::grid::SpatialGrid3D;
use crate::kernels;
use crate::params::SimParams;
use crate::particle::Particles3D;

/// Classification of a secondary particle, re-evaluated every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoamKind {
    /// Sparsely surrounded: ballistic, does not age.
    Spray,
    /// Densely surrounded: fluid-coupled, ages out.
    Foam,
}

impl FoamKind {
    /// Numeric code used in the packed render record.
    fn code(self) -> f32 {
        match self {
            FoamKind::Spray => 1.0,
            FoamKind::Foam => 2.0,
        }
    }
}

/// A single foam particle.
#[derive(Clone, Copy, Debug)]
pub struct FoamParticle3D {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds remaining; only meaningful while classified as Foam.
    pub lifetime: f32,
    pub kind: FoamKind,
}

/// Owning collection of foam particles plus the emission RNG.
pub struct Foam3D {
    pub list: Vec<FoamParticle3D>,
    rng: StdRng,
}

impl Foam3D {
    /// Create an empty collection with a deterministic emission stream.
    pub fn new(seed: u64) -> Self {
        Self {
            list: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of live foam particles.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Decay lifetimes and drop expired particles.
    ///
    /// Only Foam-kind particles age; Spray is immortal until it settles
    /// into foam. Returns how many particles were retired.
    pub fn retire_expired(&mut self, dt: f32) -> usize {
        let before = self.list.len();
        self.list.retain_mut(|p| {
            if p.kind == FoamKind::Foam {
                p.lifetime -= dt;
                p.lifetime > 0.0
            } else {
                true
            }
        });
        before - self.list.len()
    }

    /// Reclassify and advect every foam particle against the fluid field.
    ///
    /// Classification is evaluated fresh each frame (state is not
    /// sticky): at least `foam_neighbor_threshold` fluid neighbors
    /// within FH means Foam, fewer means Spray. Spray integrates gravity
    /// ballistically; Foam blends half-inverted gravity with half the
    /// kernel-weighted local fluid velocity. Each particle is contained
    /// in the domain before its grid lookup.
    pub fn classify_and_advect(
        &mut self,
        particles: &Particles3D,
        grid: &SpatialGrid3D,
        bounds: &DomainBounds,
        params: &SimParams,
    ) {
        let fluid = &particles.list;
        self.list.par_iter_mut().for_each(|p| {
            bounds.constrain(&mut p.position, &mut p.velocity);

            let mut weighted_velocity = Vec3::ZERO;
            let mut weight_sum = 0.0;
            let mut neighbor_count = 0usize;
            for j in grid.neighborhood(p.position) {
                let n = &fluid[j];
                if n.predicted.distance_squared(p.position) <= params.fh * params.fh {
                    neighbor_count += 1;
                    let w = kernels::poly6(p.position, n.predicted, params.fh);
                    weighted_velocity += n.velocity * w;
                    weight_sum += w;
                }
            }

            p.kind = if neighbor_count >= params.foam_neighbor_threshold {
                FoamKind::Foam
            } else {
                FoamKind::Spray
            };

            match p.kind {
                FoamKind::Spray => {
                    p.velocity += params.gravity * params.dt;
                }
                FoamKind::Foam => {
                    let fluid_velocity = if weight_sum > 0.0 {
                        weighted_velocity / weight_sum
                    } else {
                        Vec3::ZERO
                    };
                    p.velocity += (params.gravity * -0.5 + fluid_velocity * 0.5) * params.dt;
                }
            }
            p.position += p.velocity * params.dt;
        });
    }

    /// Emit new foam where the fluid's trapped-air/wave-crest potential
    /// exceeds the threshold.
    ///
    /// Runs once per fluid particle per frame, serially: this is the
    /// only place the collection grows. `densities` is the staged local
    /// density estimate for the same frame. Returns the number of
    /// particles emitted.
    pub fn generate(
        &mut self,
        particles: &Particles3D,
        densities: &[f32],
        grid: &SpatialGrid3D,
        bounds: &DomainBounds,
        params: &SimParams,
    ) -> usize {
        let before = self.list.len();

        for (i, p) in particles.list.iter().enumerate() {
            // Weighted relative-velocity divergence over fluid neighbors.
            let mut velocity_diff = 0.0;
            for &j in &particles.neighbors[i] {
                let n = &particles.list[j];
                let Some(xij) = (p.predicted - n.predicted).try_normalize() else {
                    continue;
                };
                let Some(vij_hat) = (p.velocity - n.velocity).try_normalize() else {
                    continue;
                };
                let w_air = kernels::air_potential(p.predicted, n.predicted, params.h);
                velocity_diff +=
                    (p.velocity - n.velocity).length() * (1.0 - vij_hat.dot(xij)) * w_air;
            }

            let kinetic = 0.5 * p.velocity.length_squared();
            let dampening = (1.0 - densities[i] / params.rest_density).max(0.0);
            let potential = velocity_diff * kinetic * dampening;
            if potential <= params.foam_potential_threshold {
                continue;
            }

            // Disk basis perpendicular to the velocity. The kinetic
            // factor zeroes the potential for a resting particle, so the
            // direction always exists.
            let Some(direction) = p.velocity.try_normalize() else {
                continue;
            };
            let (e1, e2) = direction.any_orthonormal_pair();
            let step_length = (p.velocity * params.dt).length();

            for _ in 0..params.foam_emission {
                let xr: f32 = 0.05 + 0.9 * self.rng.gen::<f32>();
                let xtheta: f32 = 0.05 + 0.9 * self.rng.gen::<f32>();
                let xh: f32 = 0.05 + 0.9 * self.rng.gen::<f32>();

                let radius = params.fh * xr.sqrt();
                let theta = xtheta * 2.0 * PI;
                let offset = e1 * (radius * theta.cos()) + e2 * (radius * theta.sin());

                let mut position = p.predicted + offset + direction * (xh * step_length);
                let mut velocity = offset + p.velocity;
                bounds.constrain(&mut position, &mut velocity);

                let kind = classify_at(position, particles, grid, params);
                self.list.push(FoamParticle3D {
                    position,
                    velocity,
                    lifetime: params.foam_lifetime,
                    kind,
                });
            }
        }

        self.list.len() - before
    }

    /// Packed render records: xyz position plus `kind * 1000 + age`,
    /// where age ramps 0 -> 1 over the configured lifetime. Valid until
    /// the next simulation step.
    pub fn render_records(&self, params: &SimParams, out: &mut Vec<Vec4>) {
        out.clear();
        for p in &self.list {
            let age = ((params.foam_lifetime - p.lifetime) / params.foam_lifetime).clamp(0.0, 1.0);
            out.push(Vec4::new(
                p.position.x,
                p.position.y,
                p.position.z,
                p.kind.code() * 1000.0 + age,
            ));
        }
    }
}

/// Count-based classification at an arbitrary point, against fluid
/// particles only.
fn classify_at(
    position: Vec3,
    particles: &Particles3D,
    grid: &SpatialGrid3D,
    params: &SimParams,
) -> FoamKind {
    let mut count = 0usize;
    for j in grid.neighborhood(position) {
        if particles.list[j].predicted.distance_squared(position) <= params.fh * params.fh {
            count += 1;
        }
    }
    if count >= params.foam_neighbor_threshold {
        FoamKind::Foam
    } else {
        FoamKind::Spray
    }
}
