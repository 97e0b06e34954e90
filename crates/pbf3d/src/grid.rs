//! Uniform spatial grid over the simulation domain.
//!
//! Cells are one smoothing radius wide, so any pair within kernel range
//! sits in the same or an adjacent cell. The rest of the pipeline treats
//! this as a black box exposing cell occupancy and the clipped 27-cell
//! neighborhood; fluid neighbor search, foam velocity sampling, and foam
//! generation counting all go through the same lookup.

use glam::{IVec3, Vec3};

use crate::particle::Particles3D;

/// Uniform cell partition of the (maximum) domain box.
pub struct SpatialGrid3D {
    nx: usize,
    ny: usize,
    nz: usize,
    cell_size: f32,
    /// Occupant slots per cell, reassigned every frame.
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid3D {
    /// Build a grid covering a box of the given extents.
    ///
    /// Extents must cover the widest the domain ever gets; the moving
    /// wall only travels inward.
    pub fn new(extents: Vec3, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive, got {}", cell_size);
        assert!(
            extents.min_element() > 0.0,
            "domain extents must be positive, got {}",
            extents
        );
        let nx = (extents.x / cell_size).ceil() as usize;
        let ny = (extents.y / cell_size).ceil() as usize;
        let nz = (extents.z / cell_size).ceil() as usize;

        Self {
            nx,
            ny,
            nz,
            cell_size,
            cells: vec![Vec::new(); nx * ny * nz],
        }
    }

    /// Cell coordinate containing a position.
    pub fn cell_coord(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }

    fn in_bounds(&self, c: IVec3) -> bool {
        c.x >= 0
            && c.y >= 0
            && c.z >= 0
            && (c.x as usize) < self.nx
            && (c.y as usize) < self.ny
            && (c.z as usize) < self.nz
    }

    fn cell_index(&self, c: IVec3) -> usize {
        (c.z as usize * self.ny + c.y as usize) * self.nx + c.x as usize
    }

    /// Reassign cell occupancy from predicted positions.
    ///
    /// Serial write phase with no concurrent readers; must run after
    /// positions move and before any neighborhood query in the same
    /// frame. Callers clamp positions into the domain first, so every
    /// particle lands in a valid cell.
    pub fn rebuild(&mut self, particles: &Particles3D) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for (i, p) in particles.list.iter().enumerate() {
            let c = self.cell_coord(p.predicted);
            if self.in_bounds(c) {
                let idx = self.cell_index(c);
                self.cells[idx].push(i);
            }
        }
    }

    /// Particle slots occupying one cell.
    pub fn occupants(&self, cell: IVec3) -> &[usize] {
        if self.in_bounds(cell) {
            &self.cells[self.cell_index(cell)]
        } else {
            &[]
        }
    }

    /// The 3x3x3 block around a cell, clipped to the grid.
    pub fn neighbor_cells(&self, cell: IVec3) -> impl Iterator<Item = IVec3> + '_ {
        (-1..=1)
            .flat_map(move |dz| {
                (-1..=1).flat_map(move |dy| {
                    (-1..=1).map(move |dx| cell + IVec3::new(dx, dy, dz))
                })
            })
            .filter(move |&c| self.in_bounds(c))
    }

    /// Slots of all particles in the 27-cell neighborhood of a position.
    ///
    /// Candidates only; callers filter by actual distance.
    pub fn neighborhood(&self, position: Vec3) -> impl Iterator<Item = usize> + '_ {
        self.neighbor_cells(self.cell_coord(position))
            .flat_map(move |c| self.occupants(c).iter().copied())
    }
}
