// Uniform spatial grid for proximity queries.
//
// The square field is divided into `width × width` cells of `cell_size`
// world units; cell (0, 0) is the south-west corner at
// `(-half_field, -half_field)`. Cells are stored densely in a flat `Vec`
// indexed `z * width + x`, each holding the ids of the agents whose position
// falls inside it.
//
// The grid is rebuilt from scratch at the start of every frame (`rebuild`),
// which clears each cell but keeps its allocation. Queries take `&self`, so
// the borrow checker rules out observing a half-built grid. A query returns
// every live agent in a square block of cells around the query position; it
// does not test actual distances. Callers filter by distance themselves
// (see `targeting.rs` and the blackboard refresh in `decision.rs`).
//
// Positions outside the field are clamped into the boundary cells, both when
// inserting and when querying.
//
// See also: `sim.rs` (rebuild call site), `targeting.rs` (grid retrieval
// source).

use crate::agent::Agent;
use crate::error::ConfigError;
use crate::types::{AgentId, Vec3};

/// Largest supported number of cells along one axis.
pub const MAX_GRID_WIDTH: usize = 1024;

/// Cells along one axis, `ceil(field_size / cell_size)`, after checking both
/// sizes and the `MAX_GRID_WIDTH` bound. Shared by `SpatialGrid::new` and
/// `GameConfig::validate`.
pub fn grid_width(field_size: f32, cell_size: f32) -> Result<usize, ConfigError> {
    if !(field_size > 0.0) {
        return Err(ConfigError::NonPositiveFieldSize(field_size));
    }
    if !(cell_size > 0.0) {
        return Err(ConfigError::NonPositiveCellSize(cell_size));
    }
    let cells = (field_size / cell_size).ceil().max(1.0);
    // Also rejects an infinite field.
    if !(cells <= MAX_GRID_WIDTH as f32) {
        return Err(ConfigError::GridTooLarge { width: cells });
    }
    Ok(cells as usize)
}

#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    width: usize,
    half_field: f32,
    cells: Vec<Vec<AgentId>>,
}

impl SpatialGrid {
    pub fn new(field_size: f32, cell_size: f32) -> Result<Self, ConfigError> {
        let width = grid_width(field_size, cell_size)?;
        let cell_count = width
            .checked_mul(width)
            .ok_or(ConfigError::GridTooLarge { width: width as f32 })?;
        Ok(Self {
            cell_size,
            width,
            half_field: field_size * 0.5,
            cells: vec![Vec::new(); cell_count],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Clear every cell and insert each live agent by position.
    pub fn rebuild(&mut self, agents: &[Agent]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for agent in agents.iter().filter(|a| a.is_alive()) {
            let index = self.cell_index(agent.position);
            self.cells[index].push(agent.id);
        }
    }

    /// Clamped `(x, z)` cell coordinates of a position.
    pub fn cell_coords(&self, position: Vec3) -> (usize, usize) {
        (self.axis_cell(position.x), self.axis_cell(position.z))
    }

    /// Flat cell index of a position: `z * width + x`.
    pub fn cell_index(&self, position: Vec3) -> usize {
        let (x, z) = self.cell_coords(position);
        z * self.width + x
    }

    /// Agents stored in one cell, in insertion (ascending id) order.
    pub fn cell(&self, index: usize) -> &[AgentId] {
        self.cells.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    fn axis_cell(&self, coord: f32) -> usize {
        let raw = ((coord + self.half_field) / self.cell_size).floor();
        // NaN and negatives both land in cell 0.
        if !(raw > 0.0) {
            return 0;
        }
        (raw as usize).min(self.width - 1)
    }

    /// Every live agent in the 3×3 block of cells around `position`, except
    /// `exclude`. Clears `out` first. Results are in ascending id order.
    pub fn query_nearby(
        &self,
        position: Vec3,
        exclude: Option<AgentId>,
        agents: &[Agent],
        out: &mut Vec<AgentId>,
    ) {
        self.query_block(position, 1, exclude, agents, out);
    }

    /// Like `query_nearby`, with the block widened to
    /// `ring = max(1, ceil(radius / cell_size))` cells on each side so that
    /// every agent within `radius` of `position` is included.
    pub fn query_within(
        &self,
        position: Vec3,
        radius: f32,
        exclude: Option<AgentId>,
        agents: &[Agent],
        out: &mut Vec<AgentId>,
    ) {
        let ring = self.ring_for(radius);
        self.query_block(position, ring, exclude, agents, out);
    }

    fn ring_for(&self, radius: f32) -> usize {
        let cells = (radius / self.cell_size).ceil();
        if cells > 1.0 {
            (cells as usize).min(self.width)
        } else {
            1
        }
    }

    fn query_block(
        &self,
        position: Vec3,
        ring: usize,
        exclude: Option<AgentId>,
        agents: &[Agent],
        out: &mut Vec<AgentId>,
    ) {
        out.clear();
        let (cx, cz) = self.cell_coords(position);
        let x_range = cx.saturating_sub(ring)..=(cx + ring).min(self.width - 1);
        for z in cz.saturating_sub(ring)..=(cz + ring).min(self.width - 1) {
            let row = z * self.width;
            for x in x_range.clone() {
                for &id in &self.cells[row + x] {
                    if Some(id) == exclude {
                        continue;
                    }
                    if agents.get(id.index()).is_some_and(Agent::is_alive) {
                        out.push(id);
                    }
                }
            }
        }
        // Cells are visited row by row; sort so callers see a stable order
        // independent of the block shape.
        out.sort_unstable();
    }
}
