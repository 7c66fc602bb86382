use crate::{EnergyValue, SiteId};

use super::{general::GeneralTopology, grid::GridTopology};

// Neighborhood system of the labeling problem, selected at construction.
// Dispatch happens once per call, not per edge.
#[derive(Debug, Clone)]
pub enum NeighborGraph {
    Grid(GridTopology),
    General(GeneralTopology),
}

impl NeighborGraph {
    pub fn num_sites(&self) -> usize {
        match self {
            NeighborGraph::Grid(grid) => grid.num_sites(),
            NeighborGraph::General(general) => general.num_sites(),
        }
    }

    pub fn num_edges(&self) -> usize {
        match self {
            NeighborGraph::Grid(grid) => grid.num_edges(),
            NeighborGraph::General(general) => general.num_edges(),
        }
    }

    // Calls `visit(neighbor, weight)` for every neighbor of `site`
    #[inline]
    pub fn for_each_neighbor<F>(&self, site: SiteId, visit: F)
    where
        F: FnMut(SiteId, EnergyValue),
    {
        match self {
            NeighborGraph::Grid(grid) => grid.for_each_neighbor(site, visit),
            NeighborGraph::General(general) => general.for_each_neighbor(site, visit),
        }
    }

    // Calls `visit(site_a, site_b, weight)` once per undirected edge, with site_a < site_b
    pub fn for_each_edge<F>(&self, visit: F)
    where
        F: FnMut(SiteId, SiteId, EnergyValue),
    {
        match self {
            NeighborGraph::Grid(grid) => grid.for_each_edge(visit),
            NeighborGraph::General(general) => general.for_each_edge(visit),
        }
    }

    pub fn as_grid_mut(&mut self) -> Option<&mut GridTopology> {
        match self {
            NeighborGraph::Grid(grid) => Some(grid),
            NeighborGraph::General(_) => None,
        }
    }

    pub fn as_general_mut(&mut self) -> Option<&mut GeneralTopology> {
        match self {
            NeighborGraph::Grid(_) => None,
            NeighborGraph::General(general) => Some(general),
        }
    }
}
