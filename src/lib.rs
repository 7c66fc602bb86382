pub mod error;
pub mod labeling;
pub mod optimizer;

pub mod data_structures {
    pub mod jagged_arrays;
}

pub mod energy {
    pub mod data_cost;
    pub mod energy_model;
    pub mod label_cost;
    pub mod smooth_cost;
}

pub mod topology {
    pub mod general;
    pub mod grid;
    pub mod neighbor_graph;
}

pub mod maxflow {
    pub mod flow_network;
    pub mod min_cut;
}

pub mod alg {
    pub mod binary_problem;
    pub mod expansion;
    pub mod move_engine;
    pub mod solver;
    pub mod swap;

    #[cfg(test)]
    pub(crate) mod test_support;
}

pub type SiteId = usize;
pub type LabelId = usize;
pub type EnergyValue = i64;

/// Largest magnitude accepted for a single cost entry or edge weight. Weighted
/// smooth terms stay below 2^56, leaving headroom for the sums formed while
/// building moves. Cost closures are not checked.
pub const MAX_TERM: EnergyValue = 1 << 28;

pub use error::{GcoError, Result};
pub use optimizer::GraphCutOptimizer;
