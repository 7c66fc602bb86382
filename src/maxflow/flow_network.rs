use bitvec::vec::BitVec;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use crate::{
    error::{GcoError, Result},
    EnergyValue,
};

pub type Capacity = EnergyValue;
pub type FlowGraph = DiGraph<(), Capacity, usize>;

/// Capacitated directed graph with a distinguished source and sink.
///
/// Inner nodes are numbered `0..num_nodes()`; the source and the sink are
/// appended after them. Zero-capacity edges are not stored.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    graph: FlowGraph,
    num_nodes: usize,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize) -> Self {
        Self::with_capacity(num_nodes, 0)
    }

    // Reserves space for `num_edges` inner edges in addition to terminal edges
    pub fn with_capacity(num_nodes: usize, num_edges: usize) -> Self {
        let mut graph = FlowGraph::with_capacity(num_nodes + 2, num_edges + 2 * num_nodes);
        for _ in 0..num_nodes + 2 {
            graph.add_node(());
        }
        FlowNetwork { graph, num_nodes }
    }

    // Number of inner (non-terminal) nodes
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn source(&self) -> NodeIndex<usize> {
        NodeIndex::new(self.num_nodes)
    }

    pub fn sink(&self) -> NodeIndex<usize> {
        NodeIndex::new(self.num_nodes + 1)
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    fn check_node(&self, node: usize) -> Result<()> {
        if node < self.num_nodes {
            Ok(())
        } else {
            Err(GcoError::Engine(format!(
                "flow node {} out of range 0..{}",
                node, self.num_nodes
            )))
        }
    }

    fn check_capacity(capacity: Capacity) -> Result<()> {
        if capacity < 0 {
            Err(GcoError::Engine(format!("negative capacity {}", capacity)))
        } else {
            Ok(())
        }
    }

    // Adds the directed inner edge from -> to
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: Capacity) -> Result<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        Self::check_capacity(capacity)?;
        if capacity > 0 && from != to {
            self.graph
                .add_edge(NodeIndex::new(from), NodeIndex::new(to), capacity);
        }
        Ok(())
    }

    // Adds source -> node and node -> sink edges
    pub fn add_terminal_edges(
        &mut self,
        node: usize,
        source_capacity: Capacity,
        sink_capacity: Capacity,
    ) -> Result<()> {
        self.check_node(node)?;
        Self::check_capacity(source_capacity)?;
        Self::check_capacity(sink_capacity)?;
        if source_capacity > 0 {
            self.graph
                .add_edge(self.source(), NodeIndex::new(node), source_capacity);
        }
        if sink_capacity > 0 {
            self.graph
                .add_edge(NodeIndex::new(node), self.sink(), sink_capacity);
        }
        Ok(())
    }

    // Total capacity of edges leaving the source side, where `sink_side` marks
    // every graph node (terminals included) on the sink side
    pub fn cut_capacity(&self, sink_side: &BitVec) -> Capacity {
        self.graph
            .edge_references()
            .filter(|edge| !sink_side[edge.source().index()] && sink_side[edge.target().index()])
            .map(|edge| *edge.weight())
            .sum()
    }
}
