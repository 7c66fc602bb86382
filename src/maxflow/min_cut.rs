use std::collections::VecDeque;

use bitvec::{bitvec, vec::BitVec};
use log::debug;
use petgraph::{
    visit::EdgeRef,
    Direction::{Incoming, Outgoing},
};

use crate::{
    data_structures::jagged_arrays::JaggedArray2,
    error::{GcoError, Result},
};

use super::flow_network::{Capacity, FlowNetwork};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Source,
    Sink,
}

// Minimum s-t cut of a flow network
#[derive(Debug, Clone)]
pub struct MinCut {
    pub value: Capacity,   // capacity of the cut, equal to the maximum flow value
    pub sink_side: BitVec, // indexed by graph nodes, terminals included
}

impl MinCut {
    // Returns the side of an inner node
    pub fn segment(&self, node: usize) -> Segment {
        if self.sink_side[node] {
            Segment::Sink
        } else {
            Segment::Source
        }
    }
}

/// Exact minimum s-t cut solver.
///
/// Implementations must return a global minimum cut and must be
/// deterministic for a fixed network.
pub trait MinCutSolver {
    fn solve(&mut self, network: &FlowNetwork) -> Result<MinCut>;
}

const UNREACHED: usize = usize::MAX;

/// Dinic's algorithm on a residual copy of the network.
/// The blocking-flow search keeps an explicit path stack instead of recursing.
#[derive(Debug, Default)]
pub struct DinicSolver {
    head: Vec<usize>,         // target node of each residual arc
    residual: Vec<Capacity>,  // residual capacity of each arc; arc ^ 1 is its reverse
    level: Vec<usize>,        // BFS distance from the source in the level graph
    next_arc: Vec<usize>,     // current-arc pointer per node
    queue: VecDeque<usize>,
}

impl DinicSolver {
    pub fn new() -> Self {
        Self::default()
    }

    // Builds residual arcs: edge e gives forward arc 2e and reverse arc 2e + 1
    fn init(&mut self, network: &FlowNetwork) -> JaggedArray2<usize> {
        let graph = network.graph();
        let num_arcs = 2 * graph.edge_count();
        self.head.clear();
        self.head.resize(num_arcs, 0);
        self.residual.clear();
        self.residual.resize(num_arcs, 0);
        for edge in graph.edge_references() {
            let e = edge.id().index();
            self.head[2 * e] = edge.target().index();
            self.head[2 * e + 1] = edge.source().index();
            self.residual[2 * e] = *edge.weight();
        }

        let arcs: Vec<Vec<usize>> = graph
            .node_indices()
            .map(|node| {
                graph
                    .edges_directed(node, Outgoing)
                    .map(|edge| 2 * edge.id().index())
                    .chain(
                        graph
                            .edges_directed(node, Incoming)
                            .map(|edge| 2 * edge.id().index() + 1),
                    )
                    .collect()
            })
            .collect();

        self.level.clear();
        self.level.resize(graph.node_count(), UNREACHED);
        self.next_arc.clear();
        self.next_arc.resize(graph.node_count(), 0);
        arcs.into()
    }

    // Labels nodes by residual distance from the source; returns true if the sink is reachable
    fn build_levels(&mut self, arcs: &JaggedArray2<usize>, source: usize, sink: usize) -> bool {
        self.level.fill(UNREACHED);
        self.level[source] = 0;
        self.queue.clear();
        self.queue.push_back(source);
        while let Some(node) = self.queue.pop_front() {
            for &arc in arcs.row(node) {
                let next = self.head[arc];
                if self.residual[arc] > 0 && self.level[next] == UNREACHED {
                    self.level[next] = self.level[node] + 1;
                    self.queue.push_back(next);
                }
            }
        }
        self.level[sink] != UNREACHED
    }

    // Saturates the level graph and returns the amount of flow pushed
    fn blocking_flow(&mut self, arcs: &JaggedArray2<usize>, source: usize, sink: usize) -> Capacity {
        self.next_arc.fill(0);
        let mut pushed = 0;
        let mut path: Vec<usize> = Vec::new();
        let mut node = source;

        loop {
            if node == sink {
                let bottleneck = path
                    .iter()
                    .map(|&arc| self.residual[arc])
                    .min()
                    .unwrap_or(0);
                for &arc in &path {
                    self.residual[arc] -= bottleneck;
                    self.residual[arc ^ 1] += bottleneck;
                }
                pushed += bottleneck;

                // Retreat to the tail of the first saturated arc
                let saturated = path
                    .iter()
                    .position(|&arc| self.residual[arc] == 0)
                    .unwrap_or(0);
                node = self.head[path[saturated] ^ 1];
                path.truncate(saturated);
                continue;
            }

            let row = arcs.row(node);
            let mut advanced = false;
            while self.next_arc[node] < row.len() {
                let arc = row[self.next_arc[node]];
                let next = self.head[arc];
                if self.residual[arc] > 0
                    && self.level[next] != UNREACHED
                    && self.level[next] == self.level[node] + 1
                {
                    path.push(arc);
                    node = next;
                    advanced = true;
                    break;
                }
                self.next_arc[node] += 1;
            }

            if !advanced {
                if node == source {
                    break;
                }
                // Dead end: drop the node from the level graph and step back
                self.level[node] = UNREACHED;
                match path.pop() {
                    Some(arc) => {
                        node = self.head[arc ^ 1];
                        self.next_arc[node] += 1;
                    }
                    None => break,
                }
            }
        }

        pushed
    }

    // Marks nodes not reachable from the source in the residual graph
    fn sink_side(&mut self, arcs: &JaggedArray2<usize>, source: usize) -> BitVec {
        let mut sink_side = bitvec![1; arcs.len()];
        sink_side.set(source, false);
        self.queue.clear();
        self.queue.push_back(source);
        while let Some(node) = self.queue.pop_front() {
            for &arc in arcs.row(node) {
                let next = self.head[arc];
                if self.residual[arc] > 0 && sink_side[next] {
                    sink_side.set(next, false);
                    self.queue.push_back(next);
                }
            }
        }
        sink_side
    }
}

impl MinCutSolver for DinicSolver {
    fn solve(&mut self, network: &FlowNetwork) -> Result<MinCut> {
        let source = network.source().index();
        let sink = network.sink().index();
        let arcs = self.init(network);

        let mut value: Capacity = 0;
        let mut phases = 0;
        while self.build_levels(&arcs, source, sink) {
            let pushed = self.blocking_flow(&arcs, source, sink);
            value = value.checked_add(pushed).ok_or_else(|| {
                GcoError::Engine("maximum flow value overflows".to_string())
            })?;
            phases += 1;
        }

        let sink_side = self.sink_side(&arcs, source);
        if sink_side[source] || !sink_side[sink] {
            return Err(GcoError::Engine(
                "source and sink ended up on the same side of the cut".to_string(),
            ));
        }
        debug!(
            "Max flow {} on {} nodes and {} edges after {} phases",
            value,
            network.num_nodes(),
            network.graph().edge_count(),
            phases
        );

        Ok(MinCut { value, sink_side })
    }
}
