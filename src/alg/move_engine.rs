use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    energy::{energy_model::EnergyModel, label_cost::LabelCostTerm},
    error::{check_label, GcoError, Result},
    labeling::Labeling,
    maxflow::min_cut::{DinicSolver, MinCutSolver, Segment},
    topology::neighbor_graph::NeighborGraph,
    EnergyValue, LabelId,
};

use super::{
    binary_problem::MoveProblem,
    expansion::build_expansion,
    solver::{EngineState, RunStatus, RunSummary, SolverOptions},
    swap::build_swap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Expansion(LabelId),
    Swap(LabelId, LabelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Expansion,
    Swap,
}

// Runs alpha-expansion and alpha-beta-swap passes over a labeling.
// A move is applied only if it strictly lowers the total energy.
pub struct MoveEngine<S: MinCutSolver = DinicSolver> {
    options: SolverOptions,
    solver: S,
    rng: StdRng,
    label_order: Option<Vec<LabelId>>, // None = all labels in increasing order
    state: EngineState,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl MoveEngine<DinicSolver> {
    pub fn new(options: SolverOptions) -> Self {
        MoveEngine::with_solver(options, DinicSolver::new())
    }
}

impl<S: MinCutSolver> MoveEngine<S> {
    pub fn with_solver(options: SolverOptions, solver: S) -> Self {
        let rng = make_rng(options.seed());
        MoveEngine {
            options,
            solver,
            rng,
            label_order: None,
            state: EngineState::Idle,
        }
    }

    // Swaps the min-cut solver, keeping options, order, and generator state
    pub fn into_solver<T: MinCutSolver>(self, solver: T) -> MoveEngine<T> {
        MoveEngine {
            options: self.options,
            solver,
            rng: self.rng,
            label_order: self.label_order,
            state: EngineState::Idle,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    // Replaces the options; the generator is reseeded from the new seed
    pub fn set_options(&mut self, options: SolverOptions) {
        self.rng = make_rng(options.seed());
        self.options = options;
        self.state = EngineState::Idle;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.options.set_seed(Some(seed));
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn set_random_label_order(&mut self, value: bool) {
        self.options.set_random_label_order(value);
    }

    pub fn set_verbosity(&mut self, value: u8) {
        self.options.set_verbosity(value);
    }

    // Installs a fixed order of distinct labels; only listed labels are tried
    pub fn set_label_order(&mut self, order: &[LabelId], num_labels: usize) -> Result<()> {
        if order.is_empty() {
            return Err(GcoError::Configuration(
                "label order must not be empty".to_string(),
            ));
        }
        let mut seen = vec![false; num_labels];
        for &label in order {
            check_label(label, num_labels)?;
            if seen[label] {
                return Err(GcoError::Configuration(format!(
                    "label {} appears twice in label order",
                    label
                )));
            }
            seen[label] = true;
        }
        self.label_order = Some(order.to_vec());
        Ok(())
    }

    pub fn label_order(&self, num_labels: usize) -> Vec<LabelId> {
        match &self.label_order {
            Some(order) => order.clone(),
            None => (0..num_labels).collect(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    // Returns to Idle, e.g. after the problem was reconfigured
    pub fn reset(&mut self) {
        self.state = EngineState::Idle;
    }

    fn pass_order(&mut self, num_labels: usize) -> Vec<LabelId> {
        let mut order = self.label_order(num_labels);
        if self.options.random_label_order() {
            order.shuffle(&mut self.rng);
        }
        order
    }

    fn log_move(&self, mv: Move, accepted: bool, energy: EnergyValue) {
        if self.options.verbosity() >= 2 {
            info!("{:?}: accepted {}, energy {}", mv, accepted, energy);
        } else {
            debug!("{:?}: accepted {}, energy {}", mv, accepted, energy);
        }
    }

    fn warn_on_non_metric(&self, model: &EnergyModel, kind: MoveKind) {
        let smooth = model.smooth_cost();
        match kind {
            MoveKind::Expansion if smooth.is_metric() == Some(false) => warn!(
                "Smooth cost is not a metric; expansion moves carry no approximation guarantee"
            ),
            MoveKind::Swap if smooth.is_semi_metric() == Some(false) => warn!(
                "Smooth cost is not a semi-metric; swap moves carry no approximation guarantee"
            ),
            _ => {}
        }
    }

    // Solves the move and applies it if it lowers `energy`
    fn try_move(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        label_terms: &[LabelCostTerm],
        energy: &mut EnergyValue,
        mv: Move,
    ) -> Result<bool> {
        let built = match mv {
            Move::Expansion(alpha) => build_expansion(model, graph, labeling, label_terms, alpha),
            Move::Swap(alpha, beta) => build_swap(model, graph, labeling, label_terms, alpha, beta),
        };
        let Some(MoveProblem { problem, sites }) = built else {
            self.log_move(mv, false, *energy);
            return Ok(false);
        };

        if problem.truncated() > 0 {
            if !self.options.truncate_non_submodular() {
                return Err(GcoError::Engine(format!(
                    "{:?} has {} non-submodular pairwise terms",
                    mv,
                    problem.truncated()
                )));
            }
            warn!("{:?}: truncated {} pairwise terms", mv, problem.truncated());
        }

        let network = problem.to_network()?;
        let cut = self.solver.solve(&network)?;
        if cut.sink_side.len() != network.graph().node_count() {
            return Err(GcoError::Engine(format!(
                "cut partitions {} nodes, network has {}",
                cut.sink_side.len(),
                network.graph().node_count()
            )));
        }
        if self.options.verify_cuts() {
            let capacity = network.cut_capacity(&cut.sink_side);
            if capacity != cut.value {
                return Err(GcoError::Engine(format!(
                    "reported cut value {} differs from cut capacity {}",
                    cut.value, capacity
                )));
            }
            let binary = problem.evaluate(|var| cut.segment(var) == Segment::Sink);
            if binary != problem.energy_of_cut(cut.value) {
                return Err(GcoError::Engine(format!(
                    "cut assigns binary energy {}, its value implies {}",
                    binary,
                    problem.energy_of_cut(cut.value)
                )));
            }
        }

        // Apply in place, remembering old labels to undo a rejected move
        let mut changed = Vec::new();
        for (var, &site) in sites.iter().enumerate() {
            let new_label = match (mv, cut.segment(var)) {
                (Move::Expansion(_), Segment::Source) => labeling[site],
                (Move::Expansion(alpha), Segment::Sink) => alpha,
                (Move::Swap(alpha, _), Segment::Source) => alpha,
                (Move::Swap(_, beta), Segment::Sink) => beta,
            };
            if new_label != labeling[site] {
                changed.push((site, labeling[site]));
                labeling[site] = new_label;
            }
        }
        if changed.is_empty() {
            self.log_move(mv, false, *energy);
            return Ok(false);
        }

        let new_energy = model.total_energy(graph, labeling);
        let accepted = new_energy < *energy;
        if accepted {
            *energy = new_energy;
        } else {
            for (site, old_label) in changed {
                labeling[site] = old_label;
            }
        }
        self.log_move(mv, accepted, *energy);
        Ok(accepted)
    }

    fn run_passes(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        max_iterations: Option<usize>,
        kind: MoveKind,
    ) -> Result<RunSummary> {
        let label_terms = model.label_cost().terms();
        let mut energy = model.total_energy(graph, labeling);
        let mut passes = 0;
        let mut accepted_moves = 0;

        let status = loop {
            if max_iterations.is_some_and(|max_iterations| passes >= max_iterations) {
                break RunStatus::IterationLimitReached;
            }

            let order = self.pass_order(model.num_labels());
            let energy_before = energy;
            let mut accepted = 0;
            match kind {
                MoveKind::Expansion => {
                    for &alpha in &order {
                        let mv = Move::Expansion(alpha);
                        if self.try_move(model, graph, labeling, &label_terms, &mut energy, mv)? {
                            accepted += 1;
                        }
                    }
                }
                MoveKind::Swap => {
                    for (i, &alpha) in order.iter().enumerate() {
                        for &beta in &order[i + 1..] {
                            let mv = Move::Swap(alpha, beta);
                            if self.try_move(model, graph, labeling, &label_terms, &mut energy, mv)?
                            {
                                accepted += 1;
                            }
                        }
                    }
                }
            }
            passes += 1;
            accepted_moves += accepted;

            if self.options.verbosity() >= 1 {
                info!(
                    "{:?} pass {}: energy {} -> {}, {} moves accepted",
                    kind, passes, energy_before, energy, accepted
                );
            } else {
                debug!(
                    "{:?} pass {}: energy {} -> {}, {} moves accepted",
                    kind, passes, energy_before, energy, accepted
                );
            }

            if accepted == 0 {
                break RunStatus::Converged;
            }
        };

        Ok(RunSummary {
            status,
            passes,
            accepted_moves,
            energy: model.breakdown(graph, labeling),
        })
    }

    fn run(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        max_iterations: Option<usize>,
        kind: MoveKind,
    ) -> Result<RunSummary> {
        self.warn_on_non_metric(model, kind);
        let max_iterations = max_iterations.or(self.options.max_iterations());
        self.state = EngineState::Running;
        let result = self.run_passes(model, graph, labeling, max_iterations, kind);
        self.state = match &result {
            Ok(summary) => summary.status.into(),
            Err(_) => EngineState::Idle,
        };
        result
    }

    // Repeats expansion passes until no move improves or `max_iterations` passes ran.
    // None falls back to the budget in the options.
    pub fn expansion(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        max_iterations: Option<usize>,
    ) -> Result<RunSummary> {
        self.run(model, graph, labeling, max_iterations, MoveKind::Expansion)
    }

    // Repeats swap passes until no move improves or `max_iterations` passes ran
    pub fn swap(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        max_iterations: Option<usize>,
    ) -> Result<RunSummary> {
        self.run(model, graph, labeling, max_iterations, MoveKind::Swap)
    }

    // Performs a single expansion move on `alpha`; returns true if it was applied
    pub fn alpha_expansion(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        alpha: LabelId,
    ) -> Result<bool> {
        check_label(alpha, model.num_labels())?;
        self.single_move(model, graph, labeling, Move::Expansion(alpha))
    }

    // Performs a single swap move on the pair (alpha, beta); returns true if it was applied
    pub fn alpha_beta_swap(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        alpha: LabelId,
        beta: LabelId,
    ) -> Result<bool> {
        check_label(alpha, model.num_labels())?;
        check_label(beta, model.num_labels())?;
        if alpha == beta {
            return Ok(false);
        }
        self.single_move(model, graph, labeling, Move::Swap(alpha, beta))
    }

    fn single_move(
        &mut self,
        model: &EnergyModel,
        graph: &NeighborGraph,
        labeling: &mut Labeling,
        mv: Move,
    ) -> Result<bool> {
        let label_terms = model.label_cost().terms();
        let mut energy = model.total_energy(graph, labeling);
        self.state = EngineState::Running;
        let result = self.try_move(model, graph, labeling, &label_terms, &mut energy, mv);
        self.state = EngineState::Idle;
        result
    }
}
