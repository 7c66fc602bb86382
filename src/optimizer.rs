use log::debug;
use ndarray::ArrayView2;

use crate::{
    alg::{
        move_engine::MoveEngine,
        solver::{EngineState, RunSummary, SolverOptions},
    },
    data_structures::jagged_arrays::JaggedArray2,
    energy::{
        data_cost::DataCostFn,
        energy_model::{EnergyBreakdown, EnergyModel},
        smooth_cost::SmoothCostFn,
    },
    error::{check_len, check_terms, GcoError, Result},
    labeling::Labeling,
    maxflow::min_cut::{DinicSolver, MinCutSolver},
    topology::{general::GeneralTopology, grid::GridTopology, neighbor_graph::NeighborGraph},
    EnergyValue, LabelId, SiteId,
};

// Owns the energy, the neighborhood, the current labeling and the move engine.
// Every reconfiguration returns the engine to `EngineState::Idle`.
pub struct GraphCutOptimizer<S: MinCutSolver = DinicSolver> {
    model: EnergyModel,
    graph: NeighborGraph,
    labeling: Labeling,
    engine: MoveEngine<S>,
}

impl GraphCutOptimizer<DinicSolver> {
    // Optimizer over a width x height 4-connected grid; site = row * width + col
    pub fn grid(width: usize, height: usize, num_labels: usize) -> Result<Self> {
        let topology = GridTopology::new(width, height);
        GraphCutOptimizer::with_graph(NeighborGraph::Grid(topology), num_labels)
    }

    // Optimizer over explicitly declared neighbor pairs
    pub fn general(num_sites: usize, num_labels: usize) -> Result<Self> {
        let topology = GeneralTopology::new(num_sites);
        GraphCutOptimizer::with_graph(NeighborGraph::General(topology), num_labels)
    }

    fn with_graph(graph: NeighborGraph, num_labels: usize) -> Result<Self> {
        let num_sites = graph.num_sites();
        let model = EnergyModel::new(num_sites, num_labels)?;
        debug!(
            "Created optimizer with {} sites, {} labels",
            num_sites, num_labels
        );
        Ok(GraphCutOptimizer {
            model,
            graph,
            labeling: Labeling::new(num_sites, num_labels),
            engine: MoveEngine::new(SolverOptions::default()),
        })
    }
}

impl<S: MinCutSolver> GraphCutOptimizer<S> {
    // Replaces the min-cut solver
    pub fn with_solver<T: MinCutSolver>(self, solver: T) -> GraphCutOptimizer<T> {
        GraphCutOptimizer {
            model: self.model,
            graph: self.graph,
            labeling: self.labeling,
            engine: self.engine.into_solver(solver),
        }
    }

    pub fn num_sites(&self) -> usize {
        self.model.num_sites()
    }

    pub fn num_labels(&self) -> usize {
        self.model.num_labels()
    }

    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    // Applies a model change and returns the engine to Idle on success
    fn reconfigure<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut EnergyModel) -> Result<()>,
    {
        change(&mut self.model)?;
        self.engine.reset();
        Ok(())
    }

    // Energy terms

    pub fn set_data_cost(&mut self, site: SiteId, label: LabelId, value: EnergyValue) -> Result<()> {
        self.reconfigure(|model| model.set_data_cost(site, label, value))
    }

    // Row-major table of num_sites x num_labels entries
    pub fn set_data_costs(&mut self, values: &[EnergyValue]) -> Result<()> {
        self.reconfigure(|model| model.set_data_costs(values))
    }

    pub fn set_data_cost_array(&mut self, values: ArrayView2<EnergyValue>) -> Result<()> {
        self.reconfigure(|model| model.set_data_cost_array(values))
    }

    pub fn set_data_cost_fn(&mut self, function: DataCostFn) {
        self.model.set_data_cost_fn(function);
        self.engine.reset();
    }

    pub fn set_smooth_cost(
        &mut self,
        label_a: LabelId,
        label_b: LabelId,
        value: EnergyValue,
    ) -> Result<()> {
        self.reconfigure(|model| model.set_smooth_cost(label_a, label_b, value))
    }

    // Row-major table of num_labels x num_labels entries
    pub fn set_smooth_costs(&mut self, values: &[EnergyValue]) -> Result<()> {
        self.reconfigure(|model| model.set_smooth_costs(values))
    }

    pub fn set_smooth_cost_fn(&mut self, function: SmoothCostFn) {
        self.model.set_smooth_cost_fn(function);
        self.engine.reset();
    }

    // Grid only: pair table plus per-site weights of the edges (p, p + width) and (p, p + 1)
    pub fn set_smooth_cost_vh(
        &mut self,
        pair_costs: &[EnergyValue],
        vertical: &[EnergyValue],
        horizontal: &[EnergyValue],
    ) -> Result<()> {
        let num_labels = self.num_labels();
        check_len("smooth cost array", num_labels * num_labels, pair_costs.len())?;
        check_terms("smooth cost", pair_costs)?;
        let grid = self.graph.as_grid_mut().ok_or_else(|| {
            GcoError::Configuration(
                "vertical/horizontal weights require a grid topology".to_string(),
            )
        })?;
        grid.set_weights_vh(vertical, horizontal)?;
        self.reconfigure(|model| model.set_smooth_costs(pair_costs))
    }

    pub fn set_label_cost(&mut self, cost: EnergyValue) -> Result<()> {
        self.reconfigure(|model| model.set_label_cost(cost))
    }

    pub fn set_label_costs(&mut self, costs: &[EnergyValue]) -> Result<()> {
        self.reconfigure(|model| model.set_label_costs(costs))
    }

    pub fn set_label_subset_cost(&mut self, labels: &[LabelId], cost: EnergyValue) -> Result<()> {
        self.reconfigure(|model| model.set_label_subset_cost(labels, cost))
    }

    // Neighborhood

    fn general_mut(&mut self) -> Result<&mut GeneralTopology> {
        self.graph.as_general_mut().ok_or_else(|| {
            GcoError::Configuration("grid topology has an implicit neighborhood".to_string())
        })
    }

    pub fn add_neighbor(&mut self, site_a: SiteId, site_b: SiteId, weight: EnergyValue) -> Result<()> {
        self.general_mut()?.add_edge(site_a, site_b, weight)?;
        self.engine.reset();
        Ok(())
    }

    pub fn add_neighbors(
        &mut self,
        sites_a: &[SiteId],
        sites_b: &[SiteId],
        weights: &[EnergyValue],
    ) -> Result<()> {
        self.general_mut()?.add_edges(sites_a, sites_b, weights)?;
        self.engine.reset();
        Ok(())
    }

    // `counts[s]` consecutive entries of `neighbors` and `weights` belong to site s
    pub fn set_all_neighbors(
        &mut self,
        counts: &[usize],
        neighbors: &[SiteId],
        weights: &[EnergyValue],
    ) -> Result<()> {
        check_len("weight array", neighbors.len(), weights.len())?;
        let entries = neighbors
            .iter()
            .copied()
            .zip(weights.iter().copied())
            .collect();
        let jagged = JaggedArray2::from_lengths(counts, entries)?;
        self.general_mut()?.add_jagged(&jagged)?;
        self.engine.reset();
        Ok(())
    }

    // Labeling

    pub fn label(&self, site: SiteId) -> Result<LabelId> {
        self.labeling.label(site)
    }

    pub fn set_label(&mut self, site: SiteId, label: LabelId) -> Result<()> {
        self.labeling.set_label(site, label)?;
        self.engine.reset();
        Ok(())
    }

    pub fn labels(&self) -> &[LabelId] {
        self.labeling.as_slice()
    }

    pub fn labeling(&self) -> &Labeling {
        &self.labeling
    }

    pub fn labels_into(&self, start: SiteId, out: &mut [LabelId]) -> Result<()> {
        self.labeling.labels_into(start, out)
    }

    pub fn set_labels(&mut self, start: SiteId, labels: &[LabelId]) -> Result<()> {
        self.labeling.set_labels(start, labels)?;
        self.engine.reset();
        Ok(())
    }

    // Energies of the current labeling

    pub fn data_energy(&self) -> EnergyValue {
        self.model.data_energy(&self.labeling)
    }

    pub fn smooth_energy(&self) -> EnergyValue {
        self.model.smooth_energy(&self.graph, &self.labeling)
    }

    pub fn label_energy(&self) -> EnergyValue {
        self.model.label_energy(&self.labeling)
    }

    pub fn energy(&self) -> EnergyValue {
        self.model.total_energy(&self.graph, &self.labeling)
    }

    pub fn energy_breakdown(&self) -> EnergyBreakdown {
        self.model.breakdown(&self.graph, &self.labeling)
    }

    // Optimization

    pub fn expansion(&mut self, max_iterations: Option<usize>) -> Result<RunSummary> {
        self.engine
            .expansion(&self.model, &self.graph, &mut self.labeling, max_iterations)
    }

    pub fn swap(&mut self, max_iterations: Option<usize>) -> Result<RunSummary> {
        self.engine
            .swap(&self.model, &self.graph, &mut self.labeling, max_iterations)
    }

    pub fn alpha_expansion(&mut self, alpha: LabelId) -> Result<bool> {
        self.engine
            .alpha_expansion(&self.model, &self.graph, &mut self.labeling, alpha)
    }

    pub fn alpha_beta_swap(&mut self, alpha: LabelId, beta: LabelId) -> Result<bool> {
        self.engine
            .alpha_beta_swap(&self.model, &self.graph, &mut self.labeling, alpha, beta)
    }

    // Engine options

    pub fn options(&self) -> &SolverOptions {
        self.engine.options()
    }

    pub fn set_options(&mut self, options: SolverOptions) {
        self.engine.set_options(options);
    }

    pub fn verbosity(&self) -> u8 {
        self.engine.options().verbosity()
    }

    pub fn random_label_order(&self) -> bool {
        self.engine.options().random_label_order()
    }

    pub fn set_verbosity(&mut self, level: u8) {
        self.engine.set_verbosity(level);
        self.engine.reset();
    }

    pub fn set_random_label_order(&mut self, value: bool) {
        self.engine.set_random_label_order(value);
        self.engine.reset();
    }

    pub fn set_label_order(&mut self, order: &[LabelId]) -> Result<()> {
        self.engine.set_label_order(order, self.model.num_labels())?;
        self.engine.reset();
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.engine.set_seed(seed);
        self.engine.reset();
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        alg::solver::RunStatus,
        maxflow::{flow_network::FlowNetwork, min_cut::MinCut},
        MAX_TERM,
    };

    use super::*;

    fn potts(num_labels: usize, penalty: EnergyValue) -> Vec<EnergyValue> {
        (0..num_labels * num_labels)
            .map(|i| if i / num_labels == i % num_labels { 0 } else { penalty })
            .collect()
    }

    #[test]
    fn zero_labels_rejected() {
        assert!(matches!(
            GraphCutOptimizer::general(3, 0),
            Err(GcoError::Configuration(_))
        ));
    }

    #[test]
    fn topology_specific_calls() {
        let mut grid = GraphCutOptimizer::grid(3, 2, 2).unwrap();
        assert!(matches!(
            grid.add_neighbor(0, 1, 1),
            Err(GcoError::Configuration(_))
        ));
        assert!(grid.set_all_neighbors(&[0; 6], &[], &[]).is_err());

        let mut general = GraphCutOptimizer::general(3, 2).unwrap();
        assert!(matches!(
            general.set_smooth_cost_vh(&potts(2, 1), &[1; 3], &[1; 3]),
            Err(GcoError::Configuration(_))
        ));
    }

    #[test]
    fn vh_weights_scale_smooth_energy() {
        // 2 x 2 grid: sites 0 1 / 2 3
        let mut optimizer = GraphCutOptimizer::grid(2, 2, 2).unwrap();
        optimizer
            .set_smooth_cost_vh(&potts(2, 1), &[5, 7, 0, 0], &[2, 0, 3, 0])
            .unwrap();
        optimizer.set_labels(0, &[0, 1, 0, 1]).unwrap();
        // Horizontal edges (0,1) and (2,3) are cut
        assert_eq!(optimizer.smooth_energy(), 2 + 3);

        optimizer.set_labels(0, &[0, 0, 1, 1]).unwrap();
        // Vertical edges (0,2) and (1,3) are cut
        assert_eq!(optimizer.smooth_energy(), 5 + 7);
    }

    #[test]
    fn vh_validation_is_all_or_nothing() {
        let mut optimizer = GraphCutOptimizer::grid(2, 2, 2).unwrap();
        optimizer.set_smooth_costs(&potts(2, 4)).unwrap();
        assert!(optimizer
            .set_smooth_cost_vh(&potts(2, 1), &[1, -1, 0, 0], &[1, 0, 1, 0])
            .is_err());
        assert!(optimizer
            .set_smooth_cost_vh(&[0, 1, 1], &[1; 4], &[1; 4])
            .is_err());
        optimizer.set_labels(0, &[0, 1, 1, 1]).unwrap();
        assert_eq!(optimizer.smooth_energy(), 2 * 4);
    }

    #[test]
    fn jagged_neighbors_match_single_calls() {
        let mut jagged = GraphCutOptimizer::general(3, 2).unwrap();
        jagged
            .set_all_neighbors(&[1, 2, 0], &[1, 0, 2], &[4, 1, 3])
            .unwrap();
        let mut single = GraphCutOptimizer::general(3, 2).unwrap();
        single.add_neighbor(0, 1, 4).unwrap();
        single.add_neighbor(1, 0, 1).unwrap();
        single.add_neighbor(1, 2, 3).unwrap();

        for optimizer in [&mut jagged, &mut single] {
            optimizer.set_smooth_costs(&potts(2, 1)).unwrap();
            optimizer.set_labels(0, &[0, 1, 0]).unwrap();
        }
        assert_eq!(jagged.smooth_energy(), 5 + 3);
        assert_eq!(jagged.smooth_energy(), single.smooth_energy());

        assert!(jagged.set_all_neighbors(&[1, 1, 0], &[1], &[1]).is_err());
        assert!(jagged.set_all_neighbors(&[1, 0, 0], &[1], &[1, 2]).is_err());
        assert!(matches!(
            jagged.set_all_neighbors(&[usize::MAX, 1, 0], &[1], &[1]),
            Err(GcoError::Configuration(_))
        ));
        assert_eq!(jagged.smooth_energy(), 5 + 3);
    }

    #[test]
    fn reconfiguration_returns_to_idle() {
        let mut optimizer = GraphCutOptimizer::general(2, 2).unwrap();
        optimizer.set_data_costs(&[0, 5, 5, 0]).unwrap();
        optimizer.expansion(None).unwrap();
        assert_eq!(optimizer.state(), EngineState::Converged);
        assert_eq!(optimizer.labels(), &[0, 1]);

        optimizer.set_data_cost(0, 0, 9).unwrap();
        assert_eq!(optimizer.state(), EngineState::Idle);

        optimizer.expansion(None).unwrap();
        optimizer.set_label(1, 0).unwrap();
        assert_eq!(optimizer.state(), EngineState::Idle);

        optimizer.set_verbosity(2);
        optimizer.set_random_label_order(true);
        assert_eq!(optimizer.verbosity(), 2);
        assert!(optimizer.random_label_order());
    }

    #[test]
    fn label_accessors() {
        let mut optimizer = GraphCutOptimizer::general(4, 3).unwrap();
        optimizer.set_labels(1, &[2, 1]).unwrap();
        assert_eq!(optimizer.label(2).unwrap(), 1);
        assert!(optimizer.set_labels(3, &[0, 0]).is_err());
        assert!(optimizer.set_labels(0, &[0, 3]).is_err());
        assert_eq!(optimizer.labels(), &[0, 2, 1, 0]);

        let mut out = [0; 2];
        optimizer.labels_into(1, &mut out).unwrap();
        assert_eq!(out, [2, 1]);
        assert!(optimizer.label(4).is_err());
    }

    // Delegates to Dinic and counts the calls
    #[derive(Default)]
    struct CountingSolver {
        inner: DinicSolver,
        calls: usize,
    }

    impl MinCutSolver for CountingSolver {
        fn solve(&mut self, network: &FlowNetwork) -> Result<MinCut> {
            self.calls += 1;
            self.inner.solve(network)
        }
    }

    #[test]
    fn custom_solver_is_used() {
        let mut optimizer = GraphCutOptimizer::general(3, 3)
            .unwrap()
            .with_solver(CountingSolver::default());
        optimizer.set_data_costs(&[0, 4, 4, 4, 0, 4, 4, 4, 0]).unwrap();
        assert!(optimizer.alpha_expansion(1).unwrap());
        assert!(optimizer.alpha_expansion(2).unwrap());
        assert_eq!(optimizer.labels(), &[0, 1, 2]);
        assert_eq!(optimizer.engine.solver().calls, 2);
    }

    // Answers honestly for the first `honest_calls` calls, then overstates the cut value
    struct MisreportingSolver {
        inner: DinicSolver,
        honest_calls: usize,
        calls: usize,
    }

    impl MinCutSolver for MisreportingSolver {
        fn solve(&mut self, network: &FlowNetwork) -> Result<MinCut> {
            self.calls += 1;
            let mut cut = self.inner.solve(network)?;
            if self.calls > self.honest_calls {
                cut.value += 1;
            }
            Ok(cut)
        }
    }

    fn misreporting(honest_calls: usize) -> GraphCutOptimizer<MisreportingSolver> {
        let mut optimizer = GraphCutOptimizer::general(3, 3)
            .unwrap()
            .with_solver(MisreportingSolver {
                inner: DinicSolver::new(),
                honest_calls,
                calls: 0,
            });
        optimizer.set_data_costs(&[0, 4, 4, 4, 0, 4, 4, 4, 0]).unwrap();
        optimizer
    }

    #[test]
    fn inconsistent_cut_aborts_run() {
        // Pass 1 solves two moves (alpha = 1, 2); the first move of pass 2 gets a wrong cut
        let mut optimizer = misreporting(2);
        let result = optimizer.expansion(None);
        assert!(matches!(result, Err(GcoError::Engine(_))));
        assert_eq!(optimizer.labels(), &[0, 1, 2]);
        assert_eq!(optimizer.state(), EngineState::Idle);
        assert_eq!(optimizer.energy(), 0);

        // A misreported value before any move leaves the initial labeling
        let mut optimizer = misreporting(0);
        assert!(matches!(
            optimizer.alpha_expansion(1),
            Err(GcoError::Engine(_))
        ));
        assert_eq!(optimizer.labels(), &[0, 0, 0]);
        assert_eq!(optimizer.state(), EngineState::Idle);
    }

    #[test]
    fn unverified_cuts_still_decided_on_exact_energy() {
        let mut optimizer = misreporting(0);
        let mut options = SolverOptions::default();
        options.set_verify_cuts(false);
        optimizer.set_options(options);
        let summary = optimizer.expansion(None).unwrap();
        assert_eq!(summary.status, RunStatus::Converged);
        assert_eq!(optimizer.labels(), &[0, 1, 2]);
    }

    #[test]
    fn terms_beyond_limit_rejected() {
        let too_large = MAX_TERM + 1;
        let mut optimizer = GraphCutOptimizer::general(2, 2).unwrap();
        assert!(optimizer.add_neighbor(0, 1, 1 << 40).is_err());
        assert!(optimizer.set_smooth_cost(0, 1, MAX_TERM).is_ok());
        assert!(optimizer.set_smooth_cost(0, 1, too_large).is_err());
        assert!(optimizer.set_smooth_costs(&[0, too_large, 1, 0]).is_err());
        assert!(optimizer.set_data_cost(1, 1, -too_large).is_err());
        assert!(optimizer.set_data_costs(&[0, 0, EnergyValue::MIN, 0]).is_err());
        assert!(optimizer.set_label_cost(too_large).is_err());

        let mut grid = GraphCutOptimizer::grid(2, 1, 2).unwrap();
        assert!(grid
            .set_smooth_cost_vh(&[0, 1, 1, 0], &[0, 0], &[too_large, 0])
            .is_err());
        assert!(grid
            .set_smooth_cost_vh(&[0, too_large, 1, 0], &[0, 0], &[1, 0])
            .is_err());
        // Unused boundary entries are ignored
        grid.set_smooth_cost_vh(&[0, 1, 1, 0], &[too_large, 0], &[1, too_large])
            .unwrap();
    }

    #[test]
    fn largest_terms_do_not_overflow() {
        let mut optimizer = GraphCutOptimizer::general(2, 2).unwrap();
        optimizer.add_neighbor(0, 1, MAX_TERM).unwrap();
        optimizer
            .set_smooth_costs(&[0, MAX_TERM, MAX_TERM, 0])
            .unwrap();
        optimizer.set_data_costs(&[0, MAX_TERM, MAX_TERM, 0]).unwrap();
        optimizer.set_labels(0, &[0, 1]).unwrap();
        assert_eq!(optimizer.smooth_energy(), MAX_TERM * MAX_TERM);

        optimizer.expansion(None).unwrap();
        assert_eq!(optimizer.energy(), MAX_TERM);
    }

    #[test]
    fn breakdown_sums_to_total() {
        let mut optimizer = GraphCutOptimizer::grid(3, 1, 3).unwrap();
        optimizer
            .set_data_costs(&[1, 2, 3, 4, 5, 6, 7, 8, 9])
            .unwrap();
        optimizer.set_smooth_costs(&potts(3, 2)).unwrap();
        optimizer.set_label_cost(10).unwrap();
        optimizer.set_labels(0, &[0, 1, 1]).unwrap();
        let breakdown = optimizer.energy_breakdown();
        assert_eq!(breakdown.data, 1 + 5 + 8);
        assert_eq!(breakdown.smooth, 2);
        assert_eq!(breakdown.label, 20);
        assert_eq!(breakdown.total(), optimizer.energy());
        assert_eq!(optimizer.data_energy(), breakdown.data);
        assert_eq!(optimizer.label_energy(), breakdown.label);
    }
}
