use std::fmt::Display;

use ndarray::ArrayView2;

use crate::{
    error::{GcoError, Result},
    labeling::Labeling,
    topology::neighbor_graph::NeighborGraph,
    EnergyValue, LabelId, SiteId,
};

use super::{
    data_cost::{DataCost, DataCostFn},
    label_cost::LabelCost,
    smooth_cost::{SmoothCost, SmoothCostFn},
};

// Energy of a labeling split into its three terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyBreakdown {
    pub data: EnergyValue,
    pub smooth: EnergyValue,
    pub label: EnergyValue,
}

impl EnergyBreakdown {
    pub fn total(&self) -> EnergyValue {
        self.data + self.smooth + self.label
    }
}

impl Display for EnergyBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (data {}, smooth {}, label {})",
            self.total(),
            self.data,
            self.smooth,
            self.label
        )
    }
}

// Owns the data, smooth, and label cost tables of a labeling problem
#[derive(Debug)]
pub struct EnergyModel {
    num_sites: usize,
    num_labels: usize,
    data_cost: DataCost,
    smooth_cost: SmoothCost,
    label_cost: LabelCost,
}

impl EnergyModel {
    // Creates a model with all costs set to zero
    pub fn new(num_sites: usize, num_labels: usize) -> Result<Self> {
        if num_labels == 0 {
            return Err(GcoError::Configuration(
                "number of labels must be positive".to_string(),
            ));
        }
        Ok(EnergyModel {
            num_sites,
            num_labels,
            data_cost: DataCost::zeros(num_sites, num_labels),
            smooth_cost: SmoothCost::zeros(num_labels),
            label_cost: LabelCost::new(num_labels),
        })
    }

    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn set_data_cost(&mut self, site: SiteId, label: LabelId, value: EnergyValue) -> Result<()> {
        self.data_cost.set(site, label, value)
    }

    pub fn set_data_costs(&mut self, values: &[EnergyValue]) -> Result<()> {
        self.data_cost.set_all(values)
    }

    pub fn set_data_cost_array(&mut self, values: ArrayView2<EnergyValue>) -> Result<()> {
        self.data_cost.set_view(values)
    }

    pub fn set_data_cost_fn(&mut self, function: DataCostFn) {
        self.data_cost.set_function(function)
    }

    pub fn set_smooth_cost(
        &mut self,
        label_a: LabelId,
        label_b: LabelId,
        value: EnergyValue,
    ) -> Result<()> {
        self.smooth_cost.set(label_a, label_b, value)
    }

    pub fn set_smooth_costs(&mut self, values: &[EnergyValue]) -> Result<()> {
        self.smooth_cost.set_all(values)
    }

    pub fn set_smooth_cost_fn(&mut self, function: SmoothCostFn) {
        self.smooth_cost.set_function(function)
    }

    pub fn set_label_cost(&mut self, cost: EnergyValue) -> Result<()> {
        self.label_cost.set_uniform(cost)
    }

    pub fn set_label_costs(&mut self, costs: &[EnergyValue]) -> Result<()> {
        self.label_cost.set_per_label(costs)
    }

    pub fn set_label_subset_cost(&mut self, labels: &[LabelId], cost: EnergyValue) -> Result<()> {
        self.label_cost.add_subset(labels, cost)
    }

    pub fn smooth_cost(&self) -> &SmoothCost {
        &self.smooth_cost
    }

    pub fn label_cost(&self) -> &LabelCost {
        &self.label_cost
    }

    // Cost of assigning `label` to `site`
    #[inline]
    pub fn data(&self, site: SiteId, label: LabelId) -> EnergyValue {
        self.data_cost.cost(site, label)
    }

    // Cost of the edge (site_a, site_b) with the given weight and labels
    #[inline]
    pub fn smooth(
        &self,
        site_a: SiteId,
        site_b: SiteId,
        weight: EnergyValue,
        label_a: LabelId,
        label_b: LabelId,
    ) -> EnergyValue {
        weight * self.smooth_cost.cost(site_a, site_b, label_a, label_b)
    }

    pub fn data_energy(&self, labeling: &Labeling) -> EnergyValue {
        (0..labeling.num_sites())
            .map(|site| self.data(site, labeling[site]))
            .sum()
    }

    // Sums weight * V(label_a, label_b) over every undirected edge exactly once
    pub fn smooth_energy(&self, graph: &NeighborGraph, labeling: &Labeling) -> EnergyValue {
        let mut energy = 0;
        graph.for_each_edge(|site_a, site_b, weight| {
            energy += self.smooth(site_a, site_b, weight, labeling[site_a], labeling[site_b]);
        });
        energy
    }

    pub fn label_energy(&self, labeling: &Labeling) -> EnergyValue {
        if self.label_cost.is_zero() {
            return 0;
        }
        self.label_cost.energy(&labeling.used_labels())
    }

    pub fn breakdown(&self, graph: &NeighborGraph, labeling: &Labeling) -> EnergyBreakdown {
        EnergyBreakdown {
            data: self.data_energy(labeling),
            smooth: self.smooth_energy(graph, labeling),
            label: self.label_energy(labeling),
        }
    }

    pub fn total_energy(&self, graph: &NeighborGraph, labeling: &Labeling) -> EnergyValue {
        self.breakdown(graph, labeling).total()
    }
}
