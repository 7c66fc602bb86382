use crate::{
    energy::energy_model::EnergyModel,
    labeling::Labeling,
    topology::{general::GeneralTopology, neighbor_graph::NeighborGraph},
    EnergyValue, LabelId, SiteId,
};

use super::binary_problem::MoveProblem;

// Chain 0 - 1 - ... - (n-1) with a truncated linear (metric) smooth cost
pub(crate) fn chain_problem(num_sites: usize, num_labels: usize) -> (EnergyModel, NeighborGraph) {
    let mut model = EnergyModel::new(num_sites, num_labels).unwrap();
    let data: Vec<EnergyValue> = (0..num_sites)
        .flat_map(|s| (0..num_labels).map(move |l| ((s * 7 + l * 13) % 10) as EnergyValue))
        .collect();
    model.set_data_costs(&data).unwrap();
    let smooth: Vec<EnergyValue> = (0..num_labels)
        .flat_map(|a| (0..num_labels).map(move |b| (a.abs_diff(b).min(2) * 3) as EnergyValue))
        .collect();
    model.set_smooth_costs(&smooth).unwrap();

    let mut topology = GeneralTopology::new(num_sites);
    for s in 1..num_sites {
        topology
            .add_edge(s - 1, s, (s % 3) as EnergyValue + 1)
            .unwrap();
    }
    (model, NeighborGraph::General(topology))
}

// Checks that for every assignment of the move's site variables, the binary energy
// (minimized over auxiliary variables) differs from the exact energy by the same constant
pub(crate) fn assert_move_energy_consistent<F>(
    model: &EnergyModel,
    graph: &NeighborGraph,
    labeling: &Labeling,
    mv: &MoveProblem,
    label_for: F,
) where
    F: Fn(SiteId, bool) -> LabelId,
{
    let num_sites = mv.sites.len();
    let num_aux = mv.problem.num_variables() - num_sites;
    assert!(num_sites + num_aux <= 20);

    let mut offset = None;
    for site_bits in 0u32..(1 << num_sites) {
        let mut candidate = labeling.clone();
        for (var, &site) in mv.sites.iter().enumerate() {
            candidate[site] = label_for(site, site_bits >> var & 1 == 1);
        }
        let exact = model.total_energy(graph, &candidate);

        let binary = (0u32..(1 << num_aux))
            .map(|aux_bits| {
                let bits = site_bits | aux_bits << num_sites;
                mv.problem.evaluate(|var| bits >> var & 1 == 1)
            })
            .min()
            .unwrap();

        match offset {
            None => offset = Some(exact - binary),
            Some(offset) => assert_eq!(
                exact - binary,
                offset,
                "assignment {:b} breaks the energy offset",
                site_bits
            ),
        }
    }
}
