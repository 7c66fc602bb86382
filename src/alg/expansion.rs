use crate::{
    energy::{energy_model::EnergyModel, label_cost::LabelCostTerm},
    labeling::Labeling,
    topology::neighbor_graph::NeighborGraph,
    LabelId,
};

use super::binary_problem::{BinaryProblem, MoveProblem, FIXED};

// Builds the alpha-expansion move: every site not labeled `alpha` either keeps its
// label (x = 0) or switches to `alpha` (x = 1). Returns None if all sites already hold `alpha`.
pub fn build_expansion(
    model: &EnergyModel,
    graph: &NeighborGraph,
    labeling: &Labeling,
    label_terms: &[LabelCostTerm],
    alpha: LabelId,
) -> Option<MoveProblem> {
    let num_sites = labeling.num_sites();
    let mut var_of = vec![FIXED; num_sites];
    let mut sites = Vec::new();
    for site in 0..num_sites {
        if labeling[site] != alpha {
            var_of[site] = sites.len();
            sites.push(site);
        }
    }
    if sites.is_empty() {
        return None;
    }

    let mut problem = BinaryProblem::new(sites.len());

    // Data terms
    for (var, &site) in sites.iter().enumerate() {
        problem.add_unary(var, model.data(site, labeling[site]), model.data(site, alpha));
    }

    // Smoothness terms; edges between two fixed sites are constant
    graph.for_each_edge(|site_a, site_b, weight| {
        if weight == 0 {
            return;
        }
        let (label_a, label_b) = (labeling[site_a], labeling[site_b]);
        let smooth = |first, second| model.smooth(site_a, site_b, weight, first, second);
        match (var_of[site_a], var_of[site_b]) {
            (FIXED, FIXED) => {}
            (var_a, FIXED) => {
                problem.add_unary(var_a, smooth(label_a, alpha), smooth(alpha, alpha))
            }
            (FIXED, var_b) => {
                problem.add_unary(var_b, smooth(alpha, label_b), smooth(alpha, alpha))
            }
            (var_a, var_b) => problem.add_pairwise(
                var_a,
                var_b,
                smooth(label_a, label_b),
                smooth(label_a, alpha),
                smooth(alpha, label_b),
                smooth(alpha, alpha),
            ),
        }
    });

    // Label costs. A term containing alpha that is already paid stays paid, since its users
    // either keep their label or move to alpha. An unpaid one is paid if anybody switches.
    // A paid term without alpha is dropped only if all of its users switch.
    if !label_terms.is_empty() {
        let used = labeling.used_labels();
        let mut vars_by_label = vec![Vec::new(); labeling.num_labels()];
        for (var, &site) in sites.iter().enumerate() {
            vars_by_label[labeling[site]].push(var);
        }
        let all_vars: Vec<usize> = (0..sites.len()).collect();

        for term in label_terms {
            let is_used = term.is_used(&used);
            if term.contains(alpha) {
                if !is_used {
                    problem.add_any_term(&all_vars, true, term.cost);
                }
            } else if is_used {
                let users: Vec<usize> = term
                    .labels
                    .iter_ones()
                    .flat_map(|label| vars_by_label[label].iter().copied())
                    .collect();
                problem.add_any_term(&users, false, term.cost);
            }
        }
    }

    Some(MoveProblem { problem, sites })
}
