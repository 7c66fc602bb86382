use bitvec::bitvec;

use crate::{
    energy::{energy_model::EnergyModel, label_cost::LabelCostTerm},
    labeling::Labeling,
    topology::neighbor_graph::NeighborGraph,
    LabelId,
};

use super::binary_problem::{BinaryProblem, MoveProblem, FIXED};

// Builds the alpha-beta-swap move: every site labeled `alpha` or `beta` takes
// `alpha` (x = 0) or `beta` (x = 1); all other sites are fixed.
// Returns None if no site holds either label.
pub fn build_swap(
    model: &EnergyModel,
    graph: &NeighborGraph,
    labeling: &Labeling,
    label_terms: &[LabelCostTerm],
    alpha: LabelId,
    beta: LabelId,
) -> Option<MoveProblem> {
    let num_sites = labeling.num_sites();
    let mut var_of = vec![FIXED; num_sites];
    let mut sites = Vec::new();
    for site in 0..num_sites {
        if labeling[site] == alpha || labeling[site] == beta {
            var_of[site] = sites.len();
            sites.push(site);
        }
    }
    if sites.is_empty() {
        return None;
    }

    let mut problem = BinaryProblem::new(sites.len());

    for (var, &site) in sites.iter().enumerate() {
        problem.add_unary(var, model.data(site, alpha), model.data(site, beta));
    }

    graph.for_each_edge(|site_a, site_b, weight| {
        if weight == 0 {
            return;
        }
        let (label_a, label_b) = (labeling[site_a], labeling[site_b]);
        let smooth = |first, second| model.smooth(site_a, site_b, weight, first, second);
        match (var_of[site_a], var_of[site_b]) {
            (FIXED, FIXED) => {}
            (var_a, FIXED) => {
                problem.add_unary(var_a, smooth(alpha, label_b), smooth(beta, label_b))
            }
            (FIXED, var_b) => {
                problem.add_unary(var_b, smooth(label_a, alpha), smooth(label_a, beta))
            }
            (var_a, var_b) => problem.add_pairwise(
                var_a,
                var_b,
                smooth(alpha, alpha),
                smooth(alpha, beta),
                smooth(beta, alpha),
                smooth(beta, beta),
            ),
        }
    });

    // Label costs: terms already paid by fixed sites, and terms holding both or neither
    // of the two labels, do not depend on the move
    if !label_terms.is_empty() {
        let mut fixed_used = bitvec![0; labeling.num_labels()];
        for site in (0..num_sites).filter(|&site| var_of[site] == FIXED) {
            fixed_used.set(labeling[site], true);
        }
        let all_vars: Vec<usize> = (0..sites.len()).collect();

        for term in label_terms {
            if term.is_used(&fixed_used) {
                continue;
            }
            match (term.contains(alpha), term.contains(beta)) {
                (true, false) => problem.add_any_term(&all_vars, false, term.cost),
                (false, true) => problem.add_any_term(&all_vars, true, term.cost),
                _ => {}
            }
        }
    }

    Some(MoveProblem { problem, sites })
}

#[cfg(test)]
mod tests {
    use crate::alg::test_support::{assert_move_energy_consistent, chain_problem};

    use super::*;

    #[test]
    fn only_alpha_and_beta_sites_are_variables() {
        let (model, graph) = chain_problem(5, 3);
        let labeling = Labeling::from_labels(vec![0, 1, 2, 1, 0], 3).unwrap();
        let mv = build_swap(&model, &graph, &labeling, &[], 1, 2).unwrap();
        assert_eq!(mv.sites, vec![1, 2, 3]);

        let labeling = Labeling::from_labels(vec![0; 5], 3).unwrap();
        assert!(build_swap(&model, &graph, &labeling, &[], 1, 2).is_none());
    }

    #[test]
    fn binary_energy_tracks_labeling_energy() {
        let (mut model, graph) = chain_problem(6, 4);
        model.set_label_cost(2).unwrap();
        model.set_label_subset_cost(&[0, 3], 9).unwrap();
        model.set_label_subset_cost(&[1, 2], 4).unwrap();
        let terms = model.label_cost().terms();
        let labeling = Labeling::from_labels(vec![0, 1, 2, 1, 3, 0], 4).unwrap();
        for alpha in 0..4 {
            for beta in alpha + 1..4 {
                let mv = build_swap(&model, &graph, &labeling, &terms, alpha, beta).unwrap();
                assert_move_energy_consistent(&model, &graph, &labeling, &mv, |_, to_beta| {
                    if to_beta {
                        beta
                    } else {
                        alpha
                    }
                });
            }
        }
    }
}
