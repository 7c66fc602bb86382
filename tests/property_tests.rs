//! Property-based tests using proptest
//!
//! Random tiny labeling problems on explicit neighborhoods, small enough to
//! enumerate every labeling.

use gco_rust::{EnergyValue, GraphCutOptimizer, LabelId, SiteId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Instance {
    num_sites: usize,
    num_labels: usize,
    data: Vec<EnergyValue>,
    edges: Vec<(SiteId, SiteId, EnergyValue)>,
    labels: Vec<LabelId>,
}

impl Instance {
    fn build(&self, smooth: &[EnergyValue]) -> GraphCutOptimizer {
        let mut optimizer = GraphCutOptimizer::general(self.num_sites, self.num_labels).unwrap();
        optimizer.set_data_costs(&self.data).unwrap();
        optimizer.set_smooth_costs(smooth).unwrap();
        for &(site_a, site_b, weight) in &self.edges {
            optimizer.add_neighbor(site_a, site_b, weight).unwrap();
        }
        optimizer.set_labels(0, &self.labels).unwrap();
        optimizer.set_seed(1);
        optimizer
    }
}

// Sites, labels, non-negative data costs, self-loop free edges and a starting labeling
fn instance_strategy(max_sites: usize, num_labels: usize) -> impl Strategy<Value = Instance> {
    (2..=max_sites).prop_flat_map(move |num_sites| {
        (
            prop::collection::vec(0..20i64, num_sites * num_labels),
            prop::collection::vec((0..num_sites, 0..num_sites, 0..6i64), 0..2 * num_sites),
            prop::collection::vec(0..num_labels, num_sites),
        )
            .prop_map(move |(data, edges, labels)| Instance {
                num_sites,
                num_labels,
                data,
                edges: edges.into_iter().filter(|&(a, b, _)| a != b).collect(),
                labels,
            })
    })
}

fn potts(num_labels: usize, penalty: EnergyValue) -> Vec<EnergyValue> {
    (0..num_labels * num_labels)
        .map(|i| if i / num_labels == i % num_labels { 0 } else { penalty })
        .collect()
}

// Symmetric table with zero diagonal and non-negative entries
fn semi_metric_strategy(num_labels: usize) -> impl Strategy<Value = Vec<EnergyValue>> {
    prop::collection::vec(0..10i64, num_labels * num_labels).prop_map(move |raw| {
        let mut table = vec![0; num_labels * num_labels];
        for a in 0..num_labels {
            for b in a + 1..num_labels {
                table[a * num_labels + b] = raw[a * num_labels + b];
                table[b * num_labels + a] = raw[a * num_labels + b];
            }
        }
        table
    })
}

fn brute_force_minimum(optimizer: &mut GraphCutOptimizer) -> EnergyValue {
    let num_sites = optimizer.num_sites();
    let num_labels = optimizer.num_labels();
    let saved = optimizer.labels().to_vec();
    let mut best = EnergyValue::MAX;
    let total = num_labels.pow(num_sites as u32);
    let mut labels = vec![0; num_sites];
    for code in 0..total {
        let mut rest = code;
        for label in labels.iter_mut() {
            *label = rest % num_labels;
            rest /= num_labels;
        }
        optimizer.set_labels(0, &labels).unwrap();
        best = best.min(optimizer.energy());
    }
    optimizer.set_labels(0, &saved).unwrap();
    best
}

proptest! {
    // Property: total energy is the sum of its three terms before and after optimization
    #[test]
    fn test_energy_decomposition(
        instance in instance_strategy(6, 3),
        smooth in semi_metric_strategy(3),
        label_cost in 0..30i64
    ) {
        let mut optimizer = instance.build(&smooth);
        optimizer.set_label_cost(label_cost).unwrap();
        let check = |optimizer: &GraphCutOptimizer| {
            optimizer.data_energy() + optimizer.smooth_energy() + optimizer.label_energy()
                == optimizer.energy()
        };
        prop_assert!(check(&optimizer));
        optimizer.swap(None).unwrap();
        prop_assert!(check(&optimizer));
        optimizer.expansion(None).unwrap();
        prop_assert!(check(&optimizer));
        prop_assert_eq!(optimizer.energy_breakdown().total(), optimizer.energy());
    }

    // Property: no single move increases the energy, even for non-metric costs
    #[test]
    fn test_moves_are_monotone(
        instance in instance_strategy(6, 3),
        smooth in prop::collection::vec(0..10i64, 9),
        label_cost in 0..30i64,
        moves in prop::collection::vec((0..3usize, 0..3usize, any::<bool>()), 1..12)
    ) {
        let mut optimizer = instance.build(&smooth);
        optimizer.set_label_cost(label_cost).unwrap();
        let mut energy = optimizer.energy();
        for (alpha, beta, expand) in moves {
            let accepted = if expand {
                optimizer.alpha_expansion(alpha).unwrap()
            } else {
                optimizer.alpha_beta_swap(alpha, beta).unwrap()
            };
            let next = optimizer.energy();
            if accepted {
                prop_assert!(next < energy, "accepted move went from {} to {}", energy, next);
            } else {
                prop_assert_eq!(next, energy);
            }
            energy = next;
        }
    }

    // Property: declaring an edge twice equals declaring it once with the summed weight
    #[test]
    fn test_neighbor_accumulation(
        instance in instance_strategy(5, 3),
        smooth in prop::collection::vec(0..10i64, 9),
        extra in prop::collection::vec(0..6i64, 10)
    ) {
        let mut split = instance.build(&smooth);
        let mut merged = GraphCutOptimizer::general(instance.num_sites, 3).unwrap();
        merged.set_smooth_costs(&smooth).unwrap();
        merged.set_labels(0, &instance.labels).unwrap();
        for (i, &(site_a, site_b, weight)) in instance.edges.iter().enumerate() {
            let bonus = extra[i % extra.len()];
            split.add_neighbor(site_b, site_a, bonus).unwrap();
            merged.add_neighbor(site_a, site_b, weight + bonus).unwrap();
        }
        prop_assert_eq!(split.smooth_energy(), merged.smooth_energy());
    }

    // Property: with two labels and a submodular pair cost both move types reach the global optimum
    #[test]
    fn test_binary_problems_solved_exactly(
        instance in instance_strategy(7, 2),
        penalty in 0..10i64
    ) {
        let smooth = potts(2, penalty);
        let mut optimizer = instance.build(&smooth);
        let minimum = brute_force_minimum(&mut optimizer);

        optimizer.expansion(None).unwrap();
        prop_assert_eq!(optimizer.energy(), minimum);

        let mut optimizer = instance.build(&smooth);
        optimizer.swap(None).unwrap();
        prop_assert_eq!(optimizer.energy(), minimum);
    }

    // Property: expansion on a Potts model stays within twice the optimum
    #[test]
    fn test_expansion_potts_bound(
        instance in instance_strategy(6, 3),
        penalty in 0..10i64,
        random_order in any::<bool>()
    ) {
        let mut optimizer = instance.build(&potts(3, penalty));
        optimizer.set_random_label_order(random_order);
        let minimum = brute_force_minimum(&mut optimizer);

        let summary = optimizer.expansion(None).unwrap();
        prop_assert!(summary.energy.total() >= minimum);
        prop_assert!(summary.energy.total() <= 2 * minimum);
    }

    // Property: a converged run accepts nothing when repeated
    #[test]
    fn test_converged_runs_are_idempotent(
        instance in instance_strategy(6, 3),
        smooth in semi_metric_strategy(3)
    ) {
        let mut optimizer = instance.build(&smooth);
        let first = optimizer.swap(None).unwrap();
        let second = optimizer.swap(None).unwrap();
        prop_assert_eq!(second.accepted_moves, 0);
        prop_assert_eq!(second.energy, first.energy);
    }
}
