use bitvec::{bitvec, vec::BitVec};

use crate::{
    error::{check_label, check_len, check_term, GcoError, Result},
    EnergyValue, LabelId,
};

// A cost charged once if any label of the set appears in the labeling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCostTerm {
    pub labels: BitVec,
    pub cost: EnergyValue,
}

impl LabelCostTerm {
    pub fn contains(&self, label: LabelId) -> bool {
        self.labels[label]
    }

    // Returns true if any label of the set is marked in `used`
    pub fn is_used(&self, used: &BitVec) -> bool {
        self.labels.iter_ones().any(|label| used[label])
    }
}

// Label-usage costs. The three components sum:
// - `uniform` is charged once for every label present,
// - `per_label[l]` is charged once if label l is present,
// - every subset term is charged once if any of its labels is present.
#[derive(Debug, Clone)]
pub struct LabelCost {
    num_labels: usize,
    uniform: EnergyValue,
    per_label: Vec<EnergyValue>,
    subsets: Vec<LabelCostTerm>,
}

fn check_non_negative(cost: EnergyValue) -> Result<()> {
    if cost < 0 {
        Err(GcoError::Configuration(format!(
            "label cost must be non-negative, got {}",
            cost
        )))
    } else {
        check_term("label cost", cost)
    }
}

impl LabelCost {
    pub fn new(num_labels: usize) -> Self {
        LabelCost {
            num_labels,
            uniform: 0,
            per_label: vec![0; num_labels],
            subsets: Vec::new(),
        }
    }

    pub fn set_uniform(&mut self, cost: EnergyValue) -> Result<()> {
        check_non_negative(cost)?;
        self.uniform = cost;
        Ok(())
    }

    pub fn set_per_label(&mut self, costs: &[EnergyValue]) -> Result<()> {
        check_len("label cost array", self.num_labels, costs.len())?;
        for &cost in costs {
            check_non_negative(cost)?;
        }
        self.per_label.copy_from_slice(costs);
        Ok(())
    }

    // Adds a cost charged once if any label in `labels` is used
    pub fn add_subset(&mut self, labels: &[LabelId], cost: EnergyValue) -> Result<()> {
        check_non_negative(cost)?;
        if labels.is_empty() {
            return Err(GcoError::Configuration(
                "label subset must not be empty".to_string(),
            ));
        }
        let mut set = bitvec![0; self.num_labels];
        for &label in labels {
            check_label(label, self.num_labels)?;
            set.set(label, true);
        }
        self.subsets.push(LabelCostTerm { labels: set, cost });
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.uniform == 0
            && self.per_label.iter().all(|&cost| cost == 0)
            && self.subsets.iter().all(|term| term.cost == 0)
    }

    // Flattens the three components into a list of non-zero set terms
    pub fn terms(&self) -> Vec<LabelCostTerm> {
        let mut terms = Vec::with_capacity(self.num_labels + self.subsets.len());
        for label in 0..self.num_labels {
            let cost = self.uniform + self.per_label[label];
            if cost != 0 {
                let mut labels = bitvec![0; self.num_labels];
                labels.set(label, true);
                terms.push(LabelCostTerm { labels, cost });
            }
        }
        terms.extend(self.subsets.iter().filter(|term| term.cost != 0).cloned());
        terms
    }

    // Computes the label energy given the set of used labels
    pub fn energy(&self, used: &BitVec) -> EnergyValue {
        let individual: EnergyValue = used
            .iter_ones()
            .map(|label| self.uniform + self.per_label[label])
            .sum();
        let subsets: EnergyValue = self
            .subsets
            .iter()
            .filter(|term| term.is_used(used))
            .map(|term| term.cost)
            .sum();
        individual + subsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(num_labels: usize, labels: &[LabelId]) -> BitVec {
        let mut used = bitvec![0; num_labels];
        for &label in labels {
            used.set(label, true);
        }
        used
    }

    #[test]
    fn components_sum() {
        let mut label_cost = LabelCost::new(4);
        label_cost.set_uniform(10).unwrap();
        label_cost.set_per_label(&[0, 1, 2, 3]).unwrap();
        label_cost.add_subset(&[2, 3], 100).unwrap();

        assert_eq!(label_cost.energy(&used(4, &[0, 1])), 10 + 10 + 1);
        assert_eq!(label_cost.energy(&used(4, &[2, 3])), 10 + 2 + 10 + 3 + 100);
        assert_eq!(label_cost.energy(&used(4, &[])), 0);
    }

    #[test]
    fn terms_match_energy() {
        let mut label_cost = LabelCost::new(3);
        label_cost.set_per_label(&[5, 0, 7]).unwrap();
        label_cost.add_subset(&[0, 1], 4).unwrap();
        let terms = label_cost.terms();
        assert_eq!(terms.len(), 3);

        let used = used(3, &[1, 2]);
        let from_terms: EnergyValue = terms
            .iter()
            .filter(|term| term.is_used(&used))
            .map(|term| term.cost)
            .sum();
        assert_eq!(from_terms, label_cost.energy(&used));
    }

    #[test]
    fn invalid_inputs() {
        let mut label_cost = LabelCost::new(2);
        assert!(label_cost.set_uniform(-1).is_err());
        assert!(label_cost.set_per_label(&[1]).is_err());
        assert!(label_cost.add_subset(&[0, 2], 1).is_err());
        assert!(label_cost.add_subset(&[], 1).is_err());
        assert!(label_cost.is_zero());
    }
}
