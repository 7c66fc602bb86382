use std::fmt::Debug;

use ndarray::Array2;

use crate::{
    error::{check_label, check_len, check_term, check_terms, GcoError, Result},
    EnergyValue, LabelId, SiteId,
};

pub type SmoothCostFn = Box<dyn Fn(SiteId, SiteId, LabelId, LabelId) -> EnergyValue>;

enum SmoothCostKind {
    Table(Array2<EnergyValue>), // indexed by (label_a, label_b)
    Function(SmoothCostFn),
}

// Stores the pairwise cost of neighboring sites holding a pair of labels.
// Symmetry is expected but not enforced.
pub struct SmoothCost {
    num_labels: usize,
    kind: SmoothCostKind,
}

impl SmoothCost {
    pub fn zeros(num_labels: usize) -> Self {
        SmoothCost {
            num_labels,
            kind: SmoothCostKind::Table(Array2::zeros((num_labels, num_labels))),
        }
    }

    // Returns the unweighted cost of the edge (site_a, site_b) labeled (label_a, label_b)
    #[inline]
    pub fn cost(
        &self,
        site_a: SiteId,
        site_b: SiteId,
        label_a: LabelId,
        label_b: LabelId,
    ) -> EnergyValue {
        match &self.kind {
            SmoothCostKind::Table(table) => table[[label_a, label_b]],
            SmoothCostKind::Function(function) => function(site_a, site_b, label_a, label_b),
        }
    }

    // Overwrites a single entry; a functional smooth cost is first replaced by a zero table
    pub fn set(&mut self, label_a: LabelId, label_b: LabelId, value: EnergyValue) -> Result<()> {
        check_label(label_a, self.num_labels)?;
        check_label(label_b, self.num_labels)?;
        check_term("smooth cost", value)?;
        if let SmoothCostKind::Function(_) = self.kind {
            self.kind = SmoothCostKind::Table(Array2::zeros((self.num_labels, self.num_labels)));
        }
        if let SmoothCostKind::Table(table) = &mut self.kind {
            table[[label_a, label_b]] = value;
        }
        Ok(())
    }

    // Replaces the whole table with row-major `values` of size num_labels^2
    pub fn set_all(&mut self, values: &[EnergyValue]) -> Result<()> {
        check_len(
            "smooth cost array",
            self.num_labels * self.num_labels,
            values.len(),
        )?;
        check_terms("smooth cost", values)?;
        let table = Array2::from_shape_vec((self.num_labels, self.num_labels), values.to_vec())
            .map_err(|err| GcoError::Configuration(err.to_string()))?;
        self.kind = SmoothCostKind::Table(table);
        Ok(())
    }

    pub fn set_function(&mut self, function: SmoothCostFn) {
        self.kind = SmoothCostKind::Function(function);
    }

    // Checks V(a,b) = V(b,a) >= 0 and V(a,a) = 0 on the tabulated form.
    // Returns None for functional costs, which cannot be inspected.
    pub fn is_semi_metric(&self) -> Option<bool> {
        let SmoothCostKind::Table(table) = &self.kind else {
            return None;
        };
        let n = self.num_labels;
        Some((0..n).all(|a| {
            table[[a, a]] == 0
                && (0..n).all(|b| table[[a, b]] >= 0 && table[[a, b]] == table[[b, a]])
        }))
    }

    // Semi-metric that additionally satisfies V(a,b) <= V(a,c) + V(c,b)
    pub fn is_metric(&self) -> Option<bool> {
        let SmoothCostKind::Table(table) = &self.kind else {
            return None;
        };
        let n = self.num_labels;
        let triangle = (0..n).all(|a| {
            (0..n).all(|b| (0..n).all(|c| table[[a, b]] <= table[[a, c]] + table[[c, b]]))
        });
        self.is_semi_metric().map(|semi_metric| semi_metric && triangle)
    }
}

impl Debug for SmoothCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            SmoothCostKind::Table(table) => write!(f, "SmoothCost::Table({:?})", table),
            SmoothCostKind::Function(_) => write!(f, "SmoothCost::Function"),
        }
    }
}
