use std::fmt::Debug;

use ndarray::{Array2, ArrayView2};

use crate::{
    error::{check_label, check_len, check_site, check_term, check_terms, GcoError, Result},
    EnergyValue, LabelId, SiteId,
};

pub type DataCostFn = Box<dyn Fn(SiteId, LabelId) -> EnergyValue>;

enum DataCostKind {
    Table(Array2<EnergyValue>), // rows indexed by sites, columns by labels
    Function(DataCostFn),
}

// Stores the per-site, per-label cost of an assignment
pub struct DataCost {
    num_sites: usize,
    num_labels: usize,
    kind: DataCostKind,
}

impl DataCost {
    // Creates a zero table; unset entries stay at zero cost
    pub fn zeros(num_sites: usize, num_labels: usize) -> Self {
        DataCost {
            num_sites,
            num_labels,
            kind: DataCostKind::Table(Array2::zeros((num_sites, num_labels))),
        }
    }

    // Returns the cost of assigning `label` to `site`
    #[inline]
    pub fn cost(&self, site: SiteId, label: LabelId) -> EnergyValue {
        match &self.kind {
            DataCostKind::Table(table) => table[[site, label]],
            DataCostKind::Function(function) => function(site, label),
        }
    }

    // Overwrites a single entry of the table.
    // A functional data cost is first replaced by a zero table.
    pub fn set(&mut self, site: SiteId, label: LabelId, value: EnergyValue) -> Result<()> {
        check_site(site, self.num_sites)?;
        check_label(label, self.num_labels)?;
        check_term("data cost", value)?;
        if let DataCostKind::Function(_) = self.kind {
            self.kind = DataCostKind::Table(Array2::zeros((self.num_sites, self.num_labels)));
        }
        if let DataCostKind::Table(table) = &mut self.kind {
            table[[site, label]] = value;
        }
        Ok(())
    }

    // Replaces the whole table with row-major `values` of size num_sites * num_labels
    pub fn set_all(&mut self, values: &[EnergyValue]) -> Result<()> {
        check_len(
            "data cost array",
            self.num_sites * self.num_labels,
            values.len(),
        )?;
        check_terms("data cost", values)?;
        let table = Array2::from_shape_vec((self.num_sites, self.num_labels), values.to_vec())
            .map_err(|err| GcoError::Configuration(err.to_string()))?;
        self.kind = DataCostKind::Table(table);
        Ok(())
    }

    // Replaces the whole table with a 2-dimensional view of shape (num_sites, num_labels)
    pub fn set_view(&mut self, values: ArrayView2<EnergyValue>) -> Result<()> {
        let shape = (self.num_sites, self.num_labels);
        if values.dim() != shape {
            return Err(GcoError::Configuration(format!(
                "data cost array has shape {:?}, expected {:?}",
                values.dim(),
                shape
            )));
        }
        for &value in values.iter() {
            check_term("data cost", value)?;
        }
        self.kind = DataCostKind::Table(values.to_owned());
        Ok(())
    }

    // Replaces the table by a function evaluated on every lookup
    pub fn set_function(&mut self, function: DataCostFn) {
        self.kind = DataCostKind::Function(function);
    }
}

impl Debug for DataCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DataCostKind::Table(table) => write!(f, "DataCost::Table({:?})", table.dim()),
            DataCostKind::Function(_) => write!(f, "DataCost::Function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn set_and_lookup() {
        let mut data_cost = DataCost::zeros(3, 2);
        data_cost.set(1, 1, 7).unwrap();
        assert_eq!(data_cost.cost(1, 1), 7);
        assert_eq!(data_cost.cost(0, 0), 0);
        assert_eq!(data_cost.set(3, 0, 1), Err(GcoError::site_range(3, 3)));
        assert_eq!(data_cost.set(0, 2, 1), Err(GcoError::label_range(2, 2)));
    }

    #[test]
    fn bulk_is_all_or_nothing() {
        let mut data_cost = DataCost::zeros(2, 2);
        data_cost.set(0, 0, 5).unwrap();
        assert!(data_cost.set_all(&[1, 2, 3]).is_err());
        assert_eq!(data_cost.cost(0, 0), 5);

        data_cost.set_all(&[1, 2, 3, 4]).unwrap();
        assert_eq!(data_cost.cost(1, 0), 3);

        assert!(data_cost.set_view(array![[1, 2, 3]].view()).is_err());
        data_cost.set_view(array![[9, 8], [7, 6]].view()).unwrap();
        assert_eq!(data_cost.cost(1, 1), 6);
    }

    #[test]
    fn function_then_entry() {
        let mut data_cost = DataCost::zeros(2, 3);
        data_cost.set_function(Box::new(|site, label| (site * 10 + label) as EnergyValue));
        assert_eq!(data_cost.cost(1, 2), 12);

        data_cost.set(0, 1, 4).unwrap();
        assert_eq!(data_cost.cost(0, 1), 4);
        assert_eq!(data_cost.cost(1, 2), 0);
    }
}
