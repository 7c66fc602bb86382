use log::trace;

use crate::{
    error::Result,
    maxflow::flow_network::FlowNetwork,
    EnergyValue, SiteId,
};

// Marks sites that are not variables of a move
pub(crate) const FIXED: usize = usize::MAX;

// Binary problem of a move; variable i < sites.len() decides the label of sites[i],
// variables past that are auxiliary
#[derive(Debug, Clone)]
pub struct MoveProblem {
    pub problem: BinaryProblem,
    pub sites: Vec<SiteId>,
}

/// Energy over binary variables, reducible to a single minimum cut.
///
/// A variable on the source side of the cut takes value 0, on the sink side value 1.
/// Pairwise terms violating `E00 + E11 <= E01 + E10` are truncated by lowering `E00`.
#[derive(Debug, Clone)]
pub struct BinaryProblem {
    unary: Vec<EnergyValue>, // cost of x = 1 minus cost of x = 0
    pairwise: Vec<(usize, usize, EnergyValue)>, // capacity of i -> j, paid when x_i = 0 and x_j = 1
    constant: EnergyValue,
    truncated: usize,
}

impl BinaryProblem {
    pub fn new(num_variables: usize) -> Self {
        BinaryProblem {
            unary: vec![0; num_variables],
            pairwise: Vec::new(),
            constant: 0,
            truncated: 0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.unary.len()
    }

    // Number of pairwise terms that had to be truncated
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn add_variable(&mut self) -> usize {
        self.unary.push(0);
        self.unary.len() - 1
    }

    // Adds cost e0 for x = 0 and e1 for x = 1
    #[inline]
    pub fn add_unary(&mut self, var: usize, e0: EnergyValue, e1: EnergyValue) {
        self.constant += e0;
        self.unary[var] += e1 - e0;
    }

    // Adds the term E(x_i, x_j) given by its table (e00, e01, e10, e11)
    pub fn add_pairwise(
        &mut self,
        i: usize,
        j: usize,
        e00: EnergyValue,
        e01: EnergyValue,
        e10: EnergyValue,
        e11: EnergyValue,
    ) {
        let mut e00 = e00;
        if e00 + e11 > e01 + e10 {
            trace!(
                "Truncating non-submodular term ({}, {}): {} {} {} {}",
                i,
                j,
                e00,
                e01,
                e10,
                e11
            );
            e00 = e01 + e10 - e11;
            self.truncated += 1;
        }

        // E = e00 + (e10 - e00) x_i + (e11 - e10) x_j + (e01 + e10 - e00 - e11) (1 - x_i) x_j
        self.constant += e00;
        self.unary[i] += e10 - e00;
        self.unary[j] += e11 - e10;
        let capacity = e01 + e10 - e00 - e11;
        if capacity > 0 {
            self.pairwise.push((i, j, capacity));
        }
    }

    // Adds `cost` charged once if any of `vars` takes `value`
    pub fn add_any_term(&mut self, vars: &[usize], value: bool, cost: EnergyValue) {
        match vars {
            [] => {}
            [var] => {
                if value {
                    self.add_unary(*var, 0, cost);
                } else {
                    self.add_unary(*var, cost, 0);
                }
            }
            _ => {
                // The auxiliary variable pays `cost` on the `value` side and every variable
                // taking `value` while the auxiliary does not is penalized by `cost`
                let aux = self.add_variable();
                if value {
                    self.add_unary(aux, 0, cost);
                    for &var in vars {
                        self.add_pairwise(var, aux, 0, 0, cost, 0);
                    }
                } else {
                    self.add_unary(aux, cost, 0);
                    for &var in vars {
                        self.add_pairwise(var, aux, 0, cost, 0, 0);
                    }
                }
            }
        }
    }

    // Evaluates the energy for an explicit assignment of all variables
    pub fn evaluate<F>(&self, value: F) -> EnergyValue
    where
        F: Fn(usize) -> bool,
    {
        let unary: EnergyValue = (0..self.num_variables())
            .filter(|&var| value(var))
            .map(|var| self.unary[var])
            .sum();
        let pairwise: EnergyValue = self
            .pairwise
            .iter()
            .filter(|&&(i, j, _)| !value(i) && value(j))
            .map(|&(_, _, capacity)| capacity)
            .sum();
        self.constant + unary + pairwise
    }

    // Energy of the assignment induced by a cut of the network from `to_network`
    pub fn energy_of_cut(&self, cut_value: EnergyValue) -> EnergyValue {
        let offset: EnergyValue = self.unary.iter().filter(|&&u| u < 0).sum();
        self.constant + offset + cut_value
    }

    pub fn to_network(&self) -> Result<FlowNetwork> {
        let mut network = FlowNetwork::with_capacity(self.num_variables(), self.pairwise.len());
        for (var, &unary) in self.unary.iter().enumerate() {
            if unary > 0 {
                network.add_terminal_edges(var, unary, 0)?;
            } else {
                network.add_terminal_edges(var, 0, -unary)?;
            }
        }
        for &(i, j, capacity) in &self.pairwise {
            network.add_edge(i, j, capacity)?;
        }
        Ok(network)
    }
}
