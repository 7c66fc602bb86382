use std::collections::BTreeMap;

use log::debug;

use crate::{
    data_structures::jagged_arrays::JaggedArray2,
    error::{check_len, check_site, check_term, GcoError, Result},
    EnergyValue, SiteId,
};

// Explicit sparse neighborhood. Every undirected edge is stored in the
// adjacency maps of both endpoints; repeated declarations add up.
#[derive(Debug, Clone)]
pub struct GeneralTopology {
    adjacency: Vec<BTreeMap<SiteId, EnergyValue>>,
    num_edges: usize,
}

impl GeneralTopology {
    pub fn new(num_sites: usize) -> Self {
        GeneralTopology {
            adjacency: vec![BTreeMap::new(); num_sites],
            num_edges: 0,
        }
    }

    pub fn num_sites(&self) -> usize {
        self.adjacency.len()
    }

    // Number of distinct undirected edges
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn degree(&self, site: SiteId) -> usize {
        self.adjacency[site].len()
    }

    // Returns the accumulated weight of the edge between two sites, if declared
    pub fn weight(&self, site_a: SiteId, site_b: SiteId) -> Option<EnergyValue> {
        self.adjacency
            .get(site_a)
            .and_then(|neighbors| neighbors.get(&site_b))
            .copied()
    }

    fn validate_edge(&self, site_a: SiteId, site_b: SiteId, weight: EnergyValue) -> Result<()> {
        check_site(site_a, self.num_sites())?;
        check_site(site_b, self.num_sites())?;
        if site_a == site_b {
            return Err(GcoError::Topology {
                site_a,
                site_b,
                reason: "self-loop".to_string(),
            });
        }
        if weight < 0 {
            return Err(GcoError::negative_weight(site_a, site_b, weight));
        }
        check_term("edge weight", weight)
    }

    // Adds an already validated edge
    fn insert_edge(&mut self, site_a: SiteId, site_b: SiteId, weight: EnergyValue) {
        if !self.adjacency[site_a].contains_key(&site_b) {
            self.num_edges += 1;
        }
        *self.adjacency[site_a].entry(site_b).or_insert(0) += weight;
        *self.adjacency[site_b].entry(site_a).or_insert(0) += weight;
    }

    // Declares the undirected edge (site_a, site_b); weights of repeated declarations accumulate
    pub fn add_edge(&mut self, site_a: SiteId, site_b: SiteId, weight: EnergyValue) -> Result<()> {
        self.validate_edge(site_a, site_b, weight)?;
        self.insert_edge(site_a, site_b, weight);
        Ok(())
    }

    // Declares a batch of edges, equivalent to calling `add_edge` for each triple in order.
    // The whole batch is validated before any edge is added.
    pub fn add_edges(
        &mut self,
        sites_a: &[SiteId],
        sites_b: &[SiteId],
        weights: &[EnergyValue],
    ) -> Result<()> {
        check_len("second site array", sites_a.len(), sites_b.len())?;
        check_len("weight array", sites_a.len(), weights.len())?;
        for i in 0..sites_a.len() {
            self.validate_edge(sites_a[i], sites_b[i], weights[i])?;
        }
        for i in 0..sites_a.len() {
            self.insert_edge(sites_a[i], sites_b[i], weights[i]);
        }
        debug!("Added {} edges, {} distinct", sites_a.len(), self.num_edges);
        Ok(())
    }

    // Ingests pre-built per-site neighbor lists. Entry (n, w) in row s is one `add_edge(s, n, w)` call.
    pub fn add_jagged(&mut self, neighbors: &JaggedArray2<(SiteId, EnergyValue)>) -> Result<()> {
        check_len("neighbor count array", self.num_sites(), neighbors.len())?;
        for (site, row) in neighbors.rows().enumerate() {
            for &(neighbor, weight) in row {
                self.validate_edge(site, neighbor, weight)?;
            }
        }
        for (site, row) in neighbors.rows().enumerate() {
            for &(neighbor, weight) in row {
                self.insert_edge(site, neighbor, weight);
            }
        }
        debug!(
            "Ingested {} neighbor entries, {} distinct edges",
            neighbors.total_len(),
            self.num_edges
        );
        Ok(())
    }

    #[inline]
    pub fn for_each_neighbor<F>(&self, site: SiteId, mut visit: F)
    where
        F: FnMut(SiteId, EnergyValue),
    {
        for (&neighbor, &weight) in &self.adjacency[site] {
            visit(neighbor, weight);
        }
    }

    // Calls `visit(site_a, site_b, weight)` once per edge, with site_a < site_b
    pub fn for_each_edge<F>(&self, mut visit: F)
    where
        F: FnMut(SiteId, SiteId, EnergyValue),
    {
        for (site, neighbors) in self.adjacency.iter().enumerate() {
            for (&neighbor, &weight) in neighbors.range(site + 1..) {
                visit(site, neighbor, weight);
            }
        }
    }
}
