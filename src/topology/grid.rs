use crate::{
    error::{check_len, check_term, GcoError, Result},
    EnergyValue, SiteId,
};

/// Implicit 4-connected grid of `width * height` sites in row-major order.
/// Site `s` sits at row `s / width` and column `s % width`.
///
/// Edge weights default to 1. After [`GridTopology::set_weights_vh`],
/// `vertical[s]` weights the edge between `s` and `s + width` and
/// `horizontal[s]` weights the edge between `s` and `s + 1`.
#[derive(Debug, Clone)]
pub struct GridTopology {
    width: usize,
    height: usize,
    vertical: Option<Vec<EnergyValue>>,
    horizontal: Option<Vec<EnergyValue>>,
}

impl GridTopology {
    pub fn new(width: usize, height: usize) -> Self {
        GridTopology {
            width,
            height,
            vertical: None,
            horizontal: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_sites(&self) -> usize {
        self.width * self.height
    }

    pub fn num_edges(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        (self.width - 1) * self.height + self.width * (self.height - 1)
    }

    // Returns (row, col) of a site
    pub fn row_col(&self, site: SiteId) -> (usize, usize) {
        (site / self.width, site % self.width)
    }

    // Installs per-site vertical and horizontal edge weights
    pub fn set_weights_vh(
        &mut self,
        vertical: &[EnergyValue],
        horizontal: &[EnergyValue],
    ) -> Result<()> {
        check_len("vertical weight array", self.num_sites(), vertical.len())?;
        check_len("horizontal weight array", self.num_sites(), horizontal.len())?;
        for site in 0..self.num_sites() {
            let (row, col) = self.row_col(site);
            if row + 1 < self.height && vertical[site] < 0 {
                return Err(GcoError::negative_weight(
                    site,
                    site + self.width,
                    vertical[site],
                ));
            }
            if col + 1 < self.width && horizontal[site] < 0 {
                return Err(GcoError::negative_weight(site, site + 1, horizontal[site]));
            }
            if row + 1 < self.height {
                check_term("vertical weight", vertical[site])?;
            }
            if col + 1 < self.width {
                check_term("horizontal weight", horizontal[site])?;
            }
        }
        self.vertical = Some(vertical.to_vec());
        self.horizontal = Some(horizontal.to_vec());
        Ok(())
    }

    // Weight of the edge (site, site + 1)
    #[inline]
    fn horizontal_weight(&self, site: SiteId) -> EnergyValue {
        self.horizontal.as_ref().map_or(1, |weights| weights[site])
    }

    // Weight of the edge (site, site + width)
    #[inline]
    fn vertical_weight(&self, site: SiteId) -> EnergyValue {
        self.vertical.as_ref().map_or(1, |weights| weights[site])
    }

    // Calls `visit(neighbor, weight)` for the up to four neighbors of a site
    #[inline]
    pub fn for_each_neighbor<F>(&self, site: SiteId, mut visit: F)
    where
        F: FnMut(SiteId, EnergyValue),
    {
        let (row, col) = self.row_col(site);
        if row > 0 {
            visit(site - self.width, self.vertical_weight(site - self.width));
        }
        if col > 0 {
            visit(site - 1, self.horizontal_weight(site - 1));
        }
        if col + 1 < self.width {
            visit(site + 1, self.horizontal_weight(site));
        }
        if row + 1 < self.height {
            visit(site + self.width, self.vertical_weight(site));
        }
    }

    // Calls `visit(site_a, site_b, weight)` once per edge, with site_a < site_b
    pub fn for_each_edge<F>(&self, mut visit: F)
    where
        F: FnMut(SiteId, SiteId, EnergyValue),
    {
        for site in 0..self.num_sites() {
            let (row, col) = self.row_col(site);
            if col + 1 < self.width {
                visit(site, site + 1, self.horizontal_weight(site));
            }
            if row + 1 < self.height {
                visit(site, site + self.width, self.vertical_weight(site));
            }
        }
    }
}
