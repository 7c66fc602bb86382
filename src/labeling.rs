use std::{
    fmt::Display,
    ops::{Index, IndexMut},
};

use bitvec::{bitvec, vec::BitVec};

use crate::{
    error::{check_label, check_site, GcoError, Result},
    LabelId, SiteId,
};

// Total assignment of a label to every site
#[derive(Clone, PartialEq, Eq)]
pub struct Labeling {
    labels: Vec<LabelId>, // indexed by sites
    num_labels: usize,
}

impl Labeling {
    // Creates a labeling with every site assigned label 0
    pub fn new(num_sites: usize, num_labels: usize) -> Self {
        Labeling {
            labels: vec![0; num_sites],
            num_labels,
        }
    }

    // Creates a labeling from explicit labels, checking that each is in range
    pub fn from_labels(labels: Vec<LabelId>, num_labels: usize) -> Result<Self> {
        for &label in &labels {
            check_label(label, num_labels)?;
        }
        Ok(Labeling { labels, num_labels })
    }

    pub fn num_sites(&self) -> usize {
        self.labels.len()
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn label(&self, site: SiteId) -> Result<LabelId> {
        check_site(site, self.num_sites())?;
        Ok(self.labels[site])
    }

    // Overrides the label of a site without any energy bookkeeping
    pub fn set_label(&mut self, site: SiteId, label: LabelId) -> Result<()> {
        check_site(site, self.num_sites())?;
        check_label(label, self.num_labels)?;
        self.labels[site] = label;
        Ok(())
    }

    pub fn as_slice(&self) -> &[LabelId] {
        &self.labels
    }

    // Copies the labels of sites start..start+out.len() into `out`
    pub fn labels_into(&self, start: SiteId, out: &mut [LabelId]) -> Result<()> {
        let end = self.checked_range_end(start, out.len())?;
        out.copy_from_slice(&self.labels[start..end]);
        Ok(())
    }

    // Overrides the labels of sites start..start+labels.len(); nothing changes on error
    pub fn set_labels(&mut self, start: SiteId, labels: &[LabelId]) -> Result<()> {
        let end = self.checked_range_end(start, labels.len())?;
        for &label in labels {
            check_label(label, self.num_labels)?;
        }
        self.labels[start..end].copy_from_slice(labels);
        Ok(())
    }

    fn checked_range_end(&self, start: SiteId, len: usize) -> Result<usize> {
        let end = start
            .checked_add(len)
            .ok_or_else(|| GcoError::site_range(usize::MAX, self.num_sites()))?;
        if end > self.num_sites() {
            return Err(GcoError::site_range(end - 1, self.num_sites()));
        }
        Ok(end)
    }

    // Marks every label that is assigned to at least one site
    pub fn used_labels(&self) -> BitVec {
        let mut used = bitvec![0; self.num_labels];
        for &label in &self.labels {
            used.set(label, true);
        }
        used
    }
}

impl Index<SiteId> for Labeling {
    type Output = LabelId;

    fn index(&self, index: SiteId) -> &Self::Output {
        &self.labels[index]
    }
}

impl IndexMut<SiteId> for Labeling {
    fn index_mut(&mut self, index: SiteId) -> &mut Self::Output {
        &mut self.labels[index]
    }
}

impl std::fmt::Debug for Labeling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.labels)
    }
}

impl Display for Labeling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels = self
            .labels
            .iter()
            .map(|label| label.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", labels.join(" "))
    }
}
