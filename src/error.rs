//! Error types for graph-cut energy minimization

use thiserror::Error;

use crate::{EnergyValue, SiteId, MAX_TERM};

/// Result type for optimizer operations
pub type Result<T> = std::result::Result<T, GcoError>;

/// Errors raised while configuring or running the optimizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcoError {
    /// A supplied array does not match the declared number of sites or labels,
    /// or a call does not apply to the configured topology
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A site or label identifier lies outside its valid range
    #[error("{what} index {index} out of range 0..{bound}")]
    Range {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    /// A neighbor declaration is invalid (self-loop or negative weight)
    #[error("Invalid edge ({site_a}, {site_b}): {reason}")]
    Topology {
        site_a: SiteId,
        site_b: SiteId,
        reason: String,
    },

    /// The min-cut collaborator produced an inconsistent result
    #[error("Min-cut engine error: {0}")]
    Engine(String),
}

impl GcoError {
    pub(crate) fn site_range(index: usize, bound: usize) -> Self {
        GcoError::Range {
            what: "Site",
            index,
            bound,
        }
    }

    pub(crate) fn label_range(index: usize, bound: usize) -> Self {
        GcoError::Range {
            what: "Label",
            index,
            bound,
        }
    }

    pub(crate) fn size_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        GcoError::Configuration(format!(
            "{} has {} entries, expected {}",
            what, actual, expected
        ))
    }

    pub(crate) fn negative_weight(site_a: SiteId, site_b: SiteId, weight: EnergyValue) -> Self {
        GcoError::Topology {
            site_a,
            site_b,
            reason: format!("negative weight {}", weight),
        }
    }
}

/// Fails with a range error unless `site < num_sites`
pub(crate) fn check_site(site: SiteId, num_sites: usize) -> Result<()> {
    if site < num_sites {
        Ok(())
    } else {
        Err(GcoError::site_range(site, num_sites))
    }
}

/// Fails with a range error unless `label < num_labels`
pub(crate) fn check_label(label: usize, num_labels: usize) -> Result<()> {
    if label < num_labels {
        Ok(())
    } else {
        Err(GcoError::label_range(label, num_labels))
    }
}

/// Fails with a configuration error unless `|value| <= MAX_TERM`
pub(crate) fn check_term(what: &str, value: EnergyValue) -> Result<()> {
    if value.unsigned_abs() <= MAX_TERM.unsigned_abs() {
        Ok(())
    } else {
        Err(GcoError::Configuration(format!(
            "{} {} exceeds the magnitude limit {}",
            what, value, MAX_TERM
        )))
    }
}

pub(crate) fn check_terms(what: &str, values: &[EnergyValue]) -> Result<()> {
    values.iter().try_for_each(|&value| check_term(what, value))
}

/// Fails with a configuration error unless a bulk input has exactly `expected` entries
pub(crate) fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GcoError::size_mismatch(what, expected, actual))
    }
}
