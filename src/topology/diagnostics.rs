//! Advisory diagnostics produced while extracting fields.
//!
//! None of these abort extraction. They describe degenerate or ambiguous topology
//! that usually needs recalculating or manually editing some features.

use crate::core::feature::{FeatureId, join_ids};
use crate::core::phase::Assemblage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the extraction log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A face whose implied assemblage is inconsistent with a bounding line.
    InvalidField {
        /// All lines bounding the face.
        lines: Vec<FeatureId>,
        /// Lines whose assemblage and zero modes disagree with the face.
        offending: Vec<FeatureId>,
    },
    /// Two faces with the same assemblage were merged.
    SelfIntersecting {
        /// The shared assemblage.
        assemblage: Assemblage,
        /// Lines bounding the face being added.
        lines: Vec<FeatureId>,
        /// Lines bounding the field it was merged into.
        with: Vec<FeatureId>,
    },
    /// A face bounded by the domain only.
    Unsupported {
        /// Face area in section coordinates.
        area: f64,
    },
}

impl Diagnostic {
    /// Every univariant line named by the diagnostic.
    #[must_use]
    pub fn lines(&self) -> Vec<FeatureId> {
        match self {
            Self::InvalidField { lines, .. } => lines.clone(),
            Self::SelfIntersecting { lines, with, .. } => {
                let mut all: Vec<FeatureId> = lines.iter().chain(with).copied().collect();
                all.sort_unstable();
                all.dedup();
                all
            }
            Self::Unsupported { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidField { lines, offending } => write!(
                f,
                "Area defined by unilines {} is not valid field (inconsistent: {}).",
                join_ids(lines),
                join_ids(offending)
            ),
            Self::SelfIntersecting { lines, with, .. } => write!(
                f,
                "Area defined by unilines {} is self-intersecting with {}.",
                join_ids(lines),
                join_ids(with)
            ),
            Self::Unsupported { area } => write!(
                f,
                "Area of {area} is bounded by the domain only and has no univariant line."
            ),
        }
    }
}
