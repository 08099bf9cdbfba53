//! # pseudosection
//!
//! This is a library for assembling the topology of calculated phase diagrams
//! (pseudosections) from the invariant points and univariant lines produced by an
//! external thermodynamic solver.
//!
//! # Features
//!
//! - Identity resolution of calculated features against a registry, with
//!   polymorph-aware zero-mode matching
//! - Trimming of univariant line samples to their bounding invariant points
//! - Extraction of stability fields as polygons, keyed by phase assemblage,
//!   with an advisory log of invalid and self-intersecting areas
//! - PT, TX and PX sections with aspect-ratio aware geometry
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use pseudosection::prelude::*;
//! use geo::coord;
//!
//! let mut section = Section::new(SectionKind::Pt)
//!     .with_ranges((400.0, 700.0), (2.0, 10.0))
//!     .unwrap();
//!
//! // A reaction line crossing the whole window: garnet disappears to the left.
//! let line = UnivariantLineBuilder::default()
//!     .phases(assemblage!["g", "bi", "q", "mu"])
//!     .out(assemblage!["g"])
//!     .samples(vec![coord! { x: 550.0, y: 0.0 }, coord! { x: 560.0, y: 12.0 }])
//!     .build()
//!     .unwrap();
//! let id = section.register_univariant_line(line).unwrap();
//! assert!(id.is_new());
//!
//! let fields = section.extract_fields();
//! assert!(fields.is_clean());
//! assert_eq!(fields.len(), 2);
//! assert!(fields.get(&assemblage!["bi", "q", "mu"]).is_some());
//! ```
//!
//! Registering the same calculation again resolves to the stored identifier:
//!
//! ```rust
//! use pseudosection::prelude::*;
//!
//! let mut section = Section::new(SectionKind::Pt);
//! let ip = InvariantPointBuilder::default()
//!     .phases(assemblage!["g", "bi", "q", "mu", "sill"])
//!     .out(assemblage!["g", "sill"])
//!     .at(620.0, 6.5)
//!     .build()
//!     .unwrap();
//! let first = section.register_invariant_point(ip.clone()).unwrap();
//! let again = section.register_invariant_point(ip).unwrap();
//! assert_eq!(first.id(), again.id());
//! assert!(!again.is_new());
//! ```

#![forbid(unsafe_code)]

/// Feature model, identity resolution and trimming.
///
/// Invariant points and univariant lines live in a [`Section`](core::section::Section)
/// together with the diagram window and the excess phases.
pub mod core {
    /// Fast hash collections and the spatial grid used for node snapping
    pub mod collections;
    pub mod feature;
    pub mod identity;
    pub mod invariant_point;
    pub mod phase;
    pub mod polymorph;
    pub mod section;
    pub mod trim;
    pub mod univariant_line;

    pub use feature::*;
    pub use identity::*;
    pub use invariant_point::*;
    pub use phase::*;
    pub use section::*;
    pub use univariant_line::*;
}

/// Planar geometry on aspect-scaled coordinates.
///
/// Polylines, rectangle clipping, domain boundary subdivision and the noded
/// planar arrangement whose faces become fields.
pub mod geometry {
    pub mod arrangement;
    pub mod boundary;
    pub mod clip;
    pub mod polyline;
}

/// Stability field extraction and its diagnostics.
pub mod topology {
    pub mod diagnostics;
    /// Face labelling, complement resolution and self-intersection merging
    pub mod fields;
    pub mod validation;

    pub use diagnostics::*;
    pub use fields::*;
}

/// A prelude module that re-exports commonly used types and macros.
pub mod prelude {
    pub use crate::core::{
        feature::{CalcResult, Feature, FeatureError, FeatureId},
        identity::{Identity, Resolved},
        invariant_point::{InvariantPoint, InvariantPointBuilder},
        phase::{Assemblage, Phase},
        polymorph::{POLYMORPHS, PolymorphPair},
        section::{Section, SectionError, SectionKind},
        trim::Bounds,
        univariant_line::{UnivariantLine, UnivariantLineBuilder, UsedRange},
    };

    pub use crate::core::collections::{FastHashMap, SmallBuffer, fast_hash_map_with_capacity};

    pub use crate::topology::{
        diagnostics::Diagnostic,
        fields::{ExtractionOptions, Field, FieldSet},
    };

    // Convenience macros
    pub use crate::assemblage;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{invariant_point::InvariantPoint, section::Section, univariant_line::UnivariantLine},
        is_normal,
        topology::fields::FieldSet,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<InvariantPoint>());
        assert!(is_normal::<UnivariantLine>());
        assert!(is_normal::<Section>());
        assert!(is_normal::<FieldSet>());
    }

    #[test]
    fn prelude_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<FeatureId, usize> = fast_hash_map_with_capacity(4);
        map.insert(FeatureId::FIRST, 1);
        assert_eq!(map.get(&FeatureId::FIRST), Some(&1));

        let sources: SmallBuffer<Assemblage, 2> = std::iter::once(assemblage!["q"]).collect();
        assert!(sources.contains(&assemblage!["q"]));

        let options = ExtractionOptions::default();
        assert!(options.merge_buffer > 0.0);
        assert_eq!(POLYMORPHS.len(), 5);
    }
}
