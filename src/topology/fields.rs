//! Phase field extraction.
//!
//! Every univariant line is clipped to the domain, the domain edges are split
//! where the lines meet them, and the bounded faces of the resulting planar
//! arrangement are labelled with the assemblage stable inside them. Faces that
//! disagree with a bounding line are dropped, and faces mapping to an assemblage
//! that is already taken are either reinterpreted as the complementary field
//! across a single line or merged as a self-intersection.
//!
//! All geometry is computed with y scaled by [`Section::ratio`]; the resulting
//! polygons are returned in section coordinates.
//!
//! Set `PSEUDOSECTION_DEBUG_FIELDS` to trace every extracted face.

use crate::core::feature::{Feature, FeatureId};
use crate::core::phase::Assemblage;
use crate::core::section::Section;
use crate::geometry::arrangement::{Arrangement, EdgeSource, Face, Segment};
use crate::geometry::boundary::{rectangle_edges, snap_to_rect, split_edge};
use crate::geometry::clip::clip_polyline;
use crate::geometry::polyline::{distance, scale_y};
use crate::topology::diagnostics::Diagnostic;
use crate::topology::validation::{face_assemblage, offending_lines};
use geo::{
    Area, BooleanOps, Buffer, Coord, Line, LineString, MapCoords, MultiPolygon, Rect, Simplify,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// OPTIONS
// =============================================================================

/// Tuning knobs of field extraction.
///
/// # Examples
///
/// ```rust
/// use pseudosection::topology::fields::ExtractionOptions;
///
/// let strict = ExtractionOptions {
///     min_face_area: 1e-6,
///     ..ExtractionOptions::default()
/// };
/// assert_eq!(strict.merge_buffer, 1e-5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Buffer distance applied after merging two faces of one assemblage, in
    /// scaled units. Heals slivers left along their shared edges.
    pub merge_buffer: f64,
    /// Nodes closer than this fraction of the domain diagonal are merged.
    /// Values below machine epsilon are raised to it.
    pub snap_tolerance: f64,
    /// Faces with a smaller area, in scaled units, are discarded.
    pub min_face_area: f64,
    /// Douglas-Peucker tolerance applied to every scaled trimmed line before
    /// clipping, in scaled units. `None` uses the trimmed coordinates as is.
    pub simplify_tolerance: Option<f64>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            merge_buffer: 1e-5,
            snap_tolerance: 1e-9,
            min_face_area: 0.0,
            simplify_tolerance: None,
        }
    }
}

// =============================================================================
// FIELDS
// =============================================================================

/// A region of the diagram with one stable assemblage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    polygon: MultiPolygon<f64>,
    lines: BTreeSet<FeatureId>,
}

impl Field {
    /// Field outline in section coordinates; more than one polygon only for
    /// merged self-intersecting fields.
    #[must_use]
    pub const fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    /// Univariant lines bounding the field.
    #[must_use]
    pub const fn lines(&self) -> &BTreeSet<FeatureId> {
        &self.lines
    }
}

/// Labelled fields of a section plus the extraction log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(with = "field_entries")]
    fields: BTreeMap<Assemblage, Field>,
    diagnostics: Vec<Diagnostic>,
}

impl FieldSet {
    /// Field of `assemblage`.
    #[must_use]
    pub fn get(&self, assemblage: &Assemblage) -> Option<&Field> {
        self.fields.get(assemblage)
    }

    /// Fields in assemblage order.
    pub fn iter(&self) -> impl Iterator<Item = (&Assemblage, &Field)> + '_ {
        self.fields.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// No field was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Supporting univariant lines of every field.
    #[must_use]
    pub fn supporting_lines(&self) -> BTreeMap<Assemblage, Vec<FeatureId>> {
        self.fields
            .iter()
            .map(|(key, field)| (key.clone(), field.lines.iter().copied().collect()))
            .collect()
    }

    /// Extraction log, in the order problems were found.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// No diagnostic was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn log(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Stores `field` under `key`, merging with an occupant.
    fn store(&mut self, key: Assemblage, field: Field, merge_buffer: f64) {
        let Some(stored) = self.fields.remove(&key) else {
            self.fields.insert(key, field);
            return;
        };
        let diagnostic = Diagnostic::SelfIntersecting {
            assemblage: key.clone(),
            lines: field.lines.iter().copied().collect(),
            with: stored.lines.iter().copied().collect(),
        };
        let polygon = stored.polygon.union(&field.polygon).buffer(merge_buffer);
        let lines = stored.lines.union(&field.lines).copied().collect();
        self.fields.insert(key, Field { polygon, lines });
        self.log(diagnostic);
    }
}

/// Fields as a list of `(assemblage, field)` pairs; assemblages are not valid
/// map keys in every format.
mod field_entries {
    use super::{Assemblage, BTreeMap, Field};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        fields: &BTreeMap<Assemblage, Field>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(fields)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Assemblage, Field>, D::Error> {
        Ok(Vec::<(Assemblage, Field)>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = (&'a Assemblage, &'a Field);
    type IntoIter = std::collections::btree_map::Iter<'a, Assemblage, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

fn debug_fields() -> bool {
    std::env::var_os("PSEUDOSECTION_DEBUG_FIELDS").is_some()
}

impl Section {
    /// Domain rectangle with y scaled by the aspect ratio.
    #[must_use]
    pub fn scaled_domain(&self) -> Rect<f64> {
        let ratio = self.ratio();
        let ((x0, x1), (y0, y1)) = (self.xrange(), self.yrange());
        Rect::new(
            Coord { x: x0, y: y0 * ratio },
            Coord { x: x1, y: y1 * ratio },
        )
    }

    /// Extracts the phase fields with default options.
    #[must_use]
    pub fn extract_fields(&self) -> FieldSet {
        self.extract_fields_with(&ExtractionOptions::default())
    }

    /// Extracts the phase fields.
    ///
    /// Never fails: problems are recorded in [`FieldSet::diagnostics`] and the
    /// affected faces are dropped or merged.
    #[must_use]
    pub fn extract_fields_with(&self, options: &ExtractionOptions) -> FieldSet {
        let ratio = self.ratio();
        let domain = self.scaled_domain();
        let diagonal = distance(domain.min(), domain.max());
        let tol = options.snap_tolerance.max(f64::EPSILON) * diagonal;

        let mut segments: Vec<Segment> = Vec::new();
        for (id, line) in self.univariant_lines() {
            let mut shape = scale_y(line.trimmed(), ratio);
            if let Some(epsilon) = options.simplify_tolerance {
                shape = LineString::new(shape).simplify(epsilon).0;
            }
            for piece in clip_polyline(&shape, &domain) {
                let piece: Vec<Coord<f64>> =
                    piece.into_iter().map(|c| snap_to_rect(c, &domain, tol)).collect();
                segments.extend(piece.windows(2).map(|w| Segment {
                    line: Line::new(w[0], w[1]),
                    source: EdgeSource::Line(id),
                }));
            }
        }

        let crossing: Vec<Line<f64>> = segments.iter().map(|s| s.line).collect();
        let mut leaves = Vec::new();
        for edge in rectangle_edges(&domain) {
            split_edge(edge, &crossing, tol, &mut leaves);
        }
        let boundary_edges = leaves.len();
        segments.extend(leaves.into_iter().map(|line| Segment {
            line,
            source: EdgeSource::Boundary,
        }));

        let mut arrangement = Arrangement::build(&segments, tol);
        let faces = arrangement.faces(options.min_face_area);
        tracing::debug!(
            "Arrangement of {} line segments and {boundary_edges} boundary edges: {} nodes, {} edges, {} faces",
            segments.len() - boundary_edges,
            arrangement.number_of_nodes(),
            arrangement.number_of_edges(),
            faces.len()
        );

        let mut set = FieldSet::default();
        for face in faces {
            self.place_face(&mut set, face, ratio, options);
        }
        for field in set.fields.values_mut() {
            field.polygon = field.polygon.map_coords(|c| Coord {
                x: c.x,
                y: c.y / ratio,
            });
        }
        set
    }

    fn place_face(&self, set: &mut FieldSet, face: Face, ratio: f64, options: &ExtractionOptions) {
        let Face { polygon, lines } = face;
        let supporting: Vec<_> = lines
            .iter()
            .filter_map(|id| self.univariant_line(*id).map(|line| (*id, line)))
            .collect();
        let Some(key) = face_assemblage(supporting.iter().map(|(_, line)| *line)) else {
            set.log(Diagnostic::Unsupported {
                area: polygon.unsigned_area() / ratio,
            });
            return;
        };
        if debug_fields() {
            tracing::debug!(
                "Face {key} bounded by {:?} with area {}",
                lines,
                polygon.unsigned_area() / ratio
            );
        }

        let offending = offending_lines(&key, supporting.iter().copied());
        if !offending.is_empty() {
            set.log(Diagnostic::InvalidField {
                lines: lines.iter().copied().collect(),
                offending,
            });
            return;
        }

        let field = Field {
            polygon: MultiPolygon::new(vec![polygon]),
            lines,
        };
        let single_out = |field: &Field| -> Option<Assemblage> {
            let mut ids = field.lines.iter();
            match (ids.next(), ids.next()) {
                (Some(id), None) => self
                    .univariant_line(*id)
                    .map(|line| line.out().clone())
                    .filter(|out| out.is_subset(&key)),
                _ => None,
            }
        };

        let Some(stored) = set.fields.get(&key) else {
            set.fields.insert(key, field);
            return;
        };
        if let Some(out) = single_out(&field) {
            // The field across the single line, missing its zero-mode phase.
            let complement = key.difference(&out);
            tracing::debug!("Face of {key} reinterpreted as complement {complement}");
            set.store(complement, field, options.merge_buffer);
        } else if let Some(out) = single_out(stored) {
            let complement = key.difference(&out);
            tracing::debug!("Stored field of {key} moved to complement {complement}");
            if let Some(previous) = set.fields.insert(key, field) {
                set.store(complement, previous, options.merge_buffer);
            }
        } else {
            set.store(key, field, options.merge_buffer);
        }
    }
}
