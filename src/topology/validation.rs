//! Consistency of a face assemblage with its bounding lines.

use crate::core::feature::{Feature, FeatureId};
use crate::core::phase::Assemblage;
use crate::core::polymorph::is_polymorph_pair;
use crate::core::univariant_line::UnivariantLine;

/// Assemblage implied by the lines bounding a face: the intersection of their
/// assemblages. `None` when there are no lines.
pub fn face_assemblage<'a, I>(lines: I) -> Option<Assemblage>
where
    I: IntoIterator<Item = &'a UnivariantLine>,
{
    Assemblage::intersect_all(lines.into_iter().map(Feature::phases))
}

/// Whether `line` may bound a field with assemblage `field`.
///
/// Crossing the line changes the assemblage by exactly its zero-mode phase, by
/// nothing, or by a polymorph pair once the zero mode is accounted for.
///
/// # Examples
///
/// ```rust
/// use pseudosection::assemblage;
/// use pseudosection::core::univariant_line::UnivariantLineBuilder;
/// use pseudosection::topology::validation::is_consistent;
///
/// let line = UnivariantLineBuilder::default()
///     .phases(assemblage!["g", "bi", "q"])
///     .out(assemblage!["g"])
///     .build()
///     .unwrap();
/// assert!(is_consistent(&assemblage!["bi", "q"], &line));
/// assert!(is_consistent(&assemblage!["g", "bi", "q"], &line));
/// assert!(!is_consistent(&assemblage!["q"], &line));
/// ```
#[must_use]
pub fn is_consistent(field: &Assemblage, line: &UnivariantLine) -> bool {
    let delta = field.symmetric_difference(line.phases());
    delta == *line.out() || delta.is_empty() || is_polymorph_pair(&delta.union(line.out()))
}

/// Identifiers of the lines inconsistent with `field`.
pub fn offending_lines<'a, I>(field: &Assemblage, lines: I) -> Vec<FeatureId>
where
    I: IntoIterator<Item = (FeatureId, &'a UnivariantLine)>,
{
    lines
        .into_iter()
        .filter(|(_, line)| !is_consistent(field, line))
        .map(|(id, _)| id)
        .collect()
}
