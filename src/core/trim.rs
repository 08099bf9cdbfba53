//! Curve trimming.
//!
//! A calculated univariant line usually overshoots its bounding invariant points.
//! Trimming projects the bounding points onto the aspect-scaled sample polyline,
//! keeps the samples whose projections fall between them, and rebuilds the
//! trimmed coordinate sequence `[begin point] + used samples + [end point]`.
//!
//! Degenerate input never fails: lines without samples, single-sample lines and
//! fully open manual lines fall back to the shortest coordinate sequence that can
//! be built from what is there.

use crate::core::feature::{Feature, FeatureId};
use crate::core::invariant_point::InvariantPoint;
use crate::core::section::{Section, SectionError};
use crate::core::univariant_line::{UnivariantLine, UsedRange};
use crate::geometry::polyline::{Polyline, scale_y};
use geo::Coord;

/// Bounding point coordinates of a line, unscaled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Coordinate of the begin point, `None` when open.
    pub begin: Option<Coord<f64>>,
    /// Coordinate of the end point, `None` when open.
    pub end: Option<Coord<f64>>,
}

/// Trims `line` against bounding coordinates, with y scaled by `ratio`.
///
/// Returns `true` if the begin and end points were swapped to follow the sample
/// order.
///
/// # Examples
///
/// ```rust
/// use pseudosection::assemblage;
/// use pseudosection::core::trim::{Bounds, trim_with};
/// use pseudosection::core::univariant_line::UnivariantLineBuilder;
/// use geo::coord;
///
/// let mut line = UnivariantLineBuilder::default()
///     .phases(assemblage!["g", "bi"])
///     .out(assemblage!["g"])
///     .samples((0..5).map(|i| coord! { x: f64::from(i), y: 0.0 }).collect())
///     .build()
///     .unwrap();
/// let bounds = Bounds {
///     begin: Some(coord! { x: 0.5, y: 0.0 }),
///     end: Some(coord! { x: 3.5, y: 0.0 }),
/// };
/// assert!(!trim_with(&mut line, bounds, 1.0));
/// assert_eq!(line.used().as_range(), 1..4);
/// assert_eq!(line.trimmed().len(), 5);
/// ```
pub fn trim_with(line: &mut UnivariantLine, bounds: Bounds, ratio: f64) -> bool {
    let mut bounds = bounds;
    let mut swapped = false;

    if line.manual || line.samples.is_empty() {
        line.used = UsedRange::empty();
    } else {
        let polyline = Polyline::new(scale_y(&line.samples, ratio));
        let scale = |c: Coord<f64>| Coord {
            x: c.x,
            y: c.y * ratio,
        };
        let vdst = polyline.vertex_distances();
        // Open ends are measured at the first and last samples.
        let coords = polyline.coords();
        let mut d1 = bounds
            .begin
            .map(scale)
            .or_else(|| coords.first().copied())
            .map_or(0.0, |c| polyline.project(c));
        let mut d2 = bounds
            .end
            .map(scale)
            .or_else(|| coords.last().copied())
            .map_or(0.0, |c| polyline.project(c));
        if d1 > d2 {
            std::mem::swap(&mut d1, &mut d2);
            std::mem::swap(&mut bounds.begin, &mut bounds.end);
            std::mem::swap(&mut line.begin, &mut line.end);
            swapped = true;
        }
        let start = vdst.iter().position(|d| *d >= d1).unwrap_or(vdst.len());
        let stop = vdst
            .iter()
            .rposition(|d| *d <= d2)
            .map_or(0, |i| i + 1)
            .max(start);
        line.used = UsedRange { start, stop };
    }

    let mut trimmed = Vec::with_capacity(line.used.len() + 2);
    trimmed.extend(bounds.begin);
    trimmed.extend_from_slice(line.used_samples());
    trimmed.extend(bounds.end);
    if trimmed.is_empty() {
        // Open at both ends with nothing used.
        trimmed.extend(line.samples.first().copied());
    }
    line.trimmed = trimmed;
    swapped
}

impl Section {
    fn bound_coord(
        &self,
        line: FeatureId,
        point: Option<FeatureId>,
    ) -> Result<Option<Coord<f64>>, SectionError> {
        point
            .map(|point| {
                self.invpoints
                    .get(&point)
                    .and_then(InvariantPoint::coord)
                    .ok_or(SectionError::DanglingBound { line, point })
            })
            .transpose()
    }

    /// Bounding coordinates of a registered line.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::UnknownUnivariantLine`] for an unknown line and
    /// [`SectionError::DanglingBound`] if a bound is not registered.
    pub fn bounds_of(&self, id: FeatureId) -> Result<Bounds, SectionError> {
        let line = self
            .unilines
            .get(&id)
            .ok_or(SectionError::UnknownUnivariantLine(id))?;
        Ok(Bounds {
            begin: self.bound_coord(id, line.begin())?,
            end: self.bound_coord(id, line.end())?,
        })
    }

    /// Re-trims one line against its current bounding points.
    ///
    /// # Errors
    ///
    /// See [`Section::bounds_of`].
    pub fn trim_line(&mut self, id: FeatureId) -> Result<(), SectionError> {
        let bounds = self.bounds_of(id)?;
        let ratio = self.ratio();
        let line = self
            .unilines
            .get_mut(&id)
            .ok_or(SectionError::UnknownUnivariantLine(id))?;
        if trim_with(line, bounds, ratio) {
            tracing::debug!(
                "Univariant line {id}: begin and end swapped to follow sample order"
            );
        }
        if line.trimmed().len() < 2 {
            tracing::debug!(
                "Univariant line {id}: degenerate trim with {} coordinate(s)",
                line.trimmed().len()
            );
        }
        Ok(())
    }

    /// Re-trims every line.
    ///
    /// # Errors
    ///
    /// See [`Section::bounds_of`].
    pub fn trim_all(&mut self) -> Result<(), SectionError> {
        let ids: Vec<FeatureId> = self.unilines.keys().copied().collect();
        ids.into_iter().try_for_each(|id| self.trim_line(id))
    }

    /// Drops calculation data outside the used span of every line.
    ///
    /// Calculated lines keep their used samples plus one neighbour on each side,
    /// so that later re-trims against moved bounding points still have data to
    /// work with. Manual lines lose all calculation payload.
    ///
    /// # Errors
    ///
    /// See [`Section::bounds_of`].
    pub fn cleanup_data(&mut self) -> Result<(), SectionError> {
        for line in self.unilines.values_mut() {
            if line.is_manual() {
                line.samples.clear();
                line.results.clear();
                line.used = UsedRange::empty();
                continue;
            }
            let keep = line.used.widened(line.samples.len());
            line.samples = line.samples.get(keep.clone()).map(<[_]>::to_vec).unwrap_or_default();
            if !line.results.is_empty() {
                line.results = line.results.get(keep).map(<[_]>::to_vec).unwrap_or_default();
            }
        }
        self.trim_all()
    }
}
