//! Invariant points.
//!
//! An invariant point is the zero-dimensional feature where two phases reach zero
//! mode simultaneously. It is normally located by a single calculation, but may
//! carry several samples when re-derived from multiple runs; topology always uses
//! the first one.

use crate::core::feature::{
    CalcResult, Feature, FeatureError, FeatureId, validate_common,
};
use crate::core::phase::{Assemblage, Phase};
use crate::core::polymorph::first_pair_within;
use derive_builder::Builder;
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A zero-dimensional equilibrium feature.
///
/// Build with [`InvariantPointBuilder`]; `build()` rejects malformed
/// specifications with [`FeatureError`].
///
/// # Examples
///
/// ```rust
/// use pseudosection::assemblage;
/// use pseudosection::core::feature::{Feature, FeatureError};
/// use pseudosection::core::invariant_point::InvariantPointBuilder;
///
/// let ip = InvariantPointBuilder::default()
///     .phases(assemblage!["g", "bi", "mu", "q"])
///     .out(assemblage!["g", "mu"])
///     .at(560.0, 5.2)
///     .build()
///     .unwrap();
/// assert_eq!(ip.coord().map(|c| (c.x, c.y)), Some((560.0, 5.2)));
/// assert!(ip.id().is_none());
///
/// let missing = InvariantPointBuilder::default()
///     .phases(assemblage!["g", "bi"])
///     .at(560.0, 5.2)
///     .build();
/// assert_eq!(missing.unwrap_err(), FeatureError::MissingField { field: "out" });
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "FeatureError"))]
pub struct InvariantPoint {
    #[builder(setter(skip))]
    id: Option<FeatureId>,
    /// Phase assemblage.
    #[builder(setter(into))]
    phases: Assemblage,
    /// The two zero-mode phases.
    #[builder(setter(into))]
    out: Assemblage,
    /// Calculated (or user placed) coordinates.
    #[builder(default)]
    samples: Vec<Coord<f64>>,
    /// Per-sample calculation payload.
    #[builder(default)]
    results: Vec<CalcResult>,
    /// User-defined rather than calculated.
    #[builder(default)]
    manual: bool,
    /// Calculation input that produced this point.
    #[builder(default, setter(into))]
    cmd: String,
    /// Raw calculation output.
    #[builder(default, setter(into))]
    output: String,
    /// Variance of the calculation.
    #[builder(default)]
    variance: i32,
}

impl InvariantPointBuilder {
    /// Places the point at a single coordinate.
    pub fn at(&mut self, x: f64, y: f64) -> &mut Self {
        self.samples = Some(vec![Coord { x, y }]);
        self
    }

    fn validate(&self) -> Result<(), FeatureError> {
        // Missing required fields are reported by the generated build step.
        let (Some(phases), Some(out)) = (&self.phases, &self.out) else {
            return Ok(());
        };
        check(
            phases,
            out,
            self.samples.as_deref().unwrap_or(&[]),
            self.results.as_deref().unwrap_or(&[]),
            self.manual.unwrap_or(false),
        )
    }
}

fn check(
    phases: &Assemblage,
    out: &Assemblage,
    samples: &[Coord<f64>],
    results: &[CalcResult],
    manual: bool,
) -> Result<(), FeatureError> {
    validate_common(
        InvariantPoint::KIND,
        phases,
        out,
        2,
        samples,
        results,
        manual,
    )?;
    if samples.is_empty() {
        return Err(FeatureError::MissingCoordinates);
    }
    Ok(())
}

impl InvariantPoint {
    /// All samples.
    #[must_use]
    pub fn samples(&self) -> &[Coord<f64>] {
        &self.samples
    }

    /// Coordinate used for topology (the first sample).
    #[must_use]
    pub fn coord(&self) -> Option<Coord<f64>> {
        self.samples.first().copied()
    }

    /// Per-sample calculation payload.
    #[must_use]
    pub fn results(&self) -> &[CalcResult] {
        &self.results
    }

    /// Calculation input.
    #[must_use]
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Raw calculation output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Calculation variance.
    #[must_use]
    pub const fn variance(&self) -> i32 {
        self.variance
    }

    /// Index of the representative sample.
    #[must_use]
    pub const fn mid_index(&self) -> usize {
        0
    }

    /// Starting-guess lines of the representative sample.
    #[must_use]
    pub fn ptguess(&self) -> Option<&[String]> {
        self.results
            .get(self.mid_index())
            .map(|r| r.ptguess.as_slice())
    }

    /// Result keys of the representative sample; see [`CalcResult::datakeys`].
    #[must_use]
    pub fn datakeys(&self, phase: Option<&str>) -> Option<Vec<&str>> {
        self.results.get(self.mid_index())?.datakeys(phase)
    }

    pub(crate) fn discard_results(&mut self) {
        self.results.clear();
    }

    /// The two zero-mode phases in name order.
    fn out_phases(&self) -> Option<(&Phase, &Phase)> {
        let mut iter = self.out.iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(a), Some(b), None) => Some((a, b)),
            _ => None,
        }
    }

    /// The four `(assemblage, zero-mode set)` pairs of the univariant lines that
    /// meet at this point.
    ///
    /// With zero modes `{a, b}` the lines are `(S, {a})`, `(S, {b})`,
    /// `(S - {b}, {a})` and `(S - {a}, {b})`. When a polymorph pair lies in the
    /// assemblage and straddles the zero-mode set, the polymorph phase plays the
    /// role of the second zero mode.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pseudosection::assemblage;
    /// use pseudosection::core::invariant_point::InvariantPointBuilder;
    ///
    /// let ip = InvariantPointBuilder::default()
    ///     .phases(assemblage!["g", "bi", "mu", "q"])
    ///     .out(assemblage!["g", "mu"])
    ///     .at(560.0, 5.2)
    ///     .build()
    ///     .unwrap();
    /// let lines = ip.all_unilines();
    /// assert!(lines.contains(&(assemblage!["g", "bi", "mu", "q"], assemblage!["g"])));
    /// assert!(lines.contains(&(assemblage!["bi", "mu", "q"], assemblage!["mu"])));
    /// ```
    #[must_use]
    pub fn all_unilines(&self) -> Vec<(Assemblage, Assemblage)> {
        let phases = &self.phases;
        if let Some(pair) = first_pair_within(phases) {
            if !pair.equals(&self.out) && pair.touches(&self.out) {
                let poly = pair.to_assemblage();
                let yes = poly.intersection(&self.out);
                let no = self.out.difference(&yes);
                return vec![
                    (phases.difference(&yes), no.clone()),
                    (phases.difference(&poly.difference(&self.out)), no.clone()),
                    (phases.clone(), yes.clone()),
                    (phases.difference(&no), yes),
                ];
            }
        }
        let Some((a, b)) = self.out_phases() else {
            return Vec::new();
        };
        let aset: Assemblage = [a.clone()].into_iter().collect();
        let bset: Assemblage = [b.clone()].into_iter().collect();
        vec![
            (phases.clone(), aset.clone()),
            (phases.clone(), bset.clone()),
            (phases.difference(&bset), aset.clone()),
            (phases.difference(&aset), bset),
        ]
    }
}

impl Feature for InvariantPoint {
    const KIND: &'static str = "Invariant point";

    fn id(&self) -> Option<FeatureId> {
        self.id
    }

    fn set_id(&mut self, id: FeatureId) {
        self.id = Some(id);
    }

    fn phases(&self) -> &Assemblage {
        &self.phases
    }

    fn out(&self) -> &Assemblage {
        &self.out
    }

    fn set_out(&mut self, out: Assemblage) {
        self.out = out;
    }

    fn is_manual(&self) -> bool {
        self.manual
    }

    fn validate(&self) -> Result<(), FeatureError> {
        check(
            &self.phases,
            &self.out,
            &self.samples,
            &self.results,
            self.manual,
        )
    }
}

impl fmt::Display for InvariantPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Inv: {}", self.label(&Assemblage::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemblage;

    fn point(phases: Assemblage, out: Assemblage) -> InvariantPoint {
        InvariantPointBuilder::default()
            .phases(phases)
            .out(out)
            .at(500.0, 5.0)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_malformed_points() {
        let no_coords = InvariantPointBuilder::default()
            .phases(assemblage!["g", "bi", "q"])
            .out(assemblage!["g", "bi"])
            .build();
        assert_eq!(no_coords.unwrap_err(), FeatureError::MissingCoordinates);

        let single_out = InvariantPointBuilder::default()
            .phases(assemblage!["g", "bi", "q"])
            .out(assemblage!["g"])
            .at(1.0, 1.0)
            .build();
        assert!(matches!(
            single_out,
            Err(FeatureError::ZeroModeArity { expected: 2, actual: 1, .. })
        ));

        let not_subset = InvariantPointBuilder::default()
            .phases(assemblage!["g", "bi", "q"])
            .out(assemblage!["g", "ky"])
            .at(1.0, 1.0)
            .build();
        assert!(matches!(
            not_subset,
            Err(FeatureError::ZeroModeNotSubset { .. })
        ));
    }

    #[test]
    fn all_unilines_without_polymorphs() {
        let ip = point(assemblage!["g", "bi", "mu", "q"], assemblage!["g", "mu"]);
        let lines = ip.all_unilines();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines,
            vec![
                (assemblage!["g", "bi", "mu", "q"], assemblage!["g"]),
                (assemblage!["g", "bi", "mu", "q"], assemblage!["mu"]),
                (assemblage!["g", "bi", "q"], assemblage!["g"]),
                (assemblage!["bi", "mu", "q"], assemblage!["mu"]),
            ]
        );
    }

    #[test]
    fn all_unilines_with_polymorph_on_boundary() {
        // sill/ky polymorph transition meeting a garnet-out line
        let ip = point(
            assemblage!["g", "bi", "sill", "ky", "q"],
            assemblage!["g", "sill"],
        );
        let lines = ip.all_unilines();
        assert_eq!(
            lines,
            vec![
                (assemblage!["g", "bi", "ky", "q"], assemblage!["g"]),
                (assemblage!["g", "bi", "sill", "q"], assemblage!["g"]),
                (assemblage!["g", "bi", "sill", "ky", "q"], assemblage!["sill"]),
                (assemblage!["bi", "sill", "ky", "q"], assemblage!["sill"]),
            ]
        );
    }

    #[test]
    fn label_and_annotation() {
        let mut ip = point(assemblage!["g", "bi", "mu", "q"], assemblage!["g", "mu"]);
        assert_eq!(ip.label(&assemblage!["q"]), "bi g mu - g mu");
        assert_eq!(ip.annotation(false), "0");
        ip.set_id(FeatureId::FIRST);
        assert_eq!(ip.annotation(true), "1 g mu");
        assert_eq!(ip.to_string(), "Inv: bi g mu q - g mu");
    }
}
