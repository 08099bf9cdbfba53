//! Property-based tests for registration and trimming.
//!
//! - Registration is idempotent and hands out consecutive non-zero identifiers
//! - Trimming keeps `start <= stop` and ends exactly at the bounding points

#![forbid(unsafe_code)]

use geo::{Coord, coord};
use proptest::prelude::*;
use pseudosection::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

const PHASES: [&str; 8] = ["g", "bi", "mu", "q", "st", "chl", "pl", "H2O"];

/// Strategy for a sample sequence with strictly increasing x.
fn monotone_samples() -> impl Strategy<Value = Vec<Coord<f64>>> {
    prop::collection::vec((0.5..5.0_f64, -3.0..3.0_f64), 2..20).prop_map(|steps| {
        let mut x = 0.0;
        steps
            .into_iter()
            .map(|(dx, y)| {
                x += dx;
                coord! { x: x, y: y }
            })
            .collect()
    })
}

/// Strategy for a valid univariant line specification: phase indices plus the
/// index of the zero-mode phase among them.
fn line_spec() -> impl Strategy<Value = (Vec<usize>, usize)> {
    prop::sample::subsequence((0..PHASES.len()).collect::<Vec<_>>(), 2..6)
        .prop_flat_map(|phases| {
            let n = phases.len();
            (Just(phases), 0..n)
        })
}

fn build_line(spec: &(Vec<usize>, usize), samples: Vec<Coord<f64>>) -> UnivariantLine {
    let (phases, out) = spec;
    UnivariantLineBuilder::default()
        .phases(phases.iter().map(|i| PHASES[*i]).collect::<Assemblage>())
        .out(assemblage![PHASES[phases[*out]]])
        .samples(samples)
        .build()
        .unwrap()
}

fn wide_section() -> Section {
    Section::new(SectionKind::Pt)
        .with_ranges((0.0, 100.0), (-5.0, 5.0))
        .unwrap()
}

proptest! {
    /// Property: registering a line twice never creates a second feature.
    #[test]
    fn prop_registration_is_idempotent(
        spec in line_spec(),
        samples in monotone_samples(),
    ) {
        let mut section = wide_section();
        let line = build_line(&spec, samples);
        let first = section.register_univariant_line(line.clone()).unwrap();
        let second = section.register_univariant_line(line).unwrap();
        prop_assert!(first.is_new());
        prop_assert_eq!(second, Identity::Existing(first.id()));
        prop_assert_eq!(section.number_of_univariant_lines(), 1);
    }

    /// Property: identifiers are never zero and new ones follow the largest.
    #[test]
    fn prop_identifiers_are_positive_and_consecutive(
        specs in prop::collection::vec(line_spec(), 1..12),
        samples in monotone_samples(),
    ) {
        let mut section = wide_section();
        let mut expected = FeatureId::FIRST;
        for spec in &specs {
            let identity = section
                .register_univariant_line(build_line(spec, samples.clone()))
                .unwrap();
            prop_assert!(identity.id().get() > 0);
            if identity.is_new() {
                prop_assert_eq!(identity.id(), expected);
                expected = expected.next().unwrap();
            }
        }
        prop_assert_eq!(
            section.number_of_univariant_lines(),
            (expected.get() - 1) as usize
        );
    }

    /// Property: a line bounded by points on its samples is trimmed to them.
    #[test]
    fn prop_trim_ends_at_bounding_points(
        samples in monotone_samples(),
        i in any::<prop::sample::Index>(),
        j in any::<prop::sample::Index>(),
    ) {
        let mut section = wide_section();
        let phases = assemblage!["g", "bi", "mu", "q"];
        let (a, b) = (samples[i.index(samples.len())], samples[j.index(samples.len())]);
        let p1 = section
            .register_invariant_point(
                InvariantPointBuilder::default()
                    .phases(phases.clone())
                    .out(assemblage!["g", "bi"])
                    .at(a.x, a.y)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .id();
        let p2 = section
            .register_invariant_point(
                InvariantPointBuilder::default()
                    .phases(phases.clone())
                    .out(assemblage!["mu", "q"])
                    .at(b.x, b.y)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .id();
        let line = UnivariantLineBuilder::default()
            .phases(phases)
            .out(assemblage!["g"])
            .samples(samples)
            .begin(p1)
            .end(p2)
            .build()
            .unwrap();
        let id = section.register_univariant_line(line).unwrap().id();

        let ul = section.univariant_line(id).unwrap();
        let used = ul.used();
        prop_assert!(used.start <= used.stop);
        prop_assert!(used.stop <= ul.samples().len());

        let coord_of = |point: Option<FeatureId>| {
            point
                .and_then(|p| section.invariant_point(p))
                .and_then(InvariantPoint::coord)
        };
        prop_assert_eq!(ul.trimmed().first().copied(), coord_of(ul.begin()));
        prop_assert_eq!(ul.trimmed().last().copied(), coord_of(ul.end()));
    }

    /// Property: trimming the whole section again changes nothing.
    #[test]
    fn prop_trimming_is_stable(
        samples in monotone_samples(),
        spec in line_spec(),
    ) {
        let mut section = wide_section();
        section.register_univariant_line(build_line(&spec, samples)).unwrap();
        let before = section.clone();
        section.trim_all().unwrap();
        prop_assert_eq!(section, before);
    }
}
