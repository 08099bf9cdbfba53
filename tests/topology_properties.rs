//! End-to-end checks of identity resolution, trimming and field extraction on
//! small hand-built sections.

#![forbid(unsafe_code)]

use approx::assert_relative_eq;
use geo::{Area, Coord, coord};
use pseudosection::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn square() -> Section {
    Section::new(SectionKind::Pt)
        .with_ranges((0.0, 10.0), (0.0, 10.0))
        .unwrap()
}

fn point(phases: Assemblage, out: Assemblage, x: f64, y: f64) -> InvariantPoint {
    InvariantPointBuilder::default()
        .phases(phases)
        .out(out)
        .at(x, y)
        .build()
        .unwrap()
}

fn line(phases: Assemblage, out: Assemblage, samples: Vec<Coord<f64>>) -> UnivariantLineBuilder {
    let mut builder = UnivariantLineBuilder::default();
    builder.phases(phases).out(out).samples(samples);
    builder
}

// =============================================================================
// IDENTITY
// =============================================================================

#[test]
fn registering_twice_returns_the_same_identifier() {
    init_tracing();
    let mut section = square();
    let ul = line(
        assemblage!["g", "bi", "mu", "q"],
        assemblage!["g"],
        vec![coord! { x: 1.0, y: 1.0 }, coord! { x: 9.0, y: 9.0 }],
    )
    .build()
    .unwrap();

    let first = section.register_univariant_line(ul.clone()).unwrap();
    let second = section.register_univariant_line(ul).unwrap();
    assert!(first.is_new());
    assert!(!second.is_new());
    assert_eq!(first.id(), second.id());
    assert_eq!(section.number_of_univariant_lines(), 1);

    let ip = point(assemblage!["g", "bi", "mu", "q"], assemblage!["g", "mu"], 5.0, 5.0);
    let first = section.register_invariant_point(ip.clone()).unwrap();
    let second = section.register_invariant_point(ip).unwrap();
    assert_eq!(first, Identity::New(FeatureId::FIRST));
    assert_eq!(second, Identity::Existing(FeatureId::FIRST));
}

#[test]
fn polymorph_zero_modes_resolve_to_the_stored_feature() {
    init_tracing();
    let mut section = square();
    let phases = assemblage!["sill", "ky", "bi", "q"];
    let samples = vec![coord! { x: 2.0, y: 1.0 }, coord! { x: 3.0, y: 9.0 }];

    let sill_out = line(phases.clone(), assemblage!["sill"], samples.clone())
        .build()
        .unwrap();
    let stored = section.register_univariant_line(sill_out).unwrap();

    let ky_out = line(phases, assemblage!["ky"], samples).build().unwrap();
    let resolved = section.resolve_univariant_line(&ky_out).unwrap();
    assert_eq!(resolved.identity, Identity::Existing(stored.id()));
    assert_eq!(resolved.feature.out(), &assemblage!["sill"]);
    // The candidate itself is untouched.
    assert_eq!(ky_out.out(), &assemblage!["ky"]);

    let again = section.register_univariant_line(ky_out).unwrap();
    assert_eq!(again.id(), stored.id());
    assert_eq!(section.number_of_univariant_lines(), 1);
}

#[test]
fn different_zero_modes_are_different_features() {
    let mut section = square();
    let phases = assemblage!["g", "bi", "mu", "q"];
    let samples = vec![coord! { x: 2.0, y: 1.0 }, coord! { x: 3.0, y: 9.0 }];
    let a = section
        .register_univariant_line(line(phases.clone(), assemblage!["g"], samples.clone()).build().unwrap())
        .unwrap();
    let b = section
        .register_univariant_line(line(phases, assemblage!["mu"], samples).build().unwrap())
        .unwrap();
    assert!(a.is_new() && b.is_new());
    assert_eq!(a.id().next(), Some(b.id()));
}

// =============================================================================
// TRIMMING
// =============================================================================

#[test]
fn trimmed_line_ends_exactly_at_its_invariant_points() {
    init_tracing();
    let mut section = square();
    let phases = assemblage!["g", "bi", "mu", "q"];
    let p1 = section
        .register_invariant_point(point(phases.clone(), assemblage!["g", "bi"], 2.0, 5.0))
        .unwrap()
        .id();
    let p2 = section
        .register_invariant_point(point(phases.clone(), assemblage!["mu", "q"], 8.0, 5.0))
        .unwrap()
        .id();

    let samples: Vec<_> = (0..=10).map(|i| coord! { x: f64::from(i), y: 5.0 }).collect();
    let ul = line(phases, assemblage!["g"], samples)
        .begin(p1)
        .end(p2)
        .build()
        .unwrap();
    let id = section.register_univariant_line(ul).unwrap().id();

    let ul = section.univariant_line(id).unwrap();
    let used = ul.used();
    assert!(used.start <= used.stop);
    assert_eq!(used.as_range(), 2..9);
    assert_eq!(ul.trimmed().first(), Some(&coord! { x: 2.0, y: 5.0 }));
    assert_eq!(ul.trimmed().last(), Some(&coord! { x: 8.0, y: 5.0 }));
}

#[test]
fn bounds_given_against_sample_order_are_swapped() {
    let mut section = square();
    let phases = assemblage!["g", "bi", "mu", "q"];
    let p1 = section
        .register_invariant_point(point(phases.clone(), assemblage!["g", "bi"], 7.0, 2.0))
        .unwrap()
        .id();
    let p2 = section
        .register_invariant_point(point(phases.clone(), assemblage!["mu", "q"], 3.0, 2.0))
        .unwrap()
        .id();
    let samples: Vec<_> = (0..=10).map(|i| coord! { x: f64::from(i), y: 2.0 }).collect();
    let ul = line(phases, assemblage!["g"], samples)
        .begin(p1)
        .end(p2)
        .build()
        .unwrap();
    let id = section.register_univariant_line(ul).unwrap().id();

    let ul = section.univariant_line(id).unwrap();
    assert_eq!(ul.begin(), Some(p2));
    assert_eq!(ul.end(), Some(p1));
    assert_eq!(ul.trimmed().first(), Some(&coord! { x: 3.0, y: 2.0 }));
    assert_eq!(ul.trimmed().last(), Some(&coord! { x: 7.0, y: 2.0 }));
}

#[test]
fn open_begin_keeps_the_first_sample() {
    let mut section = square();
    let samples = vec![
        coord! { x: 1.0, y: 1.0 },
        coord! { x: 2.0, y: 2.0 },
        coord! { x: 3.0, y: 3.0 },
    ];
    let ul = line(assemblage!["g", "bi"], assemblage!["g"], samples.clone())
        .build()
        .unwrap();
    let id = section.register_univariant_line(ul).unwrap().id();
    assert!(id.get() > 0);

    let ul = section.univariant_line(id).unwrap();
    assert_eq!(ul.begin(), None);
    assert_eq!(ul.used().start, 0);
    assert_eq!(ul.trimmed(), samples.as_slice());
    assert_eq!(FeatureId::from_raw(0), None);
}

// =============================================================================
// FIELDS
// =============================================================================

/// Four rays from an invariant point at the centre of the square.
fn cross_section() -> Section {
    let s = assemblage!["g", "mu", "bi", "q"];
    let (g, mu) = (assemblage!["g"], assemblage!["mu"]);
    let mut section = square();
    let p = section
        .register_invariant_point(point(s.clone(), assemblage!["g", "mu"], 5.0, 5.0))
        .unwrap()
        .id();

    let rays = [
        (s.clone(), g.clone(), coord! { x: 6.0, y: 5.0 }, coord! { x: 12.0, y: 5.0 }),
        (s.clone(), mu.clone(), coord! { x: 5.0, y: 6.0 }, coord! { x: 5.0, y: 12.0 }),
        (s.difference(&mu), g, coord! { x: 4.0, y: 5.0 }, coord! { x: -2.0, y: 5.0 }),
        (s.difference(&assemblage!["g"]), mu, coord! { x: 5.0, y: 4.0 }, coord! { x: 5.0, y: -2.0 }),
    ];
    for (phases, out, near, far) in rays {
        let ul = line(phases, out, vec![near, far]).begin(p).build().unwrap();
        assert!(section.register_univariant_line(ul).unwrap().is_new());
    }
    section
}

#[test]
fn crossing_lines_partition_the_domain_into_four_fields() {
    init_tracing();
    let section = cross_section();
    let fields = section.extract_fields();
    assert!(fields.is_clean(), "{:?}", fields.diagnostics());
    assert_eq!(fields.len(), 4);

    for key in [
        assemblage!["g", "mu", "bi", "q"],
        assemblage!["mu", "bi", "q"],
        assemblage!["g", "bi", "q"],
        assemblage!["bi", "q"],
    ] {
        let field = fields.get(&key).unwrap_or_else(|| panic!("missing field {key}"));
        assert_relative_eq!(field.polygon().unsigned_area(), 25.0, epsilon = 1e-9);
        assert_eq!(field.lines().len(), 2);
    }

    // Neighbours across a line differ by exactly its zero-mode phase.
    for (id, ul) in section.univariant_lines() {
        let sides: Vec<&Assemblage> = fields
            .iter()
            .filter(|(_, field)| field.lines().contains(&id))
            .map(|(key, _)| key)
            .collect();
        assert_eq!(sides.len(), 2, "line {id}");
        assert_eq!(&sides[0].symmetric_difference(sides[1]), ul.out());
    }
}

#[test]
fn duplicate_assemblage_faces_are_merged_and_logged() {
    init_tracing();
    let mut section = square();
    let vertical = |x: f64| vec![coord! { x: x, y: -1.0 }, coord! { x: x, y: 11.0 }];
    let specs = [
        (assemblage!["bi", "mu", "q", "g"], assemblage!["g"], 3.0),
        (assemblage!["bi", "mu", "q"], assemblage!["q"], 5.0),
        (assemblage!["bi", "mu", "q", "st"], assemblage!["st"], 7.0),
    ];
    let mut ids = Vec::new();
    for (phases, out, x) in specs {
        let ul = line(phases, out, vertical(x)).build().unwrap();
        ids.push(section.register_univariant_line(ul).unwrap().id());
    }

    let fields = section.extract_fields();
    assert_eq!(fields.len(), 3);

    let merged = fields.get(&assemblage!["bi", "mu", "q"]).unwrap();
    assert_eq!(merged.polygon().0.len(), 1);
    assert_relative_eq!(merged.polygon().unsigned_area(), 40.0, epsilon = 1e-2);
    assert_eq!(merged.lines().iter().copied().collect::<Vec<_>>(), ids);

    let logged: Vec<&Diagnostic> = fields
        .diagnostics()
        .iter()
        .filter(|d| matches!(d, Diagnostic::SelfIntersecting { .. }))
        .collect();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].lines(), ids);
    assert!(logged[0].to_string().contains("self-intersecting"));
}

#[test]
fn ray_ending_on_a_line_reinterprets_the_single_line_side() {
    init_tracing();
    let mut section = square();
    let full = line(
        assemblage!["bi", "mu", "q"],
        assemblage!["bi"],
        vec![coord! { x: 5.0, y: -1.0 }, coord! { x: 5.0, y: 11.0 }],
    )
    .build()
    .unwrap();
    let ray = line(
        assemblage!["bi", "mu", "q", "g"],
        assemblage!["g"],
        vec![coord! { x: 5.0, y: 5.0 }, coord! { x: 12.0, y: 5.0 }],
    )
    .build()
    .unwrap();
    let full = section.register_univariant_line(full).unwrap().id();
    let ray = section.register_univariant_line(ray).unwrap().id();

    // Both sides of the full line share its assemblage; the side without the
    // ray loses the zero-mode phase and the two faces right of it are merged.
    let fields = section.extract_fields();
    assert_eq!(fields.len(), 2);
    let left = fields.get(&assemblage!["mu", "q"]).unwrap();
    assert_eq!(left.lines().iter().copied().collect::<Vec<_>>(), [full]);
    assert_relative_eq!(left.polygon().unsigned_area(), 50.0, epsilon = 1e-9);
    let right = fields.get(&assemblage!["bi", "mu", "q"]).unwrap();
    assert_eq!(right.lines().iter().copied().collect::<Vec<_>>(), [full, ray]);
    assert_relative_eq!(right.polygon().unsigned_area(), 50.0, epsilon = 1e-2);

    assert_eq!(fields.diagnostics().len(), 1);
    assert!(matches!(
        &fields.diagnostics()[0],
        Diagnostic::SelfIntersecting { assemblage, .. } if *assemblage == assemblage!["bi", "mu", "q"]
    ));
}

#[test]
fn supporting_lines_follow_the_fields() {
    let section = cross_section();
    let fields = section.extract_fields();
    let support = fields.supporting_lines();
    assert_eq!(support.len(), fields.len());
    for (key, lines) in support {
        let field = fields.get(&key).unwrap();
        assert_eq!(lines.len(), field.lines().len());
    }
}

#[test]
fn tiny_faces_can_be_filtered() {
    let section = cross_section();
    let options = ExtractionOptions {
        min_face_area: 30.0,
        ..ExtractionOptions::default()
    };
    let fields = section.extract_fields_with(&options);
    assert!(fields.is_empty());
}
