use std::path::Path;

use vizguard::{
    Descriptor, EngineConfig, LayoutCatalog, LayoutMode, PixelSystem, Repair, Theme,
    ViolationKind, auto_fix, constraint_prompt, parse_descriptor, project_scene,
    render_preview_svg, validate,
};

fn load_fixture(rel: &str) -> Descriptor {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    assert!(path.exists(), "fixture missing: {rel}");
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_descriptor(&input).expect("parse failed")
}

#[test]
fn every_fixture_fixes_to_a_stable_result() {
    let config = EngineConfig::default();
    let catalog = LayoutCatalog::standard();

    // Keep this list explicit so new scenarios must be added intentionally.
    let cases = [
        ("split_overcount.json", LayoutMode::Split),
        ("bounds_clamp.json", LayoutMode::Full),
        ("label_overflow.json", LayoutMode::Split),
        ("dangling_link.json", LayoutMode::Full),
        ("grid_valid.json", LayoutMode::Grid),
        ("step_sizes.json", LayoutMode::StepByStep),
        ("llm_reply.md", LayoutMode::Split),
    ];

    for (rel, mode) in cases {
        let entry = catalog.entry(mode);
        let desc = load_fixture(rel);
        let once = auto_fix(&desc, entry, &config).expect("auto_fix failed");
        assert!(once.report.valid, "{rel}: {:?}", once.report.errors);
        assert!(
            !once.report.has(ViolationKind::DanglingLink),
            "{rel}: dangling link survived"
        );
        let twice = auto_fix(&once.descriptor, entry, &config).expect("auto_fix failed");
        assert_eq!(once.descriptor, twice.descriptor, "{rel}: second fix changed output");
        assert_eq!(twice.passes, 0, "{rel}");

        let again = auto_fix(&desc, entry, &config).expect("auto_fix failed");
        assert_eq!(once, again, "{rel}: fix is not deterministic");
    }
}

#[test]
fn split_overcount_keeps_six_nodes_and_their_links() {
    let desc = load_fixture("split_overcount.json");
    let entry = LayoutCatalog::standard().entry(LayoutMode::Split);
    let config = EngineConfig::default();

    let before = validate(&desc, entry, &config).unwrap();
    assert!(!before.valid);
    assert!(before.has(ViolationKind::TooManyNodes));

    let outcome = auto_fix(&desc, entry, &config).unwrap();
    assert_eq!(outcome.descriptor.nodes.len(), 6);
    let kept: Vec<&str> = outcome.descriptor.nodes.iter().map(|n| n.id.as_str()).collect();
    for link in &outcome.descriptor.links {
        assert!(kept.contains(&link.source.as_str()) && kept.contains(&link.target.as_str()));
    }
    // Exactly the links that lost an endpoint are gone.
    let expected_links = desc
        .links
        .iter()
        .filter(|l| kept.contains(&l.source.as_str()) && kept.contains(&l.target.as_str()))
        .count();
    assert_eq!(outcome.descriptor.links.len(), expected_links);
    assert!(outcome.report.errors.is_empty());
}

#[test]
fn bounds_clamp_moves_whole_nodes_inside() {
    let desc = load_fixture("bounds_clamp.json");
    let entry = LayoutCatalog::standard().entry(LayoutMode::Full);
    let config = EngineConfig::default();

    let before = validate(&desc, entry, &config).unwrap();
    assert_eq!(before.count(ViolationKind::OutOfBounds), 2);

    let outcome = auto_fix(&desc, entry, &config).unwrap();
    let origin = outcome.descriptor.node("origin").unwrap().position.unwrap();
    assert!(origin.x >= 90.0 - 1e-9 && origin.y >= 90.0 - 1e-9);
    let far = outcome.descriptor.node("far").unwrap().position.unwrap();
    assert!((far.x - 1840.0).abs() < 1e-9 && (far.y - 1000.0).abs() < 1e-9);
    let clamps = outcome
        .repairs
        .iter()
        .filter(|r| matches!(r, Repair::ClampedPosition { .. }))
        .count();
    assert_eq!(clamps, 2);
}

#[test]
fn label_overflow_keeps_first_word() {
    let desc = load_fixture("label_overflow.json");
    let entry = LayoutCatalog::standard().entry(LayoutMode::Split);
    let outcome = auto_fix(&desc, entry, &EngineConfig::default()).unwrap();
    let label = &outcome.descriptor.node("check").unwrap().label;
    assert!(label.chars().count() <= 20);
    assert!(label.ends_with('\u{2026}'));
    assert!(label.starts_with("verify:"));
    assert_eq!(outcome.descriptor.node("sum").unwrap().label, "12 + 2");
}

#[test]
fn dangling_links_are_warnings_then_dropped() {
    let desc = load_fixture("dangling_link.json");
    let entry = LayoutCatalog::standard().entry(LayoutMode::Full);
    let config = EngineConfig::default();
    let before = validate(&desc, entry, &config).unwrap();
    assert!(before.valid);
    assert_eq!(before.count(ViolationKind::DanglingLink), 2);

    let outcome = auto_fix(&desc, entry, &config).unwrap();
    assert_eq!(outcome.descriptor.links.len(), 1);
    assert_eq!(outcome.descriptor.nodes, desc.nodes);
}

#[test]
fn valid_descriptor_round_trips_untouched() {
    let desc = load_fixture("grid_valid.json");
    let entry = LayoutCatalog::standard().entry(LayoutMode::Grid);
    let outcome = auto_fix(&desc, entry, &EngineConfig::default()).unwrap();
    assert_eq!(outcome.descriptor, desc);
    assert_eq!(outcome.passes, 0);
    assert!(!outcome.report.auto_fixed);
}

#[test]
fn sizes_clamp_to_mode_range() {
    let desc = load_fixture("step_sizes.json");
    let entry = LayoutCatalog::standard().entry(LayoutMode::StepByStep);
    let outcome = auto_fix(&desc, entry, &EngineConfig::default()).unwrap();
    assert_eq!(outcome.descriptor.node("tiny").unwrap().size, 20.0);
    assert_eq!(outcome.descriptor.node("huge").unwrap().size, 100.0);
}

#[test]
fn prompt_matches_enforced_limits_for_every_mode() {
    for entry in LayoutCatalog::standard().entries() {
        let text = constraint_prompt(entry);
        assert!(text.contains(&format!("at most {} nodes", entry.limits.max_nodes)));
        assert!(text.contains(&format!(
            "labels at most {} characters",
            entry.limits.max_label_chars
        )));
    }
}

#[test]
fn fixed_reply_previews_as_svg() {
    let desc = load_fixture("llm_reply.md");
    assert_eq!(desc.nodes.len(), 4);
    let entry = LayoutCatalog::standard().entry(LayoutMode::Split);
    let config = EngineConfig::default();
    let theme = Theme::default();
    let outcome = auto_fix(&desc, entry, &config).unwrap();
    let scene = project_scene::<PixelSystem>(&outcome.descriptor, entry, &config, &theme).unwrap();
    assert_eq!(scene.links.len(), 3);
    assert!(scene.collisions.is_empty());
    let svg = render_preview_svg(&scene, &theme);
    assert_eq!(svg.matches("<circle").count(), 4);
}
