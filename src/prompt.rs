use crate::catalog::CatalogEntry;
use crate::coords::{CoordinateMapper, PixelSystem, SafeBounds, UnitSystem};

/// Text block describing the limits `validate` enforces for `entry`, meant to
/// be pasted into the generator's instructions. Every number comes from the
/// same catalog entry the validator reads, canvas included.
pub fn constraint_prompt(entry: &CatalogEntry) -> String {
    let canvas = &entry.canvas;
    let mapper = CoordinateMapper::for_entry(entry);
    let px: SafeBounds<PixelSystem> = mapper.bounds_for(entry);
    let units: SafeBounds<UnitSystem> = mapper.bounds_for(entry);
    let limits = &entry.limits;
    let range = limits.node_size_range;

    let mut out = String::new();
    out.push_str(&format!("LAYOUT CONSTRAINTS (mode: {})\n", entry.mode));
    out.push_str(&format!(
        "Canvas: {:.0} x {:.0} px ({:.2} x {:.2} scene units), {:.0} px clear on every edge.\n",
        canvas.width,
        canvas.height,
        canvas.frame_width,
        canvas.frame_height(),
        canvas.outer_padding
    ));
    if entry.panes.len() > 1 {
        out.push_str(&format!(
            "The canvas is split into {} panes; the diagram goes in pane {} (row-major, from the top-left).\n",
            entry.panes.len(),
            entry.primary_pane + 1
        ));
    }
    if let Some(zone) = entry.title_zone {
        let zone: SafeBounds<PixelSystem> = mapper.from_norm_rect(zone);
        out.push_str(&format!(
            "y {:.0}..{:.0} px is reserved for the title.\n",
            zone.top, zone.bottom
        ));
    }
    if let Some(zone) = entry.footer_zone {
        let zone: SafeBounds<PixelSystem> = mapper.from_norm_rect(zone);
        out.push_str(&format!(
            "y {:.0}..{:.0} px is reserved for the footer.\n",
            zone.top, zone.bottom
        ));
    }
    out.push_str(&format!(
        "Usable area: x {:.0}..{:.0} px, y {:.0}..{:.0} px ({:.0} x {:.0} px).\n",
        px.left,
        px.right,
        px.top,
        px.bottom,
        px.width(),
        px.height()
    ));
    out.push_str(&format!(
        "Usable area in scene units: x {:.2}..{:.2}, y {:.2}..{:.2} (y up, origin at canvas center).\n",
        units.left,
        units.right,
        units.min_y(),
        units.max_y()
    ));
    out.push_str("Rules:\n");
    out.push_str(&format!("- at most {} nodes\n", limits.max_nodes));
    out.push_str(&format!(
        "- labels at most {} characters\n",
        limits.max_label_chars
    ));
    out.push_str(&format!(
        "- node size between {:.0} and {:.0} px\n",
        range.min, range.max
    ));
    out.push_str(&format!(
        "- at least {:.0} px between the edges of any two nodes\n",
        limits.min_spacing
    ));
    out.push_str("- every link must connect two node ids that exist\n");
    out.push_str(
        "- position is optional; when given it is the node center in canvas pixels (origin top-left, y down) and the whole node must lie inside the usable area\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LayoutCatalog, LayoutMode};
    use crate::config::{CanvasConfig, EngineConfig, LimitOverride, ModeOverrides};
    use crate::ir::{Descriptor, Position};
    use crate::validate::{ViolationKind, validate};

    #[test]
    fn split_prompt_lists_the_right_pane() {
        let entry = LayoutCatalog::standard().entry(LayoutMode::Split);
        let text = constraint_prompt(entry);
        assert!(text.contains("mode: split"));
        assert!(text.contains("at most 6 nodes"));
        assert!(text.contains("labels at most 20 characters"));
        assert!(text.contains("between 24 and 120 px"));
        assert!(text.contains("at least 20 px"));
        assert!(text.contains("x 980..1870 px, y 50..1030 px"));
        assert!(text.contains("pane 2"));
    }

    #[test]
    fn full_prompt_has_no_pane_line() {
        let entry = LayoutCatalog::standard().entry(LayoutMode::Full);
        let text = constraint_prompt(entry);
        assert!(!text.contains("panes"));
        assert!(text.contains("x -6.74..6.74"));
    }

    #[test]
    fn overrides_flow_into_the_prompt() {
        let mut overrides = ModeOverrides::new();
        overrides.insert(
            LayoutMode::Grid,
            LimitOverride {
                max_nodes: Some(2),
                ..LimitOverride::default()
            },
        );
        let catalog = LayoutCatalog::new(&CanvasConfig::default(), &overrides).unwrap();
        let text = constraint_prompt(catalog.entry(LayoutMode::Grid));
        assert!(text.contains("at most 2 nodes"));
    }

    #[test]
    fn usable_area_follows_the_entry_canvas() {
        let canvas = CanvasConfig {
            width: 1280.0,
            height: 720.0,
            ..CanvasConfig::default()
        };
        let catalog = LayoutCatalog::new(&canvas, &ModeOverrides::default()).unwrap();
        let entry = catalog.entry(LayoutMode::Full);
        let bounds: SafeBounds<PixelSystem> = CoordinateMapper::for_entry(entry).bounds_for(entry);
        let text = constraint_prompt(entry);
        assert!(text.contains("Canvas: 1280 x 720 px"));
        assert!(text.contains(&format!(
            "Usable area: x {:.0}..{:.0} px, y {:.0}..{:.0} px",
            bounds.left, bounds.right, bounds.top, bounds.bottom
        )));
        assert!(text.contains("x 50..1230 px, y 50..670 px"));

        // A node centred in the advertised area passes; one past it does not.
        let mut desc = Descriptor::new();
        desc.push_node("inside", "a", 40.0);
        desc.nodes[0].position = Some(Position { x: 640.0, y: 360.0 });
        let engine = EngineConfig {
            canvas,
            ..EngineConfig::default()
        };
        assert!(validate(&desc, entry, &engine).unwrap().valid);
        desc.nodes[0].position = Some(Position { x: 1500.0, y: 600.0 });
        let result = validate(&desc, entry, &engine).unwrap();
        assert!(result.has(ViolationKind::OutOfBounds));
    }

    #[test]
    fn titled_canvas_mentions_reserved_strips() {
        let catalog = LayoutCatalog::new(&CanvasConfig::titled(), &ModeOverrides::default()).unwrap();
        let text = constraint_prompt(catalog.entry(LayoutMode::Full));
        assert!(text.contains("y 50..170 px is reserved for the title"));
        assert!(text.contains("y 970..1030 px is reserved for the footer"));
        assert!(text.contains("x 50..1870 px, y 170..970 px"));
    }
}
