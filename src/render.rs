use crate::scene_dump::{NodeDump, RectDump, SceneDump};
use crate::theme::Theme;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Diagnostic SVG of a projected scene: pane outlines, the usable area,
/// links, nodes and predicted collisions. No text layout is attempted;
/// labels are drawn on a single centered line.
pub fn render_preview_svg(dump: &SceneDump, theme: &Theme) -> String {
    let view = ViewTransform::new(dump);
    let width = dump.canvas_width;
    let height = dump.canvas_height;
    let stroke = width / 960.0;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    for (idx, pane) in dump.panes.iter().enumerate() {
        let (x, y, w, h) = view.rect(pane);
        let dash = if idx == dump.primary_pane {
            String::new()
        } else {
            format!(" stroke-dasharray=\"{:.3} {:.3}\"", stroke * 6.0, stroke * 4.0)
        };
        svg.push_str(&format!(
            "<rect x=\"{x:.3}\" y=\"{y:.3}\" width=\"{w:.3}\" height=\"{h:.3}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.3}\"{dash}/>",
            theme.bounds_color,
            stroke * 1.5
        ));
    }

    // Reserved title/footer strips, shaded so stray nodes stand out.
    for zone in dump.title_zone.iter().chain(&dump.footer_zone) {
        let (x, y, w, h) = view.rect(zone);
        svg.push_str(&format!(
            "<rect class=\"reserved\" x=\"{x:.3}\" y=\"{y:.3}\" width=\"{w:.3}\" height=\"{h:.3}\" fill=\"{}\" fill-opacity=\"0.08\"/>",
            theme.bounds_color
        ));
    }

    for link in &dump.links {
        let d = points_to_path(&link.points, &view);
        svg.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.3}\"/>",
            theme.link_color,
            stroke * 2.0
        ));
    }

    let nodes: HashMap<&str, &NodeDump> = dump.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    for hit in &dump.collisions {
        let (Some(a), Some(b)) = (nodes.get(hit.a.as_str()), nodes.get(hit.b.as_str())) else {
            continue;
        };
        let (x1, y1) = view.point(a.x, a.y);
        let (x2, y2) = view.point(b.x, b.y);
        let dash = if hit.blocking {
            String::new()
        } else {
            format!(" stroke-dasharray=\"{:.3} {:.3}\"", stroke * 3.0, stroke * 3.0)
        };
        svg.push_str(&format!(
            "<line x1=\"{x1:.3}\" y1=\"{y1:.3}\" x2=\"{x2:.3}\" y2=\"{y2:.3}\" stroke=\"{}\" stroke-width=\"{:.3}\"{dash}/>",
            theme.collision_color,
            stroke * 3.0
        ));
    }

    let colliding: Vec<&str> = dump
        .collisions
        .iter()
        .flat_map(|hit| [hit.a.as_str(), hit.b.as_str()])
        .collect();
    for node in &dump.nodes {
        let (cx, cy) = view.point(node.x, node.y);
        let outline = if colliding.contains(&node.id.as_str()) {
            theme.collision_color.as_str()
        } else {
            theme.node_stroke.as_str()
        };
        svg.push_str(&format!(
            "<circle cx=\"{cx:.3}\" cy=\"{cy:.3}\" r=\"{:.3}\" fill=\"{}\" fill-opacity=\"0.85\" stroke=\"{outline}\" stroke-width=\"{:.3}\"/>",
            node.size / 2.0,
            node.color,
            stroke * 2.0
        ));
        let label_y = cy + node.size / 2.0 + dump.font_size;
        svg.push_str(&format!(
            "<text x=\"{cx:.3}\" y=\"{label_y:.3}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{:.3}\" fill=\"{}\">{}</text>",
            escape_xml(&theme.font_family),
            dump.font_size,
            theme.text_color,
            escape_xml(&node.label)
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Maps scene coordinates onto the SVG viewport (origin top-left, y down).
/// System U scenes are centered with y up, so they are shifted and flipped.
struct ViewTransform {
    y_up: bool,
    half_w: f64,
    half_h: f64,
}

impl ViewTransform {
    fn new(dump: &SceneDump) -> Self {
        Self {
            y_up: dump.y_up,
            half_w: dump.canvas_width / 2.0,
            half_h: dump.canvas_height / 2.0,
        }
    }

    fn point(&self, x: f64, y: f64) -> (f64, f64) {
        if self.y_up {
            (x + self.half_w, self.half_h - y)
        } else {
            (x, y)
        }
    }

    fn rect(&self, rect: &RectDump) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.point(rect.left, rect.top);
        let (x1, y1) = self.point(rect.right, rect.bottom);
        (x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
    }
}

fn points_to_path(points: &[[f64; 2]], view: &ViewTransform) -> String {
    let mut d = String::new();
    for (idx, [x, y]) in points.iter().enumerate() {
        let (x, y) = view.point(*x, *y);
        let cmd = if idx == 0 { "M" } else { " L" };
        d.push_str(&format!("{cmd} {x:.3} {y:.3}"));
    }
    d
}

pub fn write_preview_svg(svg: &str, output: &Path) -> Result<()> {
    std::fs::write(output, svg)
        .with_context(|| format!("writing preview {}", output.display()))?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
