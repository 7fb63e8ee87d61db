use crate::catalog::CatalogEntry;
use crate::collision::simulate_collisions;
use crate::config::EngineConfig;
use crate::coords::{CoordinateMapper, CoordinateSystem, PixelPoint, PixelSystem, SafeBounds, SystemKind};
use crate::error::EngineResult;
use crate::ir::Descriptor;
use crate::theme::Theme;
use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// A descriptor placed on the canvas in one coordinate system, ready for a
/// renderer adapter to draw without doing any layout of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDump {
    pub mode: String,
    pub system: SystemKind,
    pub y_up: bool,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub bounds: RectDump,
    pub panes: Vec<RectDump>,
    pub primary_pane: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_zone: Option<RectDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_zone: Option<RectDump>,
    pub font_size: f64,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
    pub collisions: Vec<CollisionDump>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectDump {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    /// Position came from the descriptor rather than the simulation.
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDump {
    pub source: String,
    pub target: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionDump {
    pub a: String,
    pub b: String,
    pub overlap_ratio: f64,
    pub blocking: bool,
}

impl<S: CoordinateSystem> From<SafeBounds<S>> for RectDump {
    fn from(bounds: SafeBounds<S>) -> Self {
        Self {
            left: bounds.left,
            right: bounds.right,
            top: bounds.top,
            bottom: bounds.bottom,
        }
    }
}

/// Projects `descriptor` into system `S`. Unpositioned nodes take the
/// collision simulator's settled positions, so the dump shows exactly the
/// geometry validation reasoned about. Links with a missing endpoint are left
/// out. Fails on the same malformed input `validate` rejects.
pub fn project_scene<S: CoordinateSystem>(
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &EngineConfig,
    theme: &Theme,
) -> EngineResult<SceneDump> {
    descriptor.check_well_formed()?;
    let mapper = CoordinateMapper::for_entry(entry);
    let report = simulate_collisions(descriptor, entry, &config.collision);
    let length = |px: f64| mapper.convert_length::<PixelSystem, S>(px);

    let nodes: Vec<NodeDump> = report
        .positions
        .iter()
        .zip(&descriptor.nodes)
        .enumerate()
        .map(|(idx, (settled, node))| {
            let point = mapper.convert::<PixelSystem, S>(PixelPoint::new(settled.x, settled.y));
            NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                x: point.x,
                y: point.y,
                size: length(node.size),
                color: theme.node_color(idx).to_string(),
                pinned: settled.pinned,
            }
        })
        .collect();

    let centers: HashMap<&str, [f64; 2]> = nodes
        .iter()
        .map(|node| (node.id.as_str(), [node.x, node.y]))
        .collect();
    let links = descriptor
        .links
        .iter()
        .filter_map(|link| {
            let from = centers.get(link.source.as_str())?;
            let to = centers.get(link.target.as_str())?;
            Some(LinkDump {
                source: link.source.clone(),
                target: link.target.clone(),
                points: vec![*from, *to],
            })
        })
        .collect();

    let collisions = report
        .collisions
        .iter()
        .map(|hit| CollisionDump {
            a: hit.a.clone(),
            b: hit.b.clone(),
            overlap_ratio: hit.overlap_ratio,
            blocking: hit.overlap_ratio >= config.collision.severity_threshold,
        })
        .collect();

    let panes = (0..entry.panes.len())
        .filter_map(|idx| mapper.pane_bounds::<S>(entry, idx))
        .map(RectDump::from)
        .collect();

    let zone = |rect| RectDump::from(mapper.from_norm_rect::<S>(rect));
    Ok(SceneDump {
        mode: entry.mode.to_string(),
        system: S::KIND,
        y_up: S::Y_UP,
        canvas_width: length(entry.canvas.width),
        canvas_height: length(entry.canvas.height),
        bounds: mapper.bounds_for::<S>(entry).into(),
        panes,
        primary_pane: entry.primary_pane,
        title_zone: entry.title_zone.map(zone),
        footer_zone: entry.footer_zone.map(zone),
        font_size: length(theme.font_size),
        nodes,
        links,
        collisions,
    })
}

pub fn write_scene_dump(path: &Path, dump: &SceneDump) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating scene dump {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)
        .with_context(|| format!("writing scene dump {}", path.display()))?;
    Ok(())
}
