use crate::catalog::CatalogEntry;
use crate::config::CollisionConfig;
use crate::coords::{CoordinateMapper, PixelPoint, PixelSystem, SafeBounds};
use crate::ir::Descriptor;
use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

const GOLDEN_ANGLE: f64 = PI * (3.0 - 2.236_067_977_499_79);
const MIN_DISTANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    pub a: String,
    pub b: String,
    pub distance: f64,
    /// Center distance the pair needs: both radii plus the mode's spacing.
    pub required: f64,
    /// Depth of the disc overlap divided by the smaller node's size.
    pub overlap_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Position came from the descriptor rather than the simulation.
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionReport {
    pub collisions: Vec<Collision>,
    /// Final System P positions, in descriptor order.
    pub positions: Vec<SettledNode>,
    pub simulated: bool,
}

/// Predicts overlap without rendering. Nodes with explicit positions are
/// checked where they are; the rest are placed by a short, deterministic
/// force relaxation that approximates the renderer's own layout.
pub fn simulate_collisions(
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &CollisionConfig,
) -> CollisionReport {
    let simulated = !descriptor.nodes.is_empty() && !descriptor.all_positioned();
    let positions = settle_positions(descriptor, entry, config);
    let collisions = find_collisions(&positions, entry.limits.min_spacing);
    tracing::debug!(
        mode = %entry.mode,
        nodes = positions.len(),
        simulated,
        collisions = collisions.len(),
        "collision simulation finished"
    );
    CollisionReport {
        collisions,
        positions,
        simulated,
    }
}

pub fn find_collisions(nodes: &[SettledNode], min_spacing: f64) -> Vec<Collision> {
    let mut out = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let a = &nodes[i];
            let b = &nodes[j];
            let distance = (a.x - b.x).hypot(a.y - b.y);
            let radii = a.size / 2.0 + b.size / 2.0;
            let required = radii + min_spacing;
            if distance >= required {
                continue;
            }
            let depth = (radii - distance).max(0.0);
            let smaller = a.size.min(b.size);
            let overlap_ratio = if smaller > 0.0 {
                depth / smaller
            } else if depth > 0.0 {
                1.0
            } else {
                0.0
            };
            out.push(Collision {
                a: a.id.clone(),
                b: b.id.clone(),
                distance,
                required,
                overlap_ratio,
            });
        }
    }
    out
}

pub fn settle_positions(
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &CollisionConfig,
) -> Vec<SettledNode> {
    let bounds: SafeBounds<PixelSystem> = CoordinateMapper::for_entry(entry).bounds_for(entry);
    let mut nodes = initial_layout(descriptor, &bounds, config);
    if nodes.iter().all(|node| node.pinned) {
        return nodes;
    }
    relax(&mut nodes, descriptor, &bounds, entry.limits.min_spacing, config);
    nodes
}

/// Free nodes go on a circle around the pane center, starting at the top and
/// walking clockwise in descriptor order.
fn initial_layout(
    descriptor: &Descriptor,
    bounds: &SafeBounds<PixelSystem>,
    config: &CollisionConfig,
) -> Vec<SettledNode> {
    let center = bounds.center();
    let radius = bounds.width().min(bounds.height()) * config.initial_radius_fraction;
    let free_count = descriptor
        .nodes
        .iter()
        .filter(|node| node.position.is_none())
        .count();
    let mut free_index = 0usize;
    descriptor
        .nodes
        .iter()
        .map(|node| {
            if let Some(pos) = node.position {
                return SettledNode {
                    id: node.id.clone(),
                    x: pos.x,
                    y: pos.y,
                    size: node.size,
                    pinned: true,
                };
            }
            let (x, y) = if free_count == 1 {
                (center.x, center.y)
            } else {
                let angle = -PI / 2.0 + TAU * free_index as f64 / free_count as f64;
                (center.x + radius * angle.cos(), center.y + radius * angle.sin())
            };
            free_index += 1;
            SettledNode {
                id: node.id.clone(),
                x,
                y,
                size: node.size,
                pinned: false,
            }
        })
        .collect()
}

fn relax(
    nodes: &mut [SettledNode],
    descriptor: &Descriptor,
    bounds: &SafeBounds<PixelSystem>,
    min_spacing: f64,
    config: &CollisionConfig,
) {
    let n = nodes.len();
    let index: HashMap<&str, usize> = descriptor
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();
    let edges: Vec<(usize, usize)> = descriptor
        .links
        .iter()
        .filter_map(|link| {
            let s = *index.get(link.source.as_str())?;
            let t = *index.get(link.target.as_str())?;
            (s != t).then_some((s, t))
        })
        .collect();

    let ideal = config.ideal_link_fraction * (bounds.width() * bounds.height() / n as f64).sqrt();
    let repulsion = ideal.powi(3);
    let mut temperature = bounds.width().min(bounds.height()) / 10.0;

    for _ in 0..config.iterations {
        let mut forces = vec![(0.0f64, 0.0f64); n];

        // Repulsion between all pairs, inverse square.
        for i in 0..n {
            for j in (i + 1)..n {
                let (ux, uy, dist) = direction(&nodes[i], &nodes[j], i, j);
                let d = dist.max(MIN_DISTANCE);
                let force = repulsion / (d * d);
                forces[i].0 -= ux * force;
                forces[i].1 -= uy * force;
                forces[j].0 += ux * force;
                forces[j].1 += uy * force;
            }
        }

        // Springs along links toward a rest length both nodes fit in.
        for &(s, t) in &edges {
            let (ux, uy, dist) = direction(&nodes[s], &nodes[t], s, t);
            let rest = ideal.max(nodes[s].size / 2.0 + nodes[t].size / 2.0 + min_spacing);
            let force = dist - rest;
            forces[s].0 += ux * force;
            forces[s].1 += uy * force;
            forces[t].0 -= ux * force;
            forces[t].1 -= uy * force;
        }

        for (node, (fx, fy)) in nodes.iter_mut().zip(forces) {
            if node.pinned {
                continue;
            }
            let mut dx = fx * config.step_fraction;
            let mut dy = fy * config.step_fraction;
            let len = dx.hypot(dy);
            if len > temperature && len > 0.0 {
                dx *= temperature / len;
                dy *= temperature / len;
            }
            let moved = bounds.clamp_disc(&PixelPoint::new(node.x + dx, node.y + dy), node.size / 2.0);
            node.x = moved.x;
            node.y = moved.y;
        }
        temperature *= config.damping;
    }
}

/// Unit vector from `a` to `b` and their distance. Coincident nodes get a
/// direction derived from their indices so the result stays reproducible.
fn direction(a: &SettledNode, b: &SettledNode, i: usize, j: usize) -> (f64, f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dist = dx.hypot(dy);
    if dist > 1e-9 {
        return (dx / dist, dy / dist, dist);
    }
    let angle = GOLDEN_ANGLE * (i + j + 1) as f64;
    (angle.cos(), angle.sin(), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LayoutCatalog, LayoutMode};
    use crate::ir::Position;

    fn entry(mode: LayoutMode) -> &'static CatalogEntry {
        LayoutCatalog::standard().entry(mode)
    }

    #[test]
    fn identical_positions_always_collide() {
        let mut desc = Descriptor::new();
        desc.push_node("a", "A", 30.0).position = Some(Position::new(400.0, 400.0));
        desc.push_node("b", "B", 50.0).position = Some(Position::new(400.0, 400.0));
        let report = simulate_collisions(&desc, entry(LayoutMode::Full), &CollisionConfig::default());
        assert!(!report.simulated);
        assert_eq!(report.collisions.len(), 1);
        let hit = &report.collisions[0];
        assert_eq!((hit.a.as_str(), hit.b.as_str()), ("a", "b"));
        assert!(hit.overlap_ratio >= 1.0);
    }

    #[test]
    fn explicit_positions_respect_min_spacing() {
        let spacing = entry(LayoutMode::Full).limits.min_spacing;
        let mut desc = Descriptor::new();
        desc.push_node("a", "A", 40.0).position = Some(Position::new(500.0, 500.0));
        // Edges 10px apart: touching is fine, closer than minSpacing is not.
        desc.push_node("b", "B", 40.0).position = Some(Position::new(550.0, 500.0));
        let report = simulate_collisions(&desc, entry(LayoutMode::Full), &CollisionConfig::default());
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].overlap_ratio, 0.0);
        assert!((report.collisions[0].required - (40.0 + spacing)).abs() < 1e-9);

        desc.nodes[1].position = Some(Position::new(500.0 + 40.0 + spacing, 500.0));
        let report = simulate_collisions(&desc, entry(LayoutMode::Full), &CollisionConfig::default());
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn relaxation_is_deterministic() {
        let mut desc = Descriptor::new();
        for i in 0..8 {
            desc.push_node(&format!("n{i}"), "node", 60.0);
        }
        for i in 0..7 {
            desc.push_link(&format!("n{i}"), &format!("n{}", i + 1));
        }
        let config = CollisionConfig::default();
        let first = simulate_collisions(&desc, entry(LayoutMode::Full), &config);
        let second = simulate_collisions(&desc, entry(LayoutMode::Full), &config);
        assert!(first.simulated);
        assert_eq!(first, second);
    }

    #[test]
    fn settled_nodes_stay_inside_safe_bounds() {
        let e = entry(LayoutMode::Grid);
        let bounds: SafeBounds<PixelSystem> = CoordinateMapper::for_entry(e).bounds_for(e);
        let mut desc = Descriptor::new();
        for i in 0..3 {
            desc.push_node(&format!("n{i}"), "node", 80.0);
        }
        let report = simulate_collisions(&desc, e, &CollisionConfig::default());
        for node in &report.positions {
            assert!(bounds.contains_disc(&PixelPoint::new(node.x, node.y), node.size / 2.0 - 1e-9));
        }
        assert!(report.collisions.is_empty(), "{:?}", report.collisions);
    }

    #[test]
    fn small_chain_in_split_pane_settles_apart() {
        let mut desc = Descriptor::new();
        for i in 0..6 {
            desc.push_node(&format!("n{i}"), "node", 40.0);
        }
        for i in 0..5 {
            desc.push_link(&format!("n{i}"), &format!("n{}", i + 1));
        }
        let report = simulate_collisions(&desc, entry(LayoutMode::Split), &CollisionConfig::default());
        assert!(report.collisions.is_empty(), "{:?}", report.collisions);
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let mut desc = Descriptor::new();
        desc.push_node("fixed", "F", 40.0).position = Some(Position::new(1200.0, 300.0));
        desc.push_node("free", "G", 40.0);
        desc.push_link("fixed", "free");
        let report = simulate_collisions(&desc, entry(LayoutMode::Split), &CollisionConfig::default());
        assert!(report.simulated);
        let fixed = &report.positions[0];
        assert!(fixed.pinned);
        assert_eq!((fixed.x, fixed.y), (1200.0, 300.0));
    }

    #[test]
    fn empty_descriptor_has_nothing_to_report() {
        let report = simulate_collisions(
            &Descriptor::new(),
            entry(LayoutMode::Full),
            &CollisionConfig::default(),
        );
        assert!(report.positions.is_empty());
        assert!(report.collisions.is_empty());
        assert!(!report.simulated);
    }
}
