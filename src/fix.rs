use crate::catalog::CatalogEntry;
use crate::config::EngineConfig;
use crate::coords::{CoordinateMapper, PixelPoint, PixelSystem, SafeBounds};
use crate::error::EngineResult;
use crate::ir::{Descriptor, Position};
use crate::validate::{ValidationResult, ViolationKind, validate};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Orders nodes by how much of the diagram's meaning they carry. The node
/// reduction step keeps the first `maxNodes` indices it returns.
pub trait NodeRanking {
    fn name(&self) -> &'static str;

    /// Indices into `descriptor.nodes`, most important first. Must be a
    /// permutation and must not depend on anything but the descriptor.
    fn rank(&self, descriptor: &Descriptor) -> Vec<usize>;
}

/// Nodes with more incident links first; ties keep descriptor order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeRanking;

impl NodeRanking for DegreeRanking {
    fn name(&self) -> &'static str {
        "degree"
    }

    fn rank(&self, descriptor: &Descriptor) -> Vec<usize> {
        let degrees: Vec<usize> = descriptor
            .nodes
            .iter()
            .map(|node| {
                descriptor
                    .links
                    .iter()
                    .filter(|link| link.touches(&node.id))
                    .count()
            })
            .collect();
        let mut order: Vec<usize> = (0..descriptor.nodes.len()).collect();
        order.sort_by_key(|&idx| (Reverse(degrees[idx]), idx));
        order
    }
}

/// Keeps the first nodes the generator emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionOrderRanking;

impl NodeRanking for InsertionOrderRanking {
    fn name(&self) -> &'static str {
        "insertion-order"
    }

    fn rank(&self, descriptor: &Descriptor) -> Vec<usize> {
        (0..descriptor.nodes.len()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Repair {
    TruncatedLabel {
        node: String,
        from: String,
        to: String,
    },
    ClampedSize {
        node: String,
        from: f64,
        to: f64,
    },
    DroppedNode {
        node: String,
    },
    DroppedLink {
        source: String,
        target: String,
    },
    ClampedPosition {
        node: String,
        from: Position,
        to: Position,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    pub descriptor: Descriptor,
    /// Validation of `descriptor` after the last pass.
    pub report: ValidationResult,
    pub passes: usize,
    pub repairs: Vec<Repair>,
}

pub fn auto_fix(
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &EngineConfig,
) -> EngineResult<FixOutcome> {
    auto_fix_with(descriptor, entry, config, &DegreeRanking)
}

/// Repairs what the validator flagged, re-validating after each pass, for
/// at most `config.fix.max_passes` passes. A descriptor that is valid and
/// has no dangling links comes back unchanged with `passes == 0`.
///
/// When the budget runs out the best-effort descriptor is still returned;
/// callers must check `report.valid` before rendering it.
#[tracing::instrument(
    skip_all,
    fields(mode = %entry.mode, ranking = ranking.name(), nodes = descriptor.nodes.len())
)]
pub fn auto_fix_with(
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &EngineConfig,
    ranking: &dyn NodeRanking,
) -> EngineResult<FixOutcome> {
    let mut report = validate(descriptor, entry, config)?;
    if is_clean(&report) {
        return Ok(FixOutcome {
            descriptor: descriptor.clone(),
            report,
            passes: 0,
            repairs: Vec::new(),
        });
    }

    let budget = config.fix.max_passes.max(1);
    let mut current = descriptor.clone();
    let mut repairs = Vec::new();
    let mut passes = 0;
    while passes < budget {
        passes += 1;
        let applied = repair_pass(&mut current, &report, entry, config, ranking);
        let progressed = !applied.is_empty();
        repairs.extend(applied);
        report = validate(&current, entry, config)?;
        if is_clean(&report) || !progressed {
            break;
        }
    }

    report.auto_fixed = current != *descriptor;
    if report.valid {
        tracing::info!(passes, repairs = repairs.len(), "descriptor repaired");
    } else {
        tracing::warn!(
            passes,
            repairs = repairs.len(),
            errors = report.errors.len(),
            "descriptor still invalid after auto-fix"
        );
    }
    Ok(FixOutcome {
        descriptor: current,
        report,
        passes,
        repairs,
    })
}

fn is_clean(report: &ValidationResult) -> bool {
    report.valid && !report.has(ViolationKind::DanglingLink)
}

fn repair_pass(
    desc: &mut Descriptor,
    report: &ValidationResult,
    entry: &CatalogEntry,
    config: &EngineConfig,
    ranking: &dyn NodeRanking,
) -> Vec<Repair> {
    let limits = &entry.limits;
    let mut repairs = Vec::new();

    if report.has(ViolationKind::LabelTooLong) {
        for node in &mut desc.nodes {
            let fixed = truncate_label(&node.label, limits.max_label_chars, &config.fix.ellipsis);
            if fixed != node.label {
                let from = std::mem::replace(&mut node.label, fixed);
                repairs.push(Repair::TruncatedLabel {
                    node: node.id.clone(),
                    from,
                    to: node.label.clone(),
                });
            }
        }
    }

    if report.has(ViolationKind::NodeSizeOutOfRange) {
        for node in &mut desc.nodes {
            let clamped = limits.node_size_range.clamp(node.size);
            if clamped != node.size {
                repairs.push(Repair::ClampedSize {
                    node: node.id.clone(),
                    from: node.size,
                    to: clamped,
                });
                node.size = clamped;
            }
        }
    }

    let reduced = report.has(ViolationKind::TooManyNodes) && desc.nodes.len() > limits.max_nodes;
    if reduced {
        let keep: HashSet<usize> = ranking
            .rank(desc)
            .into_iter()
            .take(limits.max_nodes)
            .collect();
        let mut idx = 0;
        desc.nodes.retain(|node| {
            let kept = keep.contains(&idx);
            idx += 1;
            if !kept {
                repairs.push(Repair::DroppedNode {
                    node: node.id.clone(),
                });
            }
            kept
        });
    }

    if reduced || report.has(ViolationKind::DanglingLink) {
        let ids: HashSet<String> = desc.nodes.iter().map(|node| node.id.clone()).collect();
        desc.links.retain(|link| {
            let kept = ids.contains(&link.source) && ids.contains(&link.target);
            if !kept {
                repairs.push(Repair::DroppedLink {
                    source: link.source.clone(),
                    target: link.target.clone(),
                });
            }
            kept
        });
    }

    if report.has(ViolationKind::OutOfBounds) {
        let bounds: SafeBounds<PixelSystem> =
            CoordinateMapper::for_entry(entry).bounds_for(entry);
        for node in &mut desc.nodes {
            let Some(pos) = node.position else {
                continue;
            };
            let radius = node.size.max(0.0) / 2.0;
            let point = PixelPoint::new(pos.x, pos.y);
            if bounds.contains_disc(&point, radius) {
                continue;
            }
            let moved = bounds.clamp_disc(&point, radius);
            let to = Position::new(moved.x, moved.y);
            repairs.push(Repair::ClampedPosition {
                node: node.id.clone(),
                from: pos,
                to,
            });
            node.position = Some(to);
        }
    }

    tracing::debug!(repairs = repairs.len(), "repair pass finished");
    repairs
}

/// Shortens `label` to at most `max_chars` characters, ending in `ellipsis`.
/// Prefers to cut at a word boundary so the leading words survive intact.
pub fn truncate_label(label: &str, max_chars: usize, ellipsis: &str) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_chars {
        return label.to_string();
    }
    let marker_len = ellipsis.chars().count();
    if max_chars <= marker_len {
        return ellipsis.chars().take(max_chars).collect();
    }
    let keep = max_chars - marker_len;
    let prefix = &chars[..keep];
    let cut = if chars[keep].is_whitespace() {
        keep
    } else {
        match prefix.iter().rposition(|c| c.is_whitespace()) {
            Some(space) if prefix[..space].iter().any(|c| !c.is_whitespace()) => space,
            _ => keep,
        }
    };
    let head: String = prefix[..cut].iter().collect();
    format!("{}{}", head.trim_end(), ellipsis)
}
