use crate::catalog::CatalogEntry;
use crate::collision::simulate_collisions;
use crate::config::EngineConfig;
use crate::coords::{CoordinateMapper, PixelPoint, PixelSystem, SafeBounds};
use crate::error::EngineResult;
use crate::ir::{Descriptor, Link};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationKind {
    TooManyNodes,
    LabelTooLong,
    NodeSizeOutOfRange,
    DanglingLink,
    OutOfBounds,
    PredictedCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintViolation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl ConstraintViolation {
    fn error(kind: ViolationKind, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message,
            nodes: Vec::new(),
            link: None,
        }
    }

    fn warning(kind: ViolationKind, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    fn with_nodes(mut self, nodes: &[&str]) -> Self {
        self.nodes = nodes.iter().map(|id| id.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ConstraintViolation>,
    pub warnings: Vec<ConstraintViolation>,
    pub auto_fixed: bool,
}

impl ValidationResult {
    fn push(&mut self, violation: ConstraintViolation) {
        match violation.severity {
            Severity::Error => self.errors.push(violation),
            Severity::Warning => self.warnings.push(violation),
        }
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }

    pub fn violations(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations().any(|v| v.kind == kind)
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations().filter(|v| v.kind == kind).count()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            auto_fixed: false,
        }
    }
}

/// Checks a descriptor against its mode's limits. Cheap structural checks run
/// first; the collision simulation is skipped when the node count is already
/// over the limit so its cost stays bounded.
///
/// Returns `Err` only for input that is not well-formed (duplicate ids,
/// non-finite numbers). Constraint problems are reported in the result.
#[tracing::instrument(skip_all, fields(mode = %entry.mode, nodes = descriptor.nodes.len()))]
pub fn validate(
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &EngineConfig,
) -> EngineResult<ValidationResult> {
    descriptor.check_well_formed()?;
    let limits = &entry.limits;
    let mut result = ValidationResult::default();

    let too_many = descriptor.nodes.len() > limits.max_nodes;
    if too_many {
        result.push(ConstraintViolation::error(
            ViolationKind::TooManyNodes,
            format!(
                "descriptor has {} nodes; {} allows at most {}",
                descriptor.nodes.len(),
                entry.mode,
                limits.max_nodes
            ),
        ));
    }

    for node in &descriptor.nodes {
        let chars = node.label.chars().count();
        if chars > limits.max_label_chars {
            result.push(
                ConstraintViolation::error(
                    ViolationKind::LabelTooLong,
                    format!(
                        "label of {:?} has {} characters; limit is {}",
                        node.id, chars, limits.max_label_chars
                    ),
                )
                .with_nodes(&[&node.id]),
            );
        }
    }

    let range = limits.node_size_range;
    for node in &descriptor.nodes {
        if !range.contains(node.size) {
            result.push(
                ConstraintViolation::error(
                    ViolationKind::NodeSizeOutOfRange,
                    format!(
                        "size of {:?} is {}; allowed range is [{}, {}]",
                        node.id, node.size, range.min, range.max
                    ),
                )
                .with_nodes(&[&node.id]),
            );
        }
    }

    for link in descriptor.dangling_links() {
        let mut violation = ConstraintViolation::warning(
            ViolationKind::DanglingLink,
            format!(
                "link {:?} -> {:?} references a missing node",
                link.source, link.target
            ),
        );
        violation.link = Some(link.clone());
        result.push(violation);
    }

    let bounds: SafeBounds<PixelSystem> = CoordinateMapper::for_entry(entry).bounds_for(entry);
    for node in &descriptor.nodes {
        let Some(pos) = node.position else {
            continue;
        };
        let radius = node.size.max(0.0) / 2.0;
        if !bounds.contains_disc(&PixelPoint::new(pos.x, pos.y), radius) {
            result.push(
                ConstraintViolation::error(
                    ViolationKind::OutOfBounds,
                    format!(
                        "{:?} at ({:.1}, {:.1}) with size {} leaves the safe area x {:.1}..{:.1}, y {:.1}..{:.1}",
                        node.id,
                        pos.x,
                        pos.y,
                        node.size,
                        bounds.left,
                        bounds.right,
                        bounds.top,
                        bounds.bottom
                    ),
                )
                .with_nodes(&[&node.id]),
            );
        }
    }

    if too_many {
        tracing::debug!("skipping collision simulation for oversized descriptor");
    } else {
        let report = simulate_collisions(descriptor, entry, &config.collision);
        for hit in report.collisions {
            let message = format!(
                "{:?} and {:?} are predicted {:.1} apart; they need {:.1}",
                hit.a, hit.b, hit.distance, hit.required
            );
            let violation = if hit.overlap_ratio >= config.collision.severity_threshold {
                ConstraintViolation::error(ViolationKind::PredictedCollision, message)
            } else {
                ConstraintViolation::warning(ViolationKind::PredictedCollision, message)
            };
            result.push(violation.with_nodes(&[&hit.a, &hit.b]));
        }
    }

    let result = result.finish();
    tracing::debug!(
        valid = result.valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validation finished"
    );
    Ok(result)
}
