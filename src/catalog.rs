use crate::config::{CanvasConfig, LimitOverride, ModeOverrides};
use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

static STANDARD_CATALOG: Lazy<LayoutCatalog> = Lazy::new(|| {
    LayoutCatalog::new(&CanvasConfig::default(), &ModeOverrides::default())
        .expect("built-in catalog constants are valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutMode {
    Full,
    Split,
    StepByStep,
    Grid,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 4] = [
        LayoutMode::Full,
        LayoutMode::Split,
        LayoutMode::StepByStep,
        LayoutMode::Grid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Split => "split",
            Self::StepByStep => "stepByStep",
            Self::Grid => "grid",
        }
    }
}

impl FromStr for LayoutMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full" => Ok(Self::Full),
            "split" => Ok(Self::Split),
            "stepByStep" | "step_by_step" | "step-by-step" => Ok(Self::StepByStep),
            "grid" => Ok(Self::Grid),
            other => Err(EngineError::UnknownLayoutMode(other.to_string())),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

impl SizeRange {
    pub fn contains(&self, size: f64) -> bool {
        size >= self.min && size <= self.max
    }

    pub fn clamp(&self, size: f64) -> f64 {
        size.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeLimits {
    pub max_nodes: usize,
    pub max_label_chars: usize,
    pub node_size_range: SizeRange,
    pub min_spacing: f64,
}

impl ModeLimits {
    fn with_override(mut self, patch: &LimitOverride) -> Self {
        if let Some(v) = patch.max_nodes {
            self.max_nodes = v;
        }
        if let Some(v) = patch.max_label_chars {
            self.max_label_chars = v;
        }
        if let Some(v) = patch.min_size {
            self.node_size_range.min = v;
        }
        if let Some(v) = patch.max_size {
            self.node_size_range.max = v;
        }
        if let Some(v) = patch.min_spacing {
            self.min_spacing = v;
        }
        self
    }
}

/// Rectangle in normalized canvas space: fractions of width/height, origin
/// top-left, y down. Both concrete coordinate systems are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl NormRect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PaneGrid {
    rows: usize,
    cols: usize,
    gap: f64,
    primary: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub mode: LayoutMode,
    pub limits: ModeLimits,
    pub canvas: CanvasConfig,
    /// All panes of the mode, row-major.
    pub panes: Vec<NormRect>,
    /// Index into `panes` of the pane the descriptor is drawn in.
    pub primary_pane: usize,
    /// Reserved title strip above the panes, when the canvas has one.
    pub title_zone: Option<NormRect>,
    /// Reserved footer strip below the panes, when the canvas has one.
    pub footer_zone: Option<NormRect>,
}

impl CatalogEntry {
    pub fn safe_area(&self) -> NormRect {
        self.panes[self.primary_pane]
    }
}

#[derive(Debug, Clone)]
pub struct LayoutCatalog {
    entries: BTreeMap<LayoutMode, CatalogEntry>,
}

impl LayoutCatalog {
    pub fn new(canvas: &CanvasConfig, overrides: &ModeOverrides) -> EngineResult<Self> {
        check_canvas(canvas)?;
        let (title_zone, footer_zone) = reserved_zones(canvas);
        let mut entries = BTreeMap::new();
        for mode in LayoutMode::ALL {
            let mut limits = default_limits(mode);
            if let Some(patch) = overrides.get(&mode) {
                limits = limits.with_override(patch);
            }
            let grid = pane_grid(mode, canvas);
            let panes = build_panes(canvas, grid)?;
            check_limits(mode, &limits, canvas, &panes[grid.primary])?;
            entries.insert(
                mode,
                CatalogEntry {
                    mode,
                    limits,
                    canvas: *canvas,
                    panes,
                    primary_pane: grid.primary,
                    title_zone,
                    footer_zone,
                },
            );
        }
        Ok(Self { entries })
    }

    /// Catalog for the default 1920x1080 canvas, built once.
    pub fn standard() -> &'static LayoutCatalog {
        &STANDARD_CATALOG
    }

    pub fn entry(&self, mode: LayoutMode) -> &CatalogEntry {
        // Every mode is inserted by `new`.
        &self.entries[&mode]
    }

    pub fn lookup(&self, name: &str) -> EngineResult<&CatalogEntry> {
        let mode = name.parse::<LayoutMode>()?;
        Ok(self.entry(mode))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

fn default_limits(mode: LayoutMode) -> ModeLimits {
    let (max_nodes, max_label_chars, min, max, min_spacing) = match mode {
        LayoutMode::Full => (10, 24, 24.0, 160.0, 40.0),
        LayoutMode::Split => (6, 20, 24.0, 120.0, 20.0),
        LayoutMode::StepByStep => (5, 20, 20.0, 100.0, 15.0),
        LayoutMode::Grid => (3, 16, 16.0, 80.0, 20.0),
    };
    ModeLimits {
        max_nodes,
        max_label_chars,
        node_size_range: SizeRange { min, max },
        min_spacing,
    }
}

fn pane_grid(mode: LayoutMode, canvas: &CanvasConfig) -> PaneGrid {
    match mode {
        LayoutMode::Full => PaneGrid {
            rows: 1,
            cols: 1,
            gap: 0.0,
            primary: 0,
        },
        // Companion content on the left, visualization on the right.
        LayoutMode::Split => PaneGrid {
            rows: 1,
            cols: 2,
            gap: canvas.group_gap,
            primary: 1,
        },
        LayoutMode::StepByStep => PaneGrid {
            rows: canvas.steps.max(1),
            cols: 1,
            gap: canvas.step_gap,
            primary: 0,
        },
        LayoutMode::Grid => PaneGrid {
            rows: canvas.grid_rows.max(1),
            cols: canvas.grid_cols.max(1),
            gap: canvas.group_gap,
            primary: 0,
        },
    }
}

/// Title and footer strips sit inside the outer padding, spanning the
/// padded width.
fn reserved_zones(canvas: &CanvasConfig) -> (Option<NormRect>, Option<NormRect>) {
    let strip = |top: f64, bottom: f64| NormRect {
        left: canvas.outer_padding / canvas.width,
        top: top / canvas.height,
        right: (canvas.width - canvas.outer_padding) / canvas.width,
        bottom: bottom / canvas.height,
    };
    let title = (canvas.title_height > 0.0).then(|| {
        strip(
            canvas.outer_padding,
            canvas.outer_padding + canvas.title_height,
        )
    });
    let footer = (canvas.footer_height > 0.0).then(|| {
        strip(
            canvas.height - canvas.outer_padding - canvas.footer_height,
            canvas.height - canvas.outer_padding,
        )
    });
    (title, footer)
}

fn build_panes(canvas: &CanvasConfig, grid: PaneGrid) -> EngineResult<Vec<NormRect>> {
    // Panes divide the content region between the title and footer strips.
    let content_top = canvas.title_height;
    let content_h = canvas.height - canvas.title_height - canvas.footer_height;
    let cell_w = canvas.width / grid.cols as f64;
    let cell_h = content_h / grid.rows as f64;
    let half_gap = grid.gap / 2.0;
    let mut panes = Vec::with_capacity(grid.rows * grid.cols);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let x0 = col as f64 * cell_w;
            let y0 = content_top + row as f64 * cell_h;
            let pad_left = if col == 0 { canvas.outer_padding } else { half_gap };
            let pad_right = if col + 1 == grid.cols {
                canvas.outer_padding
            } else {
                half_gap
            };
            let pad_top = if row == 0 { canvas.outer_padding } else { half_gap };
            let pad_bottom = if row + 1 == grid.rows {
                canvas.outer_padding
            } else {
                half_gap
            };
            let left = x0 + pad_left;
            let right = x0 + cell_w - pad_right;
            let top = y0 + pad_top;
            let bottom = y0 + cell_h - pad_bottom;
            if right - left <= 0.0 || bottom - top <= 0.0 {
                return Err(EngineError::catalog(format!(
                    "pane {} of a {}x{} layout is empty after padding",
                    row * grid.cols + col,
                    grid.rows,
                    grid.cols
                )));
            }
            panes.push(NormRect {
                left: left / canvas.width,
                top: top / canvas.height,
                right: right / canvas.width,
                bottom: bottom / canvas.height,
            });
        }
    }
    Ok(panes)
}

fn check_canvas(canvas: &CanvasConfig) -> EngineResult<()> {
    let finite = [
        canvas.width,
        canvas.height,
        canvas.frame_width,
        canvas.outer_padding,
        canvas.inner_padding,
        canvas.group_gap,
        canvas.step_gap,
        canvas.title_height,
        canvas.footer_height,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite {
        return Err(EngineError::catalog("canvas values must be finite"));
    }
    if canvas.width <= 0.0 || canvas.height <= 0.0 || canvas.frame_width <= 0.0 {
        return Err(EngineError::catalog("canvas dimensions must be positive"));
    }
    // Safe bounds must stay strictly inside the canvas.
    if canvas.outer_padding <= 0.0 {
        return Err(EngineError::catalog("outer padding must be positive"));
    }
    if canvas.group_gap < 0.0 || canvas.step_gap < 0.0 || canvas.inner_padding < 0.0 {
        return Err(EngineError::catalog("gaps must not be negative"));
    }
    if canvas.title_height < 0.0 || canvas.footer_height < 0.0 {
        return Err(EngineError::catalog("title and footer heights must not be negative"));
    }
    if canvas.title_height + canvas.footer_height + 2.0 * canvas.outer_padding >= canvas.height {
        return Err(EngineError::catalog(
            "title and footer leave no room for content",
        ));
    }
    Ok(())
}

fn check_limits(
    mode: LayoutMode,
    limits: &ModeLimits,
    canvas: &CanvasConfig,
    pane: &NormRect,
) -> EngineResult<()> {
    if limits.max_nodes == 0 {
        return Err(EngineError::catalog(format!("{mode}: maxNodes must be at least 1")));
    }
    if limits.max_label_chars == 0 {
        return Err(EngineError::catalog(format!(
            "{mode}: maxLabelChars must be at least 1"
        )));
    }
    let range = limits.node_size_range;
    if !(range.min.is_finite() && range.max.is_finite()) || range.min <= 0.0 || range.min > range.max {
        return Err(EngineError::catalog(format!(
            "{mode}: node size range [{}, {}] is invalid",
            range.min, range.max
        )));
    }
    if !limits.min_spacing.is_finite() || limits.min_spacing < 0.0 {
        return Err(EngineError::catalog(format!(
            "{mode}: minSpacing must not be negative"
        )));
    }
    let pane_w = pane.width() * canvas.width;
    let pane_h = pane.height() * canvas.height;
    if range.max > pane_w.min(pane_h) {
        return Err(EngineError::catalog(format!(
            "{mode}: largest node ({}) does not fit the {:.0}x{:.0} pane",
            range.max, pane_w, pane_h
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_rect(entry: &CatalogEntry, pane: usize) -> (f64, f64, f64, f64) {
        let r = entry.panes[pane];
        (
            r.left * entry.canvas.width,
            r.top * entry.canvas.height,
            r.right * entry.canvas.width,
            r.bottom * entry.canvas.height,
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn full_mode_subtracts_outer_padding() {
        let entry = LayoutCatalog::standard().entry(LayoutMode::Full);
        let (l, t, r, b) = pixel_rect(entry, 0);
        assert!(approx(l, 50.0) && approx(t, 50.0));
        assert!(approx(r, 1870.0) && approx(b, 1030.0));
    }

    #[test]
    fn split_mode_pads_each_pane_independently() {
        let entry = LayoutCatalog::standard().entry(LayoutMode::Split);
        assert_eq!(entry.panes.len(), 2);
        let (l0, _, r0, _) = pixel_rect(entry, 0);
        let (l1, _, r1, _) = pixel_rect(entry, 1);
        assert!(approx(l0, 50.0) && approx(r0, 940.0));
        assert!(approx(l1, 980.0) && approx(r1, 1870.0));
        assert_eq!(entry.primary_pane, 1);
        assert_eq!(entry.limits.max_nodes, 6);
    }

    #[test]
    fn every_pane_is_strictly_inside_the_canvas() {
        for entry in LayoutCatalog::standard().entries() {
            for pane in &entry.panes {
                assert!(pane.width() > 0.0 && pane.height() > 0.0, "{}", entry.mode);
                assert!(pane.left > 0.0 && pane.top > 0.0);
                assert!(pane.right < 1.0 && pane.bottom < 1.0);
            }
        }
    }

    #[test]
    fn step_mode_stacks_configured_steps() {
        let canvas = CanvasConfig {
            steps: 4,
            ..CanvasConfig::default()
        };
        let catalog = LayoutCatalog::new(&canvas, &ModeOverrides::default()).unwrap();
        let entry = catalog.entry(LayoutMode::StepByStep);
        assert_eq!(entry.panes.len(), 4);
        assert!(entry.panes[0].bottom < entry.panes[1].top);
    }

    #[test]
    fn lookup_rejects_unknown_modes() {
        let catalog = LayoutCatalog::standard();
        assert_eq!(catalog.lookup("step-by-step").unwrap().mode, LayoutMode::StepByStep);
        assert_eq!(
            catalog.lookup("carousel").unwrap_err(),
            EngineError::UnknownLayoutMode("carousel".to_string())
        );
    }

    #[test]
    fn overrides_are_applied_and_checked() {
        let mut overrides = ModeOverrides::new();
        overrides.insert(
            LayoutMode::Grid,
            LimitOverride {
                max_nodes: Some(4),
                ..LimitOverride::default()
            },
        );
        let catalog = LayoutCatalog::new(&CanvasConfig::default(), &overrides).unwrap();
        assert_eq!(catalog.entry(LayoutMode::Grid).limits.max_nodes, 4);

        overrides.insert(
            LayoutMode::Grid,
            LimitOverride {
                min_size: Some(90.0),
                max_size: Some(50.0),
                ..LimitOverride::default()
            },
        );
        assert!(matches!(
            LayoutCatalog::new(&CanvasConfig::default(), &overrides),
            Err(EngineError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn titled_canvas_reserves_title_and_footer_strips() {
        let catalog = LayoutCatalog::new(&CanvasConfig::titled(), &ModeOverrides::default()).unwrap();

        let full = catalog.entry(LayoutMode::Full);
        let (l, t, r, b) = pixel_rect(full, 0);
        assert!(approx(l, 50.0) && approx(r, 1870.0));
        assert!(approx(t, 170.0) && approx(b, 970.0));

        let title = full.title_zone.unwrap();
        assert!(approx(title.top * 1080.0, 50.0) && approx(title.bottom * 1080.0, 170.0));
        let footer = full.footer_zone.unwrap();
        assert!(approx(footer.top * 1080.0, 970.0) && approx(footer.bottom * 1080.0, 1030.0));

        for entry in catalog.entries() {
            for pane in &entry.panes {
                assert!(pane.top >= title.bottom - 1e-12, "{}", entry.mode);
                assert!(pane.bottom <= footer.top + 1e-12, "{}", entry.mode);
            }
        }
        // Rows of 300 px between y 120 and 1020, padded 50 outside and 7.5 between.
        let step = catalog.entry(LayoutMode::StepByStep);
        let (_, t0, _, b0) = pixel_rect(step, 0);
        assert!(approx(t0, 170.0) && approx(b0, 412.5));
    }

    #[test]
    fn default_canvas_has_no_reserved_zones() {
        let entry = LayoutCatalog::standard().entry(LayoutMode::Split);
        assert!(entry.title_zone.is_none() && entry.footer_zone.is_none());
    }

    #[test]
    fn oversized_title_is_rejected() {
        let canvas = CanvasConfig {
            title_height: 600.0,
            footer_height: 400.0,
            ..CanvasConfig::default()
        };
        assert!(matches!(
            LayoutCatalog::new(&canvas, &ModeOverrides::default()),
            Err(EngineError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn zero_outer_padding_is_rejected() {
        let canvas = CanvasConfig {
            outer_padding: 0.0,
            ..CanvasConfig::default()
        };
        assert!(LayoutCatalog::new(&canvas, &ModeOverrides::default()).is_err());
    }
}
