use crate::catalog::LayoutMode;
use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Long canvas edge in System U units (Manim's default frame width).
pub const DEFAULT_FRAME_WIDTH: f64 = 128.0 / 9.0;

/// Title strip height used by [`CanvasConfig::titled`].
pub const TITLE_ZONE_HEIGHT: f64 = 120.0;
/// Footer strip height used by [`CanvasConfig::titled`].
pub const FOOTER_ZONE_HEIGHT: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub frame_width: f64,
    pub outer_padding: f64,
    pub inner_padding: f64,
    pub group_gap: f64,
    pub step_gap: f64,
    pub steps: usize,
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Strip below the top padding kept free for a title. Panes start under it.
    pub title_height: f64,
    /// Strip above the bottom padding kept free for captions.
    pub footer_height: f64,
}

impl CanvasConfig {
    /// Default canvas with the 120 px title and 60 px footer strips reserved.
    pub fn titled() -> Self {
        Self {
            title_height: TITLE_ZONE_HEIGHT,
            footer_height: FOOTER_ZONE_HEIGHT,
            ..Self::default()
        }
    }

    pub fn units_per_pixel(&self) -> f64 {
        self.frame_width / self.width
    }

    pub fn frame_height(&self) -> f64 {
        self.height * self.units_per_pixel()
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            frame_width: DEFAULT_FRAME_WIDTH,
            outer_padding: 50.0,
            inner_padding: 20.0,
            group_gap: 40.0,
            step_gap: 15.0,
            steps: 3,
            grid_rows: 2,
            grid_cols: 2,
            title_height: 0.0,
            footer_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionConfig {
    pub iterations: usize,
    /// Overlap depth, as a fraction of the smaller node's size, at which a
    /// predicted collision becomes an error.
    pub severity_threshold: f64,
    pub initial_radius_fraction: f64,
    pub ideal_link_fraction: f64,
    pub step_fraction: f64,
    pub damping: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            iterations: 60,
            severity_threshold: 0.5,
            initial_radius_fraction: 0.35,
            ideal_link_fraction: 0.5,
            step_fraction: 0.1,
            damping: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixConfig {
    pub max_passes: usize,
    pub ellipsis: String,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            max_passes: 2,
            ellipsis: "\u{2026}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOverride {
    pub max_nodes: Option<usize>,
    pub max_label_chars: Option<usize>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub min_spacing: Option<f64>,
}

pub type ModeOverrides = BTreeMap<LayoutMode, LimitOverride>;

/// Everything validation and repair depend on. Cosmetic settings live in
/// [`Config::theme`] and never reach the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub canvas: CanvasConfig,
    pub collision: CollisionConfig,
    pub fix: FixConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub engine: EngineConfig,
    pub theme: Theme,
    pub modes: ModeOverrides,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    canvas: Option<CanvasConfigFile>,
    collision: Option<CollisionConfigFile>,
    fix: Option<FixConfigFile>,
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    modes: Option<BTreeMap<String, LimitOverride>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CanvasConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    frame_width: Option<f64>,
    outer_padding: Option<f64>,
    inner_padding: Option<f64>,
    group_gap: Option<f64>,
    step_gap: Option<f64>,
    steps: Option<usize>,
    grid_rows: Option<usize>,
    grid_cols: Option<usize>,
    title_height: Option<f64>,
    footer_height: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CollisionConfigFile {
    iterations: Option<usize>,
    severity_threshold: Option<f64>,
    initial_radius_fraction: Option<f64>,
    ideal_link_fraction: Option<f64>,
    step_fraction: Option<f64>,
    damping: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FixConfigFile {
    max_passes: Option<usize>,
    ellipsis: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f64>,
    background: Option<String>,
    text_color: Option<String>,
    link_color: Option<String>,
    bounds_color: Option<String>,
    collision_color: Option<String>,
    node_stroke: Option<String>,
    palette: Option<Vec<String>>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config file {}", path.display()))
}

/// Accepts JSON or JSON5 and merges it over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(canvas) = parsed.canvas {
        let target = &mut config.engine.canvas;
        if let Some(v) = canvas.width {
            target.width = v;
        }
        if let Some(v) = canvas.height {
            target.height = v;
        }
        if let Some(v) = canvas.frame_width {
            target.frame_width = v;
        }
        if let Some(v) = canvas.outer_padding {
            target.outer_padding = v;
        }
        if let Some(v) = canvas.inner_padding {
            target.inner_padding = v;
        }
        if let Some(v) = canvas.group_gap {
            target.group_gap = v;
        }
        if let Some(v) = canvas.step_gap {
            target.step_gap = v;
        }
        if let Some(v) = canvas.steps {
            target.steps = v;
        }
        if let Some(v) = canvas.grid_rows {
            target.grid_rows = v;
        }
        if let Some(v) = canvas.grid_cols {
            target.grid_cols = v;
        }
        if let Some(v) = canvas.title_height {
            target.title_height = v;
        }
        if let Some(v) = canvas.footer_height {
            target.footer_height = v;
        }
    }

    if let Some(collision) = parsed.collision {
        let target = &mut config.engine.collision;
        if let Some(v) = collision.iterations {
            target.iterations = v;
        }
        if let Some(v) = collision.severity_threshold {
            target.severity_threshold = v;
        }
        if let Some(v) = collision.initial_radius_fraction {
            target.initial_radius_fraction = v;
        }
        if let Some(v) = collision.ideal_link_fraction {
            target.ideal_link_fraction = v;
        }
        if let Some(v) = collision.step_fraction {
            target.step_fraction = v;
        }
        if let Some(v) = collision.damping {
            target.damping = v;
        }
    }

    if let Some(fix) = parsed.fix {
        if let Some(v) = fix.max_passes {
            // At least one repair pass always runs.
            config.engine.fix.max_passes = v.max(1);
        }
        if let Some(v) = fix.ellipsis {
            config.engine.fix.ellipsis = v;
        }
    }

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme {theme_name:?}"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.link_color {
            config.theme.link_color = v;
        }
        if let Some(v) = vars.bounds_color {
            config.theme.bounds_color = v;
        }
        if let Some(v) = vars.collision_color {
            config.theme.collision_color = v;
        }
        if let Some(v) = vars.node_stroke {
            config.theme.node_stroke = v;
        }
        if let Some(v) = vars.palette {
            config.theme.palette = v;
        }
    }

    if let Some(modes) = parsed.modes {
        for (name, patch) in modes {
            let mode = name.parse::<LayoutMode>()?;
            config.modes.insert(mode, patch);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_1080p_canvas() {
        let canvas = CanvasConfig::default();
        assert!((canvas.units_per_pixel() - 1.0 / 135.0).abs() < 1e-12);
        assert!((canvas.frame_height() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.modes.is_empty());
    }

    #[test]
    fn json5_file_merges_over_defaults() {
        let config = parse_config(
            r#"{
                // hand-edited
                canvas: { width: 1280, height: 720, },
                collision: { severityThreshold: 0.75 },
                fix: { maxPasses: 0 },
                theme: 'light',
                themeVariables: { background: '#101010' },
                modes: { 'step-by-step': { maxNodes: 4 } },
            }"#,
        )
        .unwrap();
        assert_eq!(config.engine.canvas.width, 1280.0);
        assert_eq!(config.engine.canvas.outer_padding, 50.0);
        assert_eq!(config.engine.collision.severity_threshold, 0.75);
        assert_eq!(config.engine.fix.max_passes, 1);
        assert_eq!(config.theme.background, "#101010");
        assert_eq!(config.theme.text_color, Theme::light().text_color);
        assert_eq!(
            config.modes.get(&LayoutMode::StepByStep).and_then(|m| m.max_nodes),
            Some(4)
        );
    }

    #[test]
    fn zone_heights_are_read_from_the_file() {
        let config =
            parse_config(r#"{"canvas": {"titleHeight": 120, "footerHeight": 60}}"#).unwrap();
        assert_eq!(config.engine.canvas, CanvasConfig::titled());
        assert_eq!(CanvasConfig::default().title_height, 0.0);
    }

    #[test]
    fn unknown_mode_key_is_an_error() {
        let err = parse_config(r#"{"modes": {"carousel": {"maxNodes": 2}}}"#).unwrap_err();
        assert!(err.to_string().contains("carousel"));
    }

    #[test]
    fn unknown_theme_is_an_error() {
        assert!(parse_config(r#"{"theme": "neon"}"#).is_err());
    }
}
