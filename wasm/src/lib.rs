use serde::Deserialize;
use vizguard::config::{Config, parse_config};
use vizguard::{LayoutCatalog, auto_fix, parse_descriptor, validate};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuardOptions {
    mode: Option<String>,
    /// Same format as the CLI config file.
    config: Option<serde_json::Value>,
}

struct Session {
    config: Config,
    catalog: LayoutCatalog,
    mode: String,
}

fn build_session(options_json: Option<&str>) -> Result<Session, String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<GuardOptions>(raw).map_err(|error| error.to_string())?,
        None => GuardOptions::default(),
    };
    let config = match options.config {
        Some(value) => parse_config(&value.to_string()).map_err(|error| format!("{error:#}"))?,
        None => Config::default(),
    };
    let catalog = LayoutCatalog::new(&config.engine.canvas, &config.modes)
        .map_err(|error| error.to_string())?;
    Ok(Session {
        config,
        catalog,
        mode: options.mode.unwrap_or_else(|| "full".to_string()),
    })
}

fn validate_json(input: &str, options_json: Option<&str>) -> Result<String, String> {
    let session = build_session(options_json)?;
    let entry = session.catalog.lookup(&session.mode).map_err(|e| e.to_string())?;
    let descriptor = parse_descriptor(input).map_err(|e| e.to_string())?;
    let result = validate(&descriptor, entry, &session.config.engine).map_err(|e| e.to_string())?;
    serde_json::to_string(&result).map_err(|e| e.to_string())
}

fn auto_fix_json(input: &str, options_json: Option<&str>) -> Result<String, String> {
    let session = build_session(options_json)?;
    let entry = session.catalog.lookup(&session.mode).map_err(|e| e.to_string())?;
    let descriptor = parse_descriptor(input).map_err(|e| e.to_string())?;
    let outcome = auto_fix(&descriptor, entry, &session.config.engine).map_err(|e| e.to_string())?;
    serde_json::to_string(&outcome).map_err(|e| e.to_string())
}

fn prompt_text(options_json: Option<&str>) -> Result<String, String> {
    let session = build_session(options_json)?;
    let entry = session.catalog.lookup(&session.mode).map_err(|e| e.to_string())?;
    Ok(vizguard::prompt::constraint_prompt(entry))
}

#[wasm_bindgen]
pub fn validate_descriptor(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    validate_json(input, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn auto_fix_descriptor(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    auto_fix_json(input, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn constraint_prompt(options_json: Option<String>) -> Result<String, JsValue> {
    prompt_text(options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}
