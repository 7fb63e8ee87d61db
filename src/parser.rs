use crate::error::{EngineError, EngineResult};
use crate::ir::{Descriptor, DescriptorKind, Link, Node, Position};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCE_INFO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:```|~~~)\s*(?P<lang>[A-Za-z0-9_+-]*)").unwrap());
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<value>[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*(?:px)?\s*$").unwrap());

/// Parses a generator reply into a descriptor. The reply may wrap the JSON in
/// prose or a fenced block, and may use JSON5 syntax.
pub fn parse_descriptor(input: &str) -> EngineResult<Descriptor> {
    let block = extract_descriptor_block(input)
        .ok_or_else(|| EngineError::malformed("no JSON object found in input"))?;
    let value = parse_json_value(&block)?;
    let descriptor = descriptor_from_value(&value)?;
    descriptor.check_well_formed()?;
    Ok(descriptor)
}

/// Pulls the descriptor text out of a reply: the first fenced block whose
/// body is an object (``` or ~~~, untagged or tagged json/json5), otherwise
/// the first balanced `{...}` span.
pub fn extract_descriptor_block(input: &str) -> Option<String> {
    for block in fenced_blocks(input) {
        let trimmed = block.trim();
        if trimmed.starts_with('{') {
            return Some(trimmed.to_string());
        }
    }
    first_object_span(input).map(str::to_string)
}

fn fenced_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    // Open fence marker, and whether its body could hold a descriptor.
    let mut open: Option<(&str, bool)> = None;
    let mut current = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim();
        match open {
            None => {
                if let Some(caps) = FENCE_INFO_RE.captures(trimmed) {
                    let lang = caps.name("lang").map_or("", |m| m.as_str());
                    let wanted = matches!(
                        lang.to_ascii_lowercase().as_str(),
                        "" | "json" | "json5" | "jsonc"
                    );
                    open = Some((&trimmed[..3], wanted));
                }
            }
            Some((marker, wanted)) => {
                if trimmed.starts_with(marker) && trimmed[marker.len()..].trim().is_empty() {
                    if wanted {
                        blocks.push(current.join("\n"));
                    }
                    current.clear();
                    open = None;
                } else {
                    current.push(line);
                }
            }
        }
    }

    blocks
}

fn first_object_span(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, ch) in input[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_json_value(block: &str) -> EngineResult<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(block) {
        return Ok(value);
    }
    json5::from_str::<Value>(block).map_err(|err| EngineError::malformed(format!("invalid JSON: {err}")))
}

fn descriptor_from_value(value: &Value) -> EngineResult<Descriptor> {
    let obj = value
        .as_object()
        .ok_or_else(|| EngineError::malformed("descriptor must be a JSON object"))?;

    let kind = match obj.get("kind").or_else(|| obj.get("type")) {
        None | Some(Value::Null) => DescriptorKind::Network,
        Some(Value::String(token)) => DescriptorKind::from_token(token).ok_or_else(|| {
            EngineError::malformed(format!("unsupported descriptor kind {token:?}"))
        })?,
        Some(other) => {
            return Err(EngineError::malformed(format!(
                "descriptor kind must be a string, found {other}"
            )));
        }
    };

    let nodes = obj
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::malformed("descriptor has no \"nodes\" array"))?
        .iter()
        .enumerate()
        .map(|(idx, raw)| node_from_value(idx, raw))
        .collect::<EngineResult<Vec<_>>>()?;

    let links = match obj.get("links").or_else(|| obj.get("edges")) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, raw)| link_from_value(idx, raw))
            .collect::<EngineResult<Vec<_>>>()?,
        Some(_) => return Err(EngineError::malformed("\"links\" must be an array")),
    };

    Ok(Descriptor { kind, nodes, links })
}

fn node_from_value(idx: usize, raw: &Value) -> EngineResult<Node> {
    let obj = raw
        .as_object()
        .ok_or_else(|| EngineError::malformed(format!("node {idx} is not an object")))?;
    let id = obj
        .get("id")
        .and_then(id_string)
        .ok_or_else(|| EngineError::malformed(format!("node {idx} has no usable id")))?;
    let label = match obj.get("label") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => id.clone(),
    };
    let size = obj
        .get("size")
        .and_then(number)
        .ok_or_else(|| EngineError::malformed(format!("node {id:?} has no numeric size")))?;
    let position = match obj.get("position") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(position_from_value(&id, raw)?),
    };
    Ok(Node {
        id,
        label,
        size,
        position,
    })
}

fn position_from_value(id: &str, raw: &Value) -> EngineResult<Position> {
    let pair = match raw {
        Value::Object(obj) => coord(obj, "x").zip(coord(obj, "y")),
        Value::Array(items) if items.len() == 2 => number(&items[0]).zip(number(&items[1])),
        _ => None,
    };
    pair.map(|(x, y)| Position::new(x, y))
        .ok_or_else(|| EngineError::malformed(format!("node {id:?} has an unreadable position")))
}

fn coord(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(number)
}

fn link_from_value(idx: usize, raw: &Value) -> EngineResult<Link> {
    let obj = raw
        .as_object()
        .ok_or_else(|| EngineError::malformed(format!("link {idx} is not an object")))?;
    let source = obj.get("source").or_else(|| obj.get("from")).and_then(id_string);
    let target = obj.get("target").or_else(|| obj.get("to")).and_then(id_string);
    match (source, target) {
        (Some(source), Some(target)) => Ok(Link { source, target }),
        _ => Err(EngineError::malformed(format!(
            "link {idx} needs source and target ids"
        ))),
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
            _ => n.to_string(),
        }),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => NUMBER_RE
            .captures(text)
            .and_then(|caps| caps.name("value"))
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    }
}
