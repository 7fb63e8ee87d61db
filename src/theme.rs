use serde::{Deserialize, Serialize};

const CHALK_PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#fbbf24", "#ef4444", "#a78bfa", "#f97316", "#06b6d4", "#ffffff",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub background: String,
    pub text_color: String,
    pub link_color: String,
    pub bounds_color: String,
    pub collision_color: String,
    pub node_stroke: String,
    pub palette: Vec<String>,
}

impl Theme {
    /// Chalk-on-black look shared by both renderers.
    pub fn blackboard() -> Self {
        Self {
            font_family: "Inter, system-ui, sans-serif".to_string(),
            font_size: 28.0,
            background: "#000000".to_string(),
            text_color: "#ffffff".to_string(),
            link_color: "#374151".to_string(),
            bounds_color: "#1e3a8a".to_string(),
            collision_color: "#ef4444".to_string(),
            node_stroke: "#ffffff".to_string(),
            palette: CHALK_PALETTE.iter().map(|value| value.to_string()).collect(),
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Inter, system-ui, sans-serif".to_string(),
            font_size: 16.0,
            background: "#FFFFFF".to_string(),
            text_color: "#1C2430".to_string(),
            link_color: "#7A8AA6".to_string(),
            bounds_color: "#C7D2E5".to_string(),
            collision_color: "#D62728".to_string(),
            node_stroke: "#1C2430".to_string(),
            palette: vec![
                "#1f77b4".to_string(),
                "#ff7f0e".to_string(),
                "#2ca02c".to_string(),
                "#9467bd".to_string(),
                "#8c564b".to_string(),
                "#17becf".to_string(),
            ],
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "blackboard" | "default" | "dark" => Some(Self::blackboard()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    pub fn node_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return &self.text_color;
        }
        &self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::blackboard()
    }
}
