pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod collision;
pub mod config;
pub mod coords;
pub mod error;
pub mod fix;
pub mod ir;
pub mod parser;
pub mod prompt;
pub mod render;
pub mod scene_dump;
pub mod theme;
pub mod validate;

pub use catalog::{CatalogEntry, LayoutCatalog, LayoutMode, ModeLimits, SizeRange};
#[cfg(feature = "cli")]
pub use cli::run;
pub use collision::{Collision, CollisionReport, simulate_collisions};
pub use config::{CanvasConfig, CollisionConfig, Config, EngineConfig, FixConfig, load_config};
pub use coords::{
    CoordinateMapper, CoordinateSystem, PixelPoint, PixelSystem, Point, SafeBounds, UnitPoint,
    UnitSystem,
};
pub use error::{EngineError, EngineResult};
pub use fix::{
    DegreeRanking, FixOutcome, InsertionOrderRanking, NodeRanking, Repair, auto_fix, auto_fix_with,
    truncate_label,
};
pub use ir::{Descriptor, DescriptorKind, Link, Node, Position};
pub use parser::{extract_descriptor_block, parse_descriptor};
pub use prompt::constraint_prompt;
pub use render::render_preview_svg;
pub use scene_dump::{SceneDump, project_scene};
pub use theme::Theme;
pub use validate::{ConstraintViolation, Severity, ValidationResult, ViolationKind, validate};
