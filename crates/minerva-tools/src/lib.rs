//! Tool implementations for Minerva.
//!
//! Each tool wraps one external provider behind the `Tool` trait:
//! - Weather lookup via wttr.in
//! - Web search via the DuckDuckGo Instant Answer API
//! - Image upload and listing via Cloudinary

pub mod cloudinary;
pub mod search;
pub mod weather;

use std::sync::Arc;

use minerva_ai::ToolRegistry;

pub use cloudinary::{CloudinaryConfig, ImageListTool, ImageUploadTool};
pub use search::SearchTool;
pub use weather::WeatherTool;

/// Build the standard registry. The image tools are only registered
/// when Cloudinary credentials are configured; the backend never sees
/// declarations for tools that cannot run.
pub fn default_registry(cloudinary: Option<CloudinaryConfig>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WeatherTool::new()));
    registry.register(Arc::new(SearchTool::new()));
    if let Some(config) = cloudinary {
        registry.register(Arc::new(ImageUploadTool::new(config.clone())));
        registry.register(Arc::new(ImageListTool::new(config)));
    }
    registry
}
