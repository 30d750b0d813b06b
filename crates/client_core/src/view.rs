//! Rendering surface driven by the session controller.

use std::sync::Arc;

use shared::domain::StatusKind;
use url::Url;

use crate::types::{ConversionStatus, GeneratedImage};

/// Everything the controller needs from a page. Implementations must not call back
/// into the controller from these methods.
pub trait SessionView: Send + Sync {
    /// Full gallery, newest first. An empty slice means the placeholder is shown.
    fn render_gallery(&self, images: &[Arc<GeneratedImage>]);
    fn render_status(&self, message: &str, kind: StatusKind);
    fn clear_status(&self);
    fn set_generate_enabled(&self, enabled: bool);
    fn clear_idea_input(&self);
    fn open_modal(&self, image: &GeneratedImage);
    fn close_modal(&self);
    fn render_conversion(&self, status: &ConversionStatus);
    fn set_convert_enabled(&self, enabled: bool);
    /// Browser-style "save as": fetch `url` and store it under `filename`.
    fn save_file(&self, url: &Url, filename: &str);
}
