use std::{sync::Arc, time::Duration};

use chrono::Utc;
use shared::{
    domain::StatusKind,
    error::StudioError,
    protocol::{ConvertTo3dResponse, GenerateImageResponse, HealthReport},
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

pub mod error;
pub mod transport;
pub mod types;
pub mod view;

pub use error::{Operation, SessionError};
pub use transport::{HttpStudioBackend, StudioBackend, TransportOptions};
pub use types::{ConversionStatus, Gallery, GeneratedImage, ModelAsset};
pub use view::SessionView;

pub const EMPTY_IDEA_MESSAGE: &str = "Please enter your idea or inspiration!";
pub const DEFAULT_STATUS_DISMISS_AFTER: Duration = Duration::from_secs(5);

const GENERATING_MESSAGE: &str = "Generating your image... This may take 10-15 seconds.";
const GENERATED_MESSAGE: &str = "Image generated successfully! Select it to view or convert to 3D.";
const GENERATE_BUSY_MESSAGE: &str = "An image is already being generated; please wait.";
const GENERATE_FALLBACK: &str = "Failed to generate image";
const CONVERTING_MESSAGE: &str =
    "Converting to 3D model... This may take 2-3 minutes. Please wait.";
const CONVERT_FALLBACK: &str = "Failed to convert to 3D";
const DOWNLOADED_MESSAGE: &str = "Image downloaded!";

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Base address that service-relative asset urls are resolved against.
    pub asset_base: Url,
    /// Page that renders a model given `?model=<model_url>`.
    pub viewer_url: Url,
    pub status_dismiss_after: Duration,
}

impl ControllerSettings {
    pub fn new(asset_base: Url, viewer_url: Url) -> Self {
        Self {
            asset_base,
            viewer_url,
            status_dismiss_after: DEFAULT_STATUS_DISMISS_AFTER,
        }
    }
}

#[derive(Default)]
struct SessionState {
    gallery: Gallery,
    active: Option<Arc<GeneratedImage>>,
    generating: bool,
    converting: bool,
    conversion: ConversionStatus,
    status_seq: u64,
}

/// Owns the session (gallery, selection, busy flags) and mediates the generate and
/// convert flows between a `SessionView` and a `StudioBackend`.
///
/// The state lock is only held for bookkeeping and view updates, never across a
/// request to the backend.
pub struct SessionController {
    backend: Arc<dyn StudioBackend>,
    view: Arc<dyn SessionView>,
    settings: ControllerSettings,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn StudioBackend>,
        view: Arc<dyn SessionView>,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            view,
            settings,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Pushes the current state to the view, e.g. right after the page is attached.
    pub async fn render(&self) {
        let state = self.state.lock().await;
        self.view.render_gallery(state.gallery.as_slice());
        self.view.set_generate_enabled(!state.generating);
        match &state.active {
            Some(image) => {
                self.view.open_modal(image);
                self.view.render_conversion(&state.conversion);
                self.view.set_convert_enabled(!state.converting);
            }
            None => self.view.close_modal(),
        }
    }

    pub async fn submit_idea(
        self: &Arc<Self>,
        text: &str,
    ) -> Result<Arc<GeneratedImage>, SessionError> {
        let idea = text.trim();
        {
            let mut state = self.state.lock().await;
            if idea.is_empty() {
                self.publish_status(&mut state, EMPTY_IDEA_MESSAGE, StatusKind::Error);
                return Err(SessionError::Validation(EMPTY_IDEA_MESSAGE.to_string()));
            }
            if state.generating {
                warn!("generate request rejected; previous request still in flight");
                self.publish_status(&mut state, GENERATE_BUSY_MESSAGE, StatusKind::Info);
                return Err(SessionError::Busy(Operation::GenerateImage));
            }
            state.generating = true;
            self.view.set_generate_enabled(false);
            self.publish_status(&mut state, GENERATING_MESSAGE, StatusKind::Info);
        }

        info!(idea_len = idea.len(), "requesting image generation");
        let outcome = self
            .backend
            .generate_image(idea)
            .await
            .and_then(|response| self.build_image(response));

        let mut state = self.state.lock().await;
        state.generating = false;
        let result = match outcome {
            Ok(image) => {
                info!(image_id = %image.id, "image generated");
                state.gallery.prepend(Arc::clone(&image));
                self.view.render_gallery(state.gallery.as_slice());
                self.view.clear_idea_input();
                self.publish_status(&mut state, GENERATED_MESSAGE, StatusKind::Success);
                Ok(image)
            }
            Err(source) => {
                error!(error = %source, "image generation failed");
                let message = format!("Error: {}", source.user_message(GENERATE_FALLBACK));
                self.publish_status(&mut state, &message, StatusKind::Error);
                Err(SessionError::Request {
                    operation: Operation::GenerateImage,
                    source,
                })
            }
        };
        self.view.set_generate_enabled(true);
        result
    }

    /// Opens the detail view for an image held by the gallery. Images from elsewhere are
    /// ignored, even when they share an id with a gallery entry.
    pub async fn select_image(&self, image: &Arc<GeneratedImage>) -> Option<Arc<GeneratedImage>> {
        let mut state = self.state.lock().await;
        if !state.gallery.contains(image) {
            warn!(image_id = %image.id, "select ignored: image is not in the gallery");
            return None;
        }
        let image = Arc::clone(image);

        debug!(image_id = %image.id, "opening detail view");
        state.active = Some(Arc::clone(&image));
        state.conversion = ConversionStatus::Idle;
        self.view.open_modal(&image);
        self.view.render_conversion(&state.conversion);
        self.view.set_convert_enabled(!state.converting);
        Some(image)
    }

    pub async fn dismiss_selection(&self) {
        let mut state = self.state.lock().await;
        state.active = None;
        self.view.close_modal();
    }

    /// Returns `Ok(None)` when nothing is selected; no request is made in that case.
    pub async fn convert_active_to_3d(
        self: &Arc<Self>,
    ) -> Result<Option<ModelAsset>, SessionError> {
        let image = {
            let mut state = self.state.lock().await;
            let Some(image) = state.active.clone() else {
                debug!("convert ignored: no active selection");
                return Ok(None);
            };
            if state.converting {
                warn!(
                    image_id = %image.id,
                    "convert request rejected; conversion already in flight"
                );
                return Err(SessionError::Busy(Operation::ConvertTo3d));
            }
            state.converting = true;
            state.conversion = ConversionStatus::Loading {
                message: CONVERTING_MESSAGE.to_string(),
            };
            self.view.render_conversion(&state.conversion);
            self.view.set_convert_enabled(false);
            image
        };

        info!(image_id = %image.id, image_path = %image.image_path, "requesting 3D conversion");
        let outcome = self
            .backend
            .convert_to_3d(&image.image_path)
            .await
            .and_then(|response| self.build_model_asset(response));

        let mut state = self.state.lock().await;
        state.converting = false;
        let (status, result) = match outcome {
            Ok(asset) => {
                info!(image_id = %image.id, model_url = %asset.model_url, "3D model ready");
                (ConversionStatus::Success(asset.clone()), Ok(Some(asset)))
            }
            Err(source) => {
                error!(image_id = %image.id, error = %source, "3D conversion failed");
                let message = format!("Error: {}", source.user_message(CONVERT_FALLBACK));
                (
                    ConversionStatus::Error { message },
                    Err(SessionError::Request {
                        operation: Operation::ConvertTo3d,
                        source,
                    }),
                )
            }
        };

        let still_active = state
            .active
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, &image));
        if still_active {
            state.conversion = status;
            self.view.render_conversion(&state.conversion);
        } else {
            info!(
                image_id = %image.id,
                "conversion finished after the selection changed; not rendered"
            );
        }
        self.view.set_convert_enabled(true);
        result
    }

    /// Asks the view to save the active image. Returns the filename used, if any.
    pub async fn download_active_image(self: &Arc<Self>) -> Option<String> {
        let mut state = self.state.lock().await;
        let image = state.active.clone()?;
        let filename = image.download_filename();
        info!(image_id = %image.id, %filename, "saving image");
        self.view.save_file(&image.image_url, &filename);
        self.publish_status(&mut state, DOWNLOADED_MESSAGE, StatusKind::Success);
        Some(filename)
    }

    /// Advisory reachability check; a failure only leaves a warning on screen.
    pub async fn check_backend_health(self: &Arc<Self>) -> Result<HealthReport, StudioError> {
        match self.backend.health().await {
            Ok(report) => {
                info!(
                    status = ?report.status,
                    openai_configured = ?report.openai_configured,
                    meshy_configured = ?report.meshy_configured,
                    "backend connected"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, "backend health check failed");
                let message = format!(
                    "Backend not connected. Make sure the backend server is running at {}.",
                    self.settings.asset_base
                );
                let mut state = self.state.lock().await;
                self.publish_status(&mut state, &message, StatusKind::Error);
                Err(err)
            }
        }
    }

    pub async fn gallery(&self) -> Vec<Arc<GeneratedImage>> {
        self.state.lock().await.gallery.as_slice().to_vec()
    }

    pub async fn image_at(&self, position: usize) -> Option<Arc<GeneratedImage>> {
        self.state.lock().await.gallery.at_position(position).cloned()
    }

    pub async fn active_image(&self) -> Option<Arc<GeneratedImage>> {
        self.state.lock().await.active.clone()
    }

    pub async fn conversion_status(&self) -> ConversionStatus {
        self.state.lock().await.conversion.clone()
    }

    pub async fn is_generating(&self) -> bool {
        self.state.lock().await.generating
    }

    pub async fn is_converting(&self) -> bool {
        self.state.lock().await.converting
    }

    fn publish_status(
        self: &Arc<Self>,
        state: &mut SessionState,
        message: &str,
        kind: StatusKind,
    ) {
        state.status_seq += 1;
        let seq = state.status_seq;
        self.view.render_status(message, kind);
        if !kind.auto_dismisses() {
            return;
        }

        let controller = Arc::clone(self);
        let delay = self.settings.status_dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let state = controller.state.lock().await;
            if state.status_seq == seq {
                controller.view.clear_status();
            }
        });
    }

    fn build_image(
        &self,
        response: GenerateImageResponse,
    ) -> Result<Arc<GeneratedImage>, StudioError> {
        let image_url = self.resolve_asset(&response.image_url)?;
        Ok(Arc::new(GeneratedImage {
            id: response.image_id,
            image_url,
            image_path: response.image_path,
            prompt: response.prompt,
            timestamp: Utc::now(),
        }))
    }

    fn build_model_asset(&self, response: ConvertTo3dResponse) -> Result<ModelAsset, StudioError> {
        let download_url = self.resolve_asset(&response.model_url)?;
        let mut viewer_url = self.settings.viewer_url.clone();
        viewer_url
            .query_pairs_mut()
            .append_pair("model", &response.model_url);
        Ok(ModelAsset {
            model_url: response.model_url,
            download_url,
            viewer_url,
        })
    }

    fn resolve_asset(&self, reference: &str) -> Result<Url, StudioError> {
        self.settings
            .asset_base
            .join(reference)
            .map_err(|err| {
                StudioError::Transport(format!("invalid asset url '{reference}': {err}"))
            })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
