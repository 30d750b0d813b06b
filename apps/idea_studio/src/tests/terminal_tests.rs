use super::{gallery_lines, save_asset, TerminalView};

use std::{
    env, fs,
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use chrono::Utc;
use client_core::{GeneratedImage, SessionView, StudioBackend};
use shared::{
    domain::ImageId,
    error::StudioError,
    protocol::{ConvertTo3dResponse, GenerateImageResponse, HealthReport},
};
use url::Url;

struct AssetBackend {
    asset: Result<Vec<u8>, StudioError>,
}

#[async_trait]
impl StudioBackend for AssetBackend {
    async fn generate_image(&self, _idea: &str) -> Result<GenerateImageResponse, StudioError> {
        Err(StudioError::Transport("not scripted".into()))
    }

    async fn convert_to_3d(
        &self,
        _image_path: &str,
    ) -> Result<ConvertTo3dResponse, StudioError> {
        Err(StudioError::Transport("not scripted".into()))
    }

    async fn health(&self) -> Result<HealthReport, StudioError> {
        Ok(HealthReport::default())
    }

    async fn fetch_asset(&self, _url: &Url) -> Result<Vec<u8>, StudioError> {
        self.asset.clone()
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("idea_studio_terminal_test_{name}_{suffix}"))
}

fn view(asset: Result<Vec<u8>, StudioError>, download_dir: PathBuf) -> TerminalView {
    TerminalView::new(Arc::new(AssetBackend { asset }), download_dir)
}

fn image(id: &str, prompt: &str) -> Arc<GeneratedImage> {
    Arc::new(GeneratedImage {
        id: ImageId::new(id),
        image_url: Url::parse(&format!("http://localhost:5000/img/{id}.png")).expect("url"),
        image_path: format!("gen/{id}.png"),
        prompt: prompt.to_string(),
        timestamp: Utc::now(),
    })
}

fn asset_url() -> Url {
    Url::parse("http://localhost:5000/img/abc.png").expect("url")
}

#[tokio::test]
async fn save_asset_creates_directory_and_writes_bytes() {
    let download_dir = temp_dir("save").join("nested");
    let backend = AssetBackend {
        asset: Ok(b"\x89PNG fake".to_vec()),
    };
    let target = download_dir.join(image("abc", "x").download_filename());

    let size = save_asset(&backend, &asset_url(), &target)
        .await
        .expect("save asset");

    assert_eq!(size, 9);
    assert_eq!(target, download_dir.join("ai-generated-abc.png"));
    assert_eq!(fs::read(&target).expect("read saved"), b"\x89PNG fake");
}

#[tokio::test]
async fn failed_fetch_writes_nothing() {
    let download_dir = temp_dir("fail");
    let backend = AssetBackend {
        asset: Err(StudioError::Http {
            status: 404,
            message: None,
        }),
    };
    let target = download_dir.join("ai-generated-abc.png");

    let err = save_asset(&backend, &asset_url(), &target)
        .await
        .expect_err("fetch fails");

    assert_eq!(err.to_string(), "HTTP error! status: 404");
    assert!(!target.exists());
    assert!(!download_dir.exists());
}

#[tokio::test]
async fn save_file_lands_in_download_dir() {
    let download_dir = temp_dir("view");
    let view = view(Ok(b"image-bytes".to_vec()), download_dir.clone());

    view.save_file(&asset_url(), "ai-generated-abc.png");

    let target = download_dir.join("ai-generated-abc.png");
    let mut saved = None;
    for _ in 0..100 {
        if let Ok(bytes) = fs::read(&target) {
            if !bytes.is_empty() {
                saved = Some(bytes);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(saved.as_deref(), Some(&b"image-bytes"[..]));
}

#[test]
fn empty_gallery_shows_placeholder_only() {
    let lines = gallery_lines(&[]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Gallery is empty."));
}

#[test]
fn gallery_lists_images_by_position() {
    let lines = gallery_lines(&[image("2", "a blue whale"), image("1", "a red fox")]);

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Gallery (2 image(s), newest first):");
    assert!(lines[1].starts_with("  [1] a blue whale  ("));
    assert!(lines[2].starts_with("  [2] a red fox  ("));
    assert!(lines.iter().all(|line| !line.contains("Gallery is empty")));
}

#[test]
fn prompt_reflects_busy_controls() {
    let view = view(Ok(Vec::new()), temp_dir("prompt"));
    assert_eq!(view.prompt(), "idea> ");

    view.set_generate_enabled(false);
    assert_eq!(view.prompt(), "idea (generating)> ");

    view.set_convert_enabled(false);
    assert_eq!(view.prompt(), "idea (generating)> ");

    view.open_modal(&image("1", "a red fox"));
    assert_eq!(view.prompt(), "idea (generating, converting)> ");

    view.set_generate_enabled(true);
    assert_eq!(view.prompt(), "idea (converting)> ");

    view.close_modal();
    assert_eq!(view.prompt(), "idea> ");
}
