//! Line-oriented rendering of the session on stdout.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use client_core::{ConversionStatus, GeneratedImage, SessionView, StudioBackend};
use shared::{domain::StatusKind, protocol::HealthReport};
use tracing::{debug, error, info};
use url::Url;

pub struct TerminalView {
    backend: Arc<dyn StudioBackend>,
    download_dir: PathBuf,
    generate_enabled: AtomicBool,
    convert_enabled: AtomicBool,
    modal_open: AtomicBool,
}

impl TerminalView {
    pub fn new(backend: Arc<dyn StudioBackend>, download_dir: PathBuf) -> Self {
        Self {
            backend,
            download_dir,
            generate_enabled: AtomicBool::new(true),
            convert_enabled: AtomicBool::new(true),
            modal_open: AtomicBool::new(false),
        }
    }

    pub fn prompt(&self) -> &'static str {
        let generating = !self.generate_enabled.load(Ordering::Relaxed);
        let converting = self.modal_open.load(Ordering::Relaxed)
            && !self.convert_enabled.load(Ordering::Relaxed);
        match (generating, converting) {
            (true, true) => "idea (generating, converting)> ",
            (true, false) => "idea (generating)> ",
            (false, true) => "idea (converting)> ",
            (false, false) => "idea> ",
        }
    }

    pub fn print_message(&self, message: &str) {
        println!("{message}");
    }

    pub fn print_health(&self, report: &HealthReport) {
        let flag = |value: Option<bool>| match value {
            Some(true) => "configured",
            Some(false) => "not configured",
            None => "unknown",
        };
        println!(
            "Backend reachable (status: {}; image provider: {}; 3D provider: {})",
            report.status.as_deref().unwrap_or("unknown"),
            flag(report.openai_configured),
            flag(report.meshy_configured),
        );
    }
}

fn gallery_lines(images: &[Arc<GeneratedImage>]) -> Vec<String> {
    if images.is_empty() {
        return vec![
            "Gallery is empty. Type an idea and press Enter to create your first image."
                .to_string(),
        ];
    }
    let mut lines = Vec::with_capacity(images.len() + 1);
    lines.push(format!("Gallery ({} image(s), newest first):", images.len()));
    for (index, image) in images.iter().enumerate() {
        lines.push(format!(
            "  [{}] {}  ({})",
            index + 1,
            image.prompt,
            image.timestamp.format("%H:%M:%S")
        ));
    }
    lines
}

/// Fetches `url` and writes it to `target`, creating the parent directory if needed.
/// Nothing is written when the fetch fails.
async fn save_asset(backend: &dyn StudioBackend, url: &Url, target: &Path) -> Result<usize> {
    let bytes = backend
        .fetch_asset(url)
        .await
        .map_err(|err| anyhow::anyhow!(err.user_message("download failed")))?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    tokio::fs::write(target, &bytes)
        .await
        .with_context(|| format!("could not write {}", target.display()))?;
    Ok(bytes.len())
}

impl SessionView for TerminalView {
    fn render_gallery(&self, images: &[Arc<GeneratedImage>]) {
        for line in gallery_lines(images) {
            println!("{line}");
        }
    }

    fn render_status(&self, message: &str, kind: StatusKind) {
        let tag = match kind {
            StatusKind::Info => "info",
            StatusKind::Success => "ok",
            StatusKind::Error => "error",
        };
        println!("[{tag}] {message}");
    }

    fn clear_status(&self) {
        debug!("status line dismissed");
    }

    fn set_generate_enabled(&self, enabled: bool) {
        self.generate_enabled.store(enabled, Ordering::Relaxed);
    }

    fn clear_idea_input(&self) {
        debug!("idea input cleared");
    }

    fn open_modal(&self, image: &GeneratedImage) {
        self.modal_open.store(true, Ordering::Relaxed);
        println!("--- image {} ---", image.id);
        println!("  prompt:  {}", image.prompt);
        println!("  image:   {}", image.image_url);
        println!("  created: {}", image.timestamp.to_rfc3339());
        println!("  /convert, /download or /close");
    }

    fn close_modal(&self) {
        if self.modal_open.swap(false, Ordering::Relaxed) {
            println!("--- closed ---");
        }
    }

    fn render_conversion(&self, status: &ConversionStatus) {
        match status {
            ConversionStatus::Idle => {}
            ConversionStatus::Loading { message } => println!("[3d] {message}"),
            ConversionStatus::Success(asset) => {
                println!("[3d] 3D model ready!");
                println!("  view in 3D viewer: {}", asset.viewer_url);
                println!("  download (.glb):   {}", asset.download_url);
            }
            ConversionStatus::Error { message } => println!("[3d] {message}"),
        }
    }

    fn set_convert_enabled(&self, enabled: bool) {
        self.convert_enabled.store(enabled, Ordering::Relaxed);
    }

    fn save_file(&self, url: &Url, filename: &str) {
        let backend = Arc::clone(&self.backend);
        let url = url.clone();
        let target = self.download_dir.join(filename);
        tokio::spawn(async move {
            match save_asset(backend.as_ref(), &url, &target).await {
                Ok(size) => {
                    info!(path = %target.display(), size, "image saved");
                    println!("Saved {}", target.display());
                }
                Err(err) => {
                    error!(
                        %url,
                        path = %target.display(),
                        error = format!("{err:#}"),
                        "image download failed"
                    );
                    println!("[error] Download failed: {err:#}");
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
