use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpStudioBackend, SessionController, SessionView, StudioBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use commands::{parse_command, Command, HELP};
use config::load_settings;
use terminal::TerminalView;

#[derive(Parser, Debug)]
#[command(name = "idea_studio", version, about = "Turn ideas into AI images and 3D models")]
struct Args {
    #[arg(long, default_value = "idea_studio.toml")]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    asset_url: Option<String>,
    #[arg(long)]
    viewer_url: Option<String>,
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(v) = args.api_url {
        settings.api_url = v;
    }
    if let Some(v) = args.asset_url {
        settings.asset_url = Some(v);
    }
    if let Some(v) = args.viewer_url {
        settings.viewer_url = Some(v);
    }
    if let Some(v) = args.download_dir {
        settings.download_dir = v;
    }
    let resolved = settings.resolve()?;
    info!(
        api = %resolved.api_base,
        assets = %resolved.controller.asset_base,
        "starting idea studio"
    );

    let backend: Arc<dyn StudioBackend> = Arc::new(
        HttpStudioBackend::new(resolved.api_base, resolved.transport)
            .context("failed to build backend client")?,
    );
    let view = Arc::new(TerminalView::new(
        Arc::clone(&backend),
        resolved.download_dir,
    ));
    let controller = SessionController::new(backend, view.clone(), resolved.controller);

    view.print_message(HELP);
    controller.render().await;
    {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            let _ = controller.check_backend_health().await;
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", view.prompt());
        std::io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        match parse_command(&line) {
            Command::Quit => break,
            command => dispatch(&controller, &view, command).await,
        }
    }

    info!("leaving idea studio");
    Ok(())
}

async fn dispatch(controller: &Arc<SessionController>, view: &Arc<TerminalView>, command: Command) {
    match command {
        Command::Generate(idea) => {
            let controller = Arc::clone(controller);
            tokio::spawn(async move {
                if let Err(err) = controller.submit_idea(&idea).await {
                    debug!(%err, "generate finished without an image");
                }
            });
        }
        Command::List => view.render_gallery(&controller.gallery().await),
        Command::Select(position) => match controller.image_at(position).await {
            Some(image) => {
                controller.select_image(&image).await;
            }
            None => view.print_message(&format!(
                "No image at position {position}. Use /list to see the gallery."
            )),
        },
        Command::Close => controller.dismiss_selection().await,
        Command::Convert => {
            let controller = Arc::clone(controller);
            tokio::spawn(async move {
                match controller.convert_active_to_3d().await {
                    Ok(Some(_)) => {}
                    Ok(None) => debug!("convert ignored: nothing selected"),
                    Err(err) => debug!(%err, "convert finished without a model"),
                }
            });
        }
        Command::Download => {
            if controller.download_active_image().await.is_none() {
                debug!("download ignored: nothing selected");
            }
        }
        Command::Health => {
            let controller = Arc::clone(controller);
            let view = Arc::clone(view);
            tokio::spawn(async move {
                if let Ok(report) = controller.check_backend_health().await {
                    view.print_health(&report);
                }
            });
        }
        Command::Help => view.print_message(HELP),
        Command::Invalid(message) => view.print_message(&message),
        Command::Quit => {}
    }
}
