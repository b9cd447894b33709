use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use kde_core::protocol::{KdeMessage, SearchOptions};
use kde_core::session::KdeSession;
use kde_platform::window::ParentWindow;

use crate::Commands;

/// Parent window stand-in: every posted message becomes one JSON line on stdout
pub(crate) struct StdoutParent;

impl ParentWindow for StdoutParent {
    fn post_message(&self, message: &serde_json::Value, target_origin: &str) -> Result<()> {
        let line = serde_json::json!({ "targetOrigin": target_origin, "message": message });
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line).context("failed to write message to stdout")
    }
}

pub(crate) async fn run(command: Commands, session: &KdeSession) -> Result<()> {
    let vfs = &session.vfs;
    match command {
        Commands::Ls { path } => print_json(&vfs.read_directory(&path).await?),
        Commands::Cat { path } => {
            let data = vfs.read_file(&path).await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data).context("failed to write to stdout")?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Write { path, local } => {
            let data = read_local(&local)?;
            vfs.write_file(&path, &data).await?;
            info!("wrote {} bytes to {}", data.len(), path);
            Ok(())
        }
        Commands::Rm { path } => {
            vfs.delete_file(&path).await?;
            info!("deleted {}", path);
            Ok(())
        }
        Commands::Cp {
            source,
            destination,
        } => {
            vfs.copy_file(&source, &destination).await?;
            info!("copied {} -> {}", source, destination);
            Ok(())
        }
        Commands::Mv {
            source,
            destination,
        } => {
            vfs.move_file(&source, &destination).await?;
            info!("moved {} -> {}", source, destination);
            Ok(())
        }
        Commands::Mkdir { path } => {
            vfs.create_directory(&path).await?;
            info!("created {}", path);
            Ok(())
        }
        Commands::Stat { path } => print_json(&vfs.get_file_info(&path).await?),
        Commands::Search {
            query,
            recursive,
            pattern,
            kind,
        } => {
            let options = SearchOptions {
                recursive: recursive.then_some(true),
                pattern,
                kind,
            };
            print_json(&vfs.search_files(&query, Some(&options)).await?)
        }
        Commands::Upload { path, local } => {
            let data = read_local(&local)?;
            let size = data.len();
            vfs.upload_file(&path, data).await?;
            info!("uploaded {} ({} bytes)", path, size);
            Ok(())
        }
        Commands::DownloadUrl { path } => {
            println!("{}", vfs.download_file(&path).await?);
            Ok(())
        }
        Commands::NotifyOpen { path } => session.window.send_message(&KdeMessage::open_file(path)),
    }
}

fn read_local(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read local file {}", path))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
