use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use kde_core::config::KdeConfig;
use kde_core::protocol::SearchType;
use kde_core::session::initialize_kde;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "kde")]
#[command(about = "Command-line client for a KDE remote filesystem backend")]
#[command(version)]
struct Cli {
    /// Backend base URL (e.g., https://files.example.com/api)
    #[arg(long, env = "KDE_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Authentication cookie issued by the host
    #[arg(long, env = "KDE_AUTH_COOKIE", global = true)]
    auth_cookie: Option<String>,

    /// Path to config file
    #[arg(long, env = "KDE_CONFIG_PATH", global = true)]
    config_path: Option<String>,

    /// Write the merged config (file + flags) back to the config path
    #[arg(long, global = true)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "KDE_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// List a directory
    Ls { path: String },
    /// Print a file's contents to stdout
    Cat { path: String },
    /// Write a local file's contents to a remote path
    Write { path: String, local: String },
    /// Delete a remote file
    Rm { path: String },
    /// Copy a remote file
    Cp { source: String, destination: String },
    /// Move a remote file
    Mv { source: String, destination: String },
    /// Create a remote directory
    Mkdir { path: String },
    /// Show metadata for a remote path
    Stat { path: String },
    /// Search the remote filesystem
    Search {
        query: String,
        #[arg(long)]
        recursive: bool,
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long = "type", value_parser = parse_search_type)]
        kind: Option<SearchType>,
    },
    /// Upload a local file as multipart form data
    Upload { path: String, local: String },
    /// Print a download URL for a remote file
    DownloadUrl { path: String },
    /// Post an OPEN_FILE message to the parent window (stdout)
    NotifyOpen { path: String },
}

fn parse_search_type(s: &str) -> Result<SearchType, String> {
    match s {
        "file" => Ok(SearchType::File),
        "directory" => Ok(SearchType::Directory),
        "all" => Ok(SearchType::All),
        other => Err(format!("unknown search type '{}' (file, directory, all)", other)),
    }
}

/// Config file contents (if any) with CLI args layered on top
fn resolve_config(
    config_path: &Path,
    base_url: Option<String>,
    auth_cookie: Option<String>,
) -> Result<KdeConfig> {
    let mut config = if config_path.exists() {
        info!("loading config from {}", config_path.display());
        KdeConfig::load(config_path)?
    } else {
        KdeConfig::default()
    };

    // CLI args override config file
    if let Some(url) = base_url {
        config.base_url = url;
    }
    if let Some(cookie) = auth_cookie {
        config.auth_cookie = cookie;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(KdeConfig::default_path);

    let config = resolve_config(&config_path, cli.base_url, cli.auth_cookie)?;

    if cli.save_config {
        config.save(&config_path)?;
        info!("config saved to {}", config_path.display());
    }

    if config.base_url.is_empty() {
        anyhow::bail!("base URL is required (--base-url or config file)");
    }

    let session = initialize_kde(&config, Box::new(commands::StdoutParent))
        .context("failed to initialize session")?;

    commands::run(cli.command, &session).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "kde",
            "--base-url",
            "http://x",
            "search",
            "report",
            "--recursive",
            "--type",
            "file",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                query,
                recursive,
                pattern,
                kind,
            } => {
                assert_eq!(query, "report");
                assert!(recursive);
                assert!(pattern.is_none());
                assert_eq!(kind, Some(SearchType::File));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_save_config() {
        let cli = Cli::try_parse_from(["kde", "ls", "/", "--save-config"]).unwrap();
        assert!(cli.save_config);
        let cli = Cli::try_parse_from(["kde", "ls", "/"]).unwrap();
        assert!(!cli.save_config);
    }

    #[test]
    fn test_resolve_config_overrides_file_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        KdeConfig::new(
            "https://old.test/api",
            "old-cookie",
            vec!["https://host.test".to_string()],
        )
        .save(&path)
        .unwrap();

        let config =
            resolve_config(&path, Some("https://new.test/api".to_string()), None).unwrap();
        assert_eq!(config.base_url, "https://new.test/api");
        assert_eq!(config.auth_cookie, "old-cookie");
        assert_eq!(config.allowed_origins, vec!["https://host.test".to_string()]);

        config.save(&path).unwrap();
        assert_eq!(KdeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_resolve_config_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(
            &dir.path().join("absent.json"),
            None,
            Some("tok".to_string()),
        )
        .unwrap();
        assert!(config.base_url.is_empty());
        assert_eq!(config.auth_cookie, "tok");
    }

    #[test]
    fn test_parse_search_type_rejects_unknown() {
        assert!(parse_search_type("folder").is_err());
        assert_eq!(parse_search_type("all"), Ok(SearchType::All));
    }
}
