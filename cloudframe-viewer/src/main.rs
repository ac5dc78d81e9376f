use anyhow::{bail, Context};
use clap::Parser;
use cloudframe_io::ViewerConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "cloudframe.toml";

#[derive(Parser, Debug)]
#[command(
    name = "cloudframe-viewer",
    about = "Browse frame-indexed point cloud data and inspect it in 3D",
    version
)]
struct Cli {
    /// Directory holding one numbered sub-directory per frame
    #[arg(short, long, value_name = "DIR")]
    data_root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frame id to open first
    #[arg(short, long, value_name = "ID")]
    start_frame: Option<u32>,

    /// Write matched/unmatched map dense point listings into each frame directory
    #[arg(long)]
    write_match_reports: bool,

    /// Choose the data root with a folder dialog
    #[arg(long, conflicts_with = "data_root")]
    pick_root: bool,
}

impl Cli {
    /// `--config`, or `cloudframe.toml` in the working directory when present
    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            fallback.is_file().then_some(fallback)
        })
    }

    /// Load the config file, if any, and apply command line overrides
    fn resolve_config(&self) -> anyhow::Result<ViewerConfig> {
        let config = match self.config_path() {
            Some(path) => ViewerConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    fn apply_overrides(&self, mut config: ViewerConfig) -> ViewerConfig {
        if let Some(root) = &self.data_root {
            config.data_root = root.clone();
        }
        if self.write_match_reports {
            config.write_match_reports = true;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = cli.resolve_config()?;

    if cli.pick_root {
        let picked = rfd::FileDialog::new()
            .set_title("Select data directory")
            .set_directory(&config.data_root)
            .pick_folder();
        match picked {
            Some(dir) => config.data_root = dir,
            None => {
                info!("No data directory selected");
                return Ok(());
            }
        }
    }

    if !config.data_root.is_dir() {
        bail!("data directory {} does not exist", config.data_root.display());
    }
    info!("Opening {}", config.data_root.display());

    let data_root = config.data_root.clone();
    cloudframe_visualization::run_viewer(config, cli.start_frame)
        .with_context(|| format!("viewer failed for {}", data_root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "cloudframe-viewer",
            "--data-root",
            "/tmp/run7",
            "--start-frame",
            "12",
            "--write-match-reports",
        ])
        .unwrap();
        assert_eq!(cli.start_frame, Some(12));

        let config = cli.apply_overrides(ViewerConfig::default());
        assert_eq!(config.data_root, PathBuf::from("/tmp/run7"));
        assert!(config.write_match_reports);
    }

    #[test]
    fn test_cli_overrides_win_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "data_root = \"/srv/frames\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "cloudframe-viewer",
            "--config",
            path.to_str().unwrap(),
            "--data-root",
            "/tmp/run7",
        ])
        .unwrap();
        assert_eq!(cli.config_path(), Some(path.clone()));

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.data_root, PathBuf::from("/tmp/run7"));
        assert!(!config.write_match_reports);
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "data_root = \"/srv/frames\"\n[render]\npoint_size = 5.0\n").unwrap();

        let cli = Cli::try_parse_from(["cloudframe-viewer", "--config", path.to_str().unwrap()]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.data_root, PathBuf::from("/srv/frames"));
        assert_eq!(config.render.point_size, 5.0);
        assert!(!config.write_match_reports);
    }

    #[test]
    fn test_pick_root_conflicts_with_data_root() {
        let result = Cli::try_parse_from(["cloudframe-viewer", "--pick-root", "--data-root", "x"]);
        assert!(result.is_err());
    }
}
