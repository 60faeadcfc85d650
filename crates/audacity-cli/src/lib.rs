//! Shared plumbing for the Audacity command-line scripts
//!
//! Every binary takes the same connection and logging flags, installs the
//! same subscriber, and opens its session the same way.

use anyhow::{Context, Result};
use audacity_bridge::SessionConfig;
use audacity_scripting::AudacityScripting;
use clap::Args;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Flags shared by every script
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Directory holding the scripting FIFOs (ignored on Windows)
    #[arg(long, env = "AUDACITY_PIPE_DIR")]
    pub pipe_dir: Option<PathBuf>,

    /// Give up on a reply after this many seconds
    #[arg(long, env = "AUDACITY_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log wire traffic
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            pipe_dir: self.pipe_dir.clone(),
            response_timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Install the global subscriber
    pub fn init_logging(&self) -> Result<()> {
        let level = if self.verbose { Level::DEBUG } else { Level::INFO };
        let filter = EnvFilter::from_default_env().add_directive(level.into());

        match &self.log_dir {
            Some(dir) => {
                let path = log_file_path(dir);
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {:?}", dir))?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open log file {:?}", path))?;

                let subscriber = FmtSubscriber::builder()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .finish();
                tracing::subscriber::set_global_default(subscriber)?;
            }
            None => {
                let subscriber = FmtSubscriber::builder()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .finish();
                tracing::subscriber::set_global_default(subscriber)?;
            }
        }
        Ok(())
    }

    /// Open a scripting session with these flags
    pub async fn connect(&self) -> Result<AudacityScripting> {
        let scripting = AudacityScripting::connect(self.session_config())
            .await
            .context("Failed to connect to Audacity")?;
        info!("Connected to Audacity");
        Ok(scripting)
    }
}

/// `<dir>/<YYYY-mm-dd_HH-MM-SS>.log` for the current local time
pub fn log_file_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("{}.log", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn test_session_config_from_flags() {
        let cli = Cli::try_parse_from(["test", "--pipe-dir", "/run/user/1000", "--timeout-secs", "5"])
            .unwrap();
        let config = cli.common.session_config();
        assert_eq!(config.pipe_dir, Some(PathBuf::from("/run/user/1000")));
        assert_eq!(config.response_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_log_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file_path(dir.path());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(path.starts_with(dir.path()));
        assert!(name.ends_with(".log"));
        // 2020-03-06_21-15-00.log
        assert_eq!(name.len(), 23);
    }
}
