//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gr_core::{DEFAULT_TASK_PATTERN, SessionConfig};
use gr_git::IdentityKey;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Largest gap between two commits of the same session, in minutes.
    pub gap_threshold_minutes: u32,
    /// Minimum hours credited to a session, in minutes.
    pub min_session_minutes: u32,
    /// Regex matching task keys in commit messages.
    pub task_pattern: String,
    /// File listing external developers to exclude.
    pub externals_file: PathBuf,
    /// Destination of CSV output.
    pub csv_file: PathBuf,
    /// Author field that identifies a developer.
    pub identity: IdentityKey,
    /// Per-repository timeout for `--update`, in seconds.
    pub fetch_timeout_secs: u64,
    /// Read every ref instead of local branches only.
    pub all_refs: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gap_threshold_minutes", &self.gap_threshold_minutes)
            .field("min_session_minutes", &self.min_session_minutes)
            .field("task_pattern", &self.task_pattern)
            .field("externals_file", &self.externals_file)
            .field("csv_file", &self.csv_file)
            .field("identity", &self.identity)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("all_refs", &self.all_refs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let sessions = SessionConfig::default();
        Self {
            gap_threshold_minutes: u32::try_from(sessions.gap_threshold().num_minutes())
                .unwrap_or(180),
            min_session_minutes: u32::try_from(sessions.min_session().num_minutes())
                .unwrap_or(30),
            task_pattern: DEFAULT_TASK_PATTERN.to_string(),
            externals_file: PathBuf::from("externals.txt"),
            csv_file: PathBuf::from("git_report.csv"),
            identity: IdentityKey::default(),
            fetch_timeout_secs: 300,
            all_refs: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (GIT_REPORT_*)
        figment = figment.merge(Env::prefixed("GIT_REPORT_"));

        figment.extract()
    }

    /// Applies command-line flags, which take precedence over every file and
    /// environment source.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(minutes) = cli.gap_threshold {
            self.gap_threshold_minutes = minutes;
        }
        if let Some(minutes) = cli.min_session {
            self.min_session_minutes = minutes;
        }
        if let Some(pattern) = &cli.task_pattern {
            self.task_pattern.clone_from(pattern);
        }
        if let Some(path) = &cli.externals_file {
            self.externals_file.clone_from(path);
        }
        if let Some(path) = &cli.csv_file {
            self.csv_file.clone_from(path);
        }
        if let Some(identity) = cli.identity {
            self.identity = identity;
        }
        if let Some(secs) = cli.timeout {
            self.fetch_timeout_secs = secs;
        }
        if cli.all_refs {
            self.all_refs = true;
        }
    }
}

/// Returns the platform-specific config directory for git-report.
///
/// On Linux: `~/.config/git-report`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("git-report"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gap_threshold_minutes, 180);
        assert_eq!(config.min_session_minutes, 30);
        assert_eq!(config.task_pattern, DEFAULT_TASK_PATTERN);
        assert_eq!(config.csv_file, PathBuf::from("git_report.csv"));
        assert_eq!(config.externals_file, PathBuf::from("externals.txt"));
        assert_eq!(config.identity, IdentityKey::Name);
        assert_eq!(config.fetch_timeout_secs, 300);
        assert!(!config.all_refs);
    }

    #[test]
    fn test_dirs_config_path_ends_with_app_name() {
        if let Some(path) = dirs_config_path() {
            assert_eq!(path.file_name().unwrap(), "git-report");
        }
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "gap_threshold_minutes = 90\nidentity = \"email\"\ntask_pattern = 'PROJ-\\d+'"
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.gap_threshold_minutes, 90);
        assert_eq!(config.identity, IdentityKey::Email);
        assert_eq!(config.task_pattern, r"PROJ-\d+");
        assert_eq!(config.min_session_minutes, 30);
    }

    #[test]
    fn test_load_from_rejects_bad_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "identity = \"login\"").unwrap();

        assert!(Config::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_cli_flags_take_precedence() {
        let cli = Cli::try_parse_from([
            "git-report",
            "--gap-threshold",
            "60",
            "--min-session",
            "15",
            "--identity",
            "email",
            "--csv-file",
            "out.csv",
            "--all-refs",
            ".",
        ])
        .unwrap();

        let mut config = Config::default();
        config.apply_cli(&cli);

        assert_eq!(config.gap_threshold_minutes, 60);
        assert_eq!(config.min_session_minutes, 15);
        assert_eq!(config.identity, IdentityKey::Email);
        assert_eq!(config.csv_file, PathBuf::from("out.csv"));
        assert!(config.all_refs);
        assert_eq!(config.task_pattern, DEFAULT_TASK_PATTERN);
    }

    #[test]
    fn test_absent_cli_flags_keep_config() {
        let cli = Cli::try_parse_from(["git-report", "."]).unwrap();
        let mut config = Config {
            gap_threshold_minutes: 45,
            all_refs: true,
            ..Config::default()
        };
        config.apply_cli(&cli);

        assert_eq!(config.gap_threshold_minutes, 45);
        assert!(config.all_refs);
    }
}
