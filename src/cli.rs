//! Command-line interface.
//!
//! One invocation runs one sweep. Flags override the config file.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "stargazer",
    version,
    about = "Star every repository on a GitHub user's profile through a real browser session"
)]
pub struct Cli {
    /// Repository listing URL to sweep
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
    /// Saved session profile name (defaults to the target host)
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,
    /// Delay after each successful star, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,
    /// Run the browser without a window (log in with a headful run first)
    #[arg(long)]
    pub headless: bool,
    /// Walk the listing and report what would be starred without clicking
    #[arg(long)]
    pub dry_run: bool,
    /// Config file path
    #[arg(long, value_name = "PATH", env = "STARGAZER_CONFIG")]
    pub config: Option<PathBuf>,
    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
    /// Verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Config file path with `~` expanded.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
    }

    /// Fold CLI flags into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.url {
            config.url = url.clone();
        }
        if let Some(ref profile) = self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if self.headless {
            config.headless = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "stargazer",
            "--url",
            "https://github.com/torvalds?tab=repositories",
            "--delay-ms",
            "500",
            "--headless",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.url, "https://github.com/torvalds?tab=repositories");
        assert_eq!(config.delay_ms, 500);
        assert!(config.headless);
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let cli = Cli::parse_from(["stargazer"]);
        let mut config = Config::default();
        let before = config.clone();
        cli.apply_overrides(&mut config);
        assert_eq!(config.url, before.url);
        assert_eq!(config.delay_ms, before.delay_ms);
        assert!(!config.headless);
    }

    #[test]
    fn config_path_expands_tilde() {
        let cli = Cli::parse_from(["stargazer", "--config", "~/custom.toml"]);
        let path = cli.config_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
    }
}
