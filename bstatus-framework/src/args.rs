//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "bstatus", about = "Periodic status-line generator for terminals and i3bar")]
pub struct StatusArgs {
    /// Path to configuration file (default: ~/.bstatus/config.json5).
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl StatusArgs {
    /// Parse CLI arguments from the process environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The configuration path, falling back to [`default_config_path`].
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

/// `$HOME/.bstatus/config.json5`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".bstatus")
        .join("config.json5")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_config() {
        let args = StatusArgs::try_parse_from(["bstatus", "my.json5", "--log-level", "debug"]).unwrap();
        assert_eq!(args.config_path(), PathBuf::from("my.json5"));
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_default_config() {
        let args = StatusArgs::try_parse_from(["bstatus"]).unwrap();
        assert!(args.config_path().ends_with(".bstatus/config.json5"));
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn test_rejects_extra_positionals() {
        assert!(StatusArgs::try_parse_from(["bstatus", "a.json5", "b.json5"]).is_err());
    }
}
