use crate::domain::directory::Address;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Chat bot that drafts checks with operators and collects recipient approval.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Bot API token
    #[arg(long, env = "BOT_API_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Comma-separated chat ids allowed to run operator commands
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    pub operators: Vec<Address>,

    /// JSON file holding the recipient directory
    #[arg(long, env = "DIRECTORY_PATH", default_value = "users.json")]
    pub directory: PathBuf,

    /// CSV file recording dispatched checks. Kept in memory when omitted.
    #[arg(long, env = "SHEET_PATH")]
    pub sheet: Option<PathBuf>,

    /// Bot API endpoint
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub api_url: String,

    /// Long-poll timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub poll_timeout: u64,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_operators_and_defaults() {
        let config = Config::try_parse_from([
            "checkrelay",
            "--token",
            "t",
            "--operators",
            "11, 22",
        ])
        .unwrap();

        assert_eq!(config.operators, vec![Address(11), Address(22)]);
        assert_eq!(config.directory, PathBuf::from("users.json"));
        assert_eq!(config.sheet, None);
        assert_eq!(config.poll_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_non_numeric_operator() {
        let parsed = Config::try_parse_from(["checkrelay", "--token", "t", "--operators", "abc"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_sheet_path() {
        let config = Config::try_parse_from([
            "checkrelay",
            "--token",
            "t",
            "--operators",
            "1",
            "--sheet",
            "checks.csv",
        ])
        .unwrap();
        assert_eq!(config.sheet, Some(PathBuf::from("checks.csv")));
    }
}
