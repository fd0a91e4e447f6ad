// Logging module - console diagnostics, request dumps and JSONL run logs
pub mod request_logger;
pub mod run_logger;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub use request_logger::{log_request, log_request_to_file, log_response};
pub use run_logger::{RunEntry, RunLogger};

/// Environment variable overriding the directory request logs are written to
pub const LOG_DIR_ENV: &str = "AGENTDESK_LOG_DIR";

/// Initialise the `log` facade with env_logger.
///
/// `RUST_LOG` wins when set; otherwise the filter is `debug` in verbose mode and
/// `level` (e.g. the configured `LOG_LEVEL`) otherwise.
pub fn init_logging(level: &str, verbose: bool) {
    let default_filter = if verbose {
        "debug".to_string()
    } else {
        level.to_lowercase()
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .try_init();
}

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Get or create the logs directory (`logs/` unless `AGENTDESK_LOG_DIR` is set)
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = std::env::var(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"));

    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;
    }

    Ok(logs_dir)
}

/// Mask an API key for display, keeping the first 10 characters
pub fn mask_api_key(api_key: &str) -> String {
    format!("{}***", api_key.chars().take(10).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_multibyte() {
        assert_eq!(safe_truncate("short", 10), "short");
        assert_eq!(safe_truncate("héllo wörld", 8), "héllo...");
        assert_eq!(safe_truncate("abcdef", 2), "...");
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1234567***");
        assert_eq!(mask_api_key("abc"), "abc***");
    }
}
