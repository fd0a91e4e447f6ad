use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;

use crate::{get_logs_dir, mask_api_key, safe_truncate};

const CONSOLE_BODY_LIMIT: usize = 5000;

fn describe_url(url: &str) -> Vec<(&'static str, String)> {
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            let port = parsed.port().map(|p| p.to_string()).unwrap_or_else(|| {
                if parsed.scheme() == "https" {
                    "443 (default)".to_string()
                } else {
                    "80 (default)".to_string()
                }
            });
            vec![
                ("URL", url.to_string()),
                ("Host", parsed.host_str().unwrap_or("unknown").to_string()),
                ("Port", port),
                ("Scheme", parsed.scheme().to_string()),
            ]
        }
        Err(_) => vec![("URL", url.to_string())],
    }
}

/// Log an outbound LLM request to the console
pub fn log_request(url: &str, body: &serde_json::Value, api_key: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());

    for (label, value) in describe_url(url) {
        println!("{}: {}", label.bright_yellow(), value);
    }

    println!("\n{}", "Headers:".bright_yellow());
    println!("  Content-Type: application/json");
    println!("  Authorization: Bearer {}", mask_api_key(api_key));

    println!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(body) {
        Ok(json) if json.chars().count() > CONSOLE_BODY_LIMIT => {
            println!("{}", safe_truncate(&json, CONSOLE_BODY_LIMIT));
            println!(
                "\n{}",
                format!("... (truncated, total {} bytes)", json.len()).bright_black()
            );
        }
        Ok(json) => println!("{}", json),
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }

    println!("{}", "═".repeat(80).bright_cyan());
    println!();
}

/// Build the text written to a request log file
pub fn format_request_log(
    url: &str,
    body: &serde_json::Value,
    model: &str,
    api_key: &str,
    timestamp: i64,
) -> String {
    let mut log_content = String::new();
    log_content.push_str("HTTP REQUEST LOG\n");
    log_content.push_str("================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", timestamp));
    log_content.push_str(&format!("Model: {}\n\n", model));

    for (label, value) in describe_url(url) {
        log_content.push_str(&format!("{}: {}\n", label, value));
    }
    log_content.push('\n');

    log_content.push_str("Headers:\n");
    log_content.push_str("  Content-Type: application/json\n");
    log_content.push_str(&format!("  Authorization: Bearer {}\n\n", mask_api_key(api_key)));

    log_content.push_str("Request Body:\n");
    match serde_json::to_string_pretty(body) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => log_content.push_str(&format!("Error serializing request: {}\n", e)),
    }
    log_content
}

/// Log an outbound LLM request to `logs/req-<ts>-<model>.txt`
pub fn log_request_to_file(
    url: &str,
    body: &serde_json::Value,
    model: &str,
    api_key: &str,
) -> Result<std::path::PathBuf> {
    let logs_dir = get_logs_dir()?;
    let timestamp = chrono::Utc::now().timestamp();

    let model_name = model.replace('/', "-");
    let filename = format!("req-{}-{}.txt", timestamp, model_name);
    let file_path = logs_dir.join(&filename);

    fs::write(
        &file_path,
        format_request_log(url, body, model, api_key, timestamp),
    )
    .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    println!("{}", format!("📝 Request logged to: {}", filename).bright_blue());
    log::debug!("request log written to {}", file_path.display());

    Ok(file_path)
}

/// Log an LLM response to the console
pub fn log_response(status: u16, body: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_green());
    println!("{}", "📥 HTTP RESPONSE DEBUG".bright_green().bold());
    println!("{}", "═".repeat(80).bright_green());
    println!("{}: {}", "Status".bright_yellow(), status);

    println!("\n{}", "Response Body:".bright_yellow());
    let pretty = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string());
    if pretty.chars().count() > CONSOLE_BODY_LIMIT {
        println!("{}", safe_truncate(&pretty, CONSOLE_BODY_LIMIT));
        println!(
            "\n{}",
            format!("... (truncated, total {} bytes)", pretty.len()).bright_black()
        );
    } else {
        println!("{}", pretty);
    }

    println!("{}", "═".repeat(80).bright_green());
    println!();
}
