use crate::api::{ApiClient, ChatResponse};
use crate::config::Config;
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Send a single message and print the reply
pub async fn send_message(
    config: &Config,
    message: &str,
    conversation_id: Option<String>,
) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Message cannot be empty");
    }

    let client = ApiClient::new(config)?;
    let request = client.request_for(message.to_string(), conversation_id);
    let reply = client
        .send(&request)
        .await
        .with_context(|| format!("No reply from {}", client.endpoint()))?;

    print!("{}", format_reply(&reply));
    Ok(())
}

fn format_reply(reply: &ChatResponse) -> String {
    let mut out = format!("🤖 {}\n", reply.response);

    if !reply.actions().is_empty() {
        out.push_str("\nActions taken:\n");
        for action in reply.actions() {
            out.push_str(&format!("  ✓ {}\n", action));
        }
    }

    out.push_str(&format!("\n💬 Conversation: {}\n", reply.conversation_id));
    out
}

/// Print the resolved configuration
pub fn show_config(config: &Config, path: &Path) -> Result<()> {
    let status = if path.exists() { "" } else { " (not created, using defaults)" };
    println!("📄 Config file: {}{}", path.display(), status);
    println!("{}", "=".repeat(50));

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", content.trim_end());
    Ok(())
}

/// Write a default config file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("⚠️  Config already exists at {}", path.display());
        println!("Run 'taskchat init --force' to overwrite it.");
        return Ok(());
    }

    Config::default().save_to(path)?;
    println!("✨ Wrote default config to {}", path.display());
    println!("💡 Set 'endpoint' to your assistant's full URL, e.g. https://example.com/chat");
    Ok(())
}
