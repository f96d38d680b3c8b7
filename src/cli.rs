//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::auth;
use crate::client::ProductionGmailClient;
use crate::compose::{validate_forward_args, Forwarder};
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::{GmailError, Result};
use crate::labels::{validate_modify_args, LabelModifier};
use crate::outfmt::{self, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "gmail-relay")]
#[command(version = "0.2.0")]
#[command(about = "Forward Gmail messages and batch-modify their labels", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Account email to operate as (overrides config)
    #[arg(short, long)]
    pub account: Option<String>,

    /// Path to OAuth2 credentials file (overrides config)
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Directory for cached OAuth2 tokens (overrides config)
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Print results as a single JSON document
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Forward a message to another recipient with its attachments
    Forward {
        /// Message ID to forward
        #[arg(value_name = "MESSAGE_ID")]
        message_id: String,

        /// Recipient email address
        #[arg(long)]
        to: String,

        /// Optional subject (default: Fwd: original subject)
        #[arg(long)]
        subject: Option<String>,
    },

    /// Add or remove labels on a batch of messages
    Modify {
        /// Message IDs (comma-separated or repeated)
        #[arg(long)]
        ids: Vec<String>,

        /// Labels to add (comma-separated, name or ID)
        #[arg(long)]
        add_label: Vec<String>,

        /// Labels to remove (comma-separated, name or ID)
        #[arg(long)]
        remove_label: Vec<String>,

        /// Archive messages (remove from INBOX)
        #[arg(long)]
        archive: bool,
    },
}

/// Everything a command needs resolved before touching the API
struct CommandContext {
    credentials: PathBuf,
    token_cache: PathBuf,
    format: OutputFormat,
}

/// Load config and resolve account and paths, CLI flags taking precedence
async fn prepare(cli: &Cli) -> Result<CommandContext> {
    let config = Config::load(&cli.config).await?;

    let env_account = std::env::var("GMAIL_RELAY_ACCOUNT").ok();
    let account = config
        .resolve_account(cli.account.as_deref(), env_account.as_deref())
        .ok_or_else(|| {
            GmailError::InvalidArguments(
                "account is required (use --account, the config file, or GMAIL_RELAY_ACCOUNT)"
                    .to_string(),
            )
        })?;
    info!("Operating as {}", account);

    let credentials = cli
        .credentials
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.auth.credentials_path));
    let token_cache_dir = cli
        .token_cache
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.auth.token_cache_dir));
    let token_cache = auth::token_cache_file(&token_cache_dir, &account);

    Ok(CommandContext {
        credentials,
        token_cache,
        format: OutputFormat::from_flag(cli.json),
    })
}

async fn build_client(ctx: &CommandContext) -> Result<ProductionGmailClient> {
    let hub = auth::initialize_gmail_hub(&ctx.credentials, &ctx.token_cache).await?;
    Ok(ProductionGmailClient::new(hub))
}

/// Spinner for long remote operations, suppressed in JSON mode
fn working_spinner(format: OutputFormat, msg: String) -> ProgressBar {
    if format.is_json() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the `auth` subcommand
pub async fn run_auth(cli: &Cli, force: bool) -> Result<()> {
    let ctx = prepare(cli).await?;

    // Delete existing token if force flag is set
    if force && ctx.token_cache.exists() {
        tokio::fs::remove_file(&ctx.token_cache).await?;
        info!("Removed existing token cache");
    }

    // Initialize Gmail hub (will trigger OAuth flow if needed)
    let hub = auth::initialize_gmail_hub(&ctx.credentials, &ctx.token_cache).await?;

    // Test the connection - must specify scope to avoid triggering additional OAuth flow
    let (_, profile) = hub
        .users()
        .get_profile("me")
        .add_scope("https://www.googleapis.com/auth/gmail.modify")
        .doit()
        .await?;
    let address = profile.email_address.unwrap_or_default();

    if ctx.format.is_json() {
        outfmt::print_json(&serde_json::json!({
            "account": address,
            "tokenCache": ctx.token_cache.display().to_string(),
        }))?;
    } else {
        println!("Successfully authenticated with Gmail API");
        println!("Token cached at: {:?}", ctx.token_cache);
        println!("Connected to account: {}", address);
    }

    Ok(())
}

/// Run the `forward` subcommand
pub async fn run_forward(
    cli: &Cli,
    message_id: &str,
    to: &str,
    subject: Option<&str>,
) -> Result<()> {
    let ctx = prepare(cli).await?;
    validate_forward_args(message_id, to)?;

    let client = build_client(&ctx).await?;
    let forwarder = Forwarder::new(Box::new(client));

    let spinner = working_spinner(
        ctx.format,
        format!("Forwarding message {}...", message_id.trim()),
    );
    let result = forwarder.forward(message_id, to, subject).await;
    spinner.finish_and_clear();
    let outcome = result?;

    if ctx.format.is_json() {
        outfmt::print_json(&outcome)?;
    } else {
        println!(
            "Forwarded message {} to {} with {} attachment(s) (sent: {})",
            outcome.forwarded, outcome.to, outcome.attachments, outcome.sent
        );
    }

    Ok(())
}

/// Run the `modify` subcommand
pub async fn run_modify(
    cli: &Cli,
    ids: &[String],
    add_label: &[String],
    remove_label: &[String],
    archive: bool,
) -> Result<()> {
    let ctx = prepare(cli).await?;
    validate_modify_args(ids, add_label, remove_label, archive)?;

    let client = build_client(&ctx).await?;
    let modifier = LabelModifier::new(Box::new(client));
    let outcome = modifier
        .modify(ids, add_label, remove_label, archive)
        .await?;

    if ctx.format.is_json() {
        outfmt::print_json(&outcome)?;
    } else {
        println!("Modified {} message(s)", outcome.count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forward_command() {
        let cli = Cli::try_parse_from([
            "gmail-relay",
            "forward",
            "msg-123",
            "--to",
            "bob@example.com",
            "--subject",
            "Hello",
        ])
        .unwrap();

        assert!(!cli.json);
        match cli.command {
            Commands::Forward {
                message_id,
                to,
                subject,
            } => {
                assert_eq!(message_id, "msg-123");
                assert_eq!(to, "bob@example.com");
                assert_eq!(subject.as_deref(), Some("Hello"));
            }
            _ => panic!("expected forward command"),
        }
    }

    #[test]
    fn test_parse_forward_requires_to() {
        let result = Cli::try_parse_from(["gmail-relay", "forward", "msg-123"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_modify_command_with_repeats() {
        let cli = Cli::try_parse_from([
            "gmail-relay",
            "--json",
            "modify",
            "--ids",
            "m1,m2",
            "--ids",
            "m3",
            "--add-label",
            "Work",
            "--archive",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Modify {
                ids,
                add_label,
                remove_label,
                archive,
            } => {
                assert_eq!(ids, vec!["m1,m2".to_string(), "m3".to_string()]);
                assert_eq!(add_label, vec!["Work".to_string()]);
                assert!(remove_label.is_empty());
                assert!(archive);
            }
            _ => panic!("expected modify command"),
        }
    }

    #[test]
    fn test_parse_global_defaults() {
        let cli = Cli::try_parse_from(["gmail-relay", "auth"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("gmail-relay.toml"));
        assert!(cli.account.is_none());
        assert!(cli.credentials.is_none());
        assert!(cli.token_cache.is_none());
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Auth { force: false }));
    }

    #[test]
    fn test_parse_account_and_paths() {
        let cli = Cli::try_parse_from([
            "gmail-relay",
            "--account",
            "alice@example.com",
            "--credentials",
            "/tmp/creds.json",
            "--token-cache",
            "/tmp/tokens",
            "auth",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.account.as_deref(), Some("alice@example.com"));
        assert_eq!(cli.credentials, Some(PathBuf::from("/tmp/creds.json")));
        assert_eq!(cli.token_cache, Some(PathBuf::from("/tmp/tokens")));
        assert!(matches!(cli.command, Commands::Auth { force: true }));
    }
}
