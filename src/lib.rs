//! Gmail Relay
//!
//! A command-line tool for forwarding Gmail messages and batch-modifying
//! their labels through the Gmail API.
//!
//! # Overview
//!
//! This library provides the pieces behind the `gmail-relay` binary:
//! - **Authentication**: OAuth2 authentication with per-account token caching
//! - **Forwarding**: Fetch a message, quote its body, re-attach its files,
//!   and send it to a new recipient as RFC 2822 mail
//! - **Label Modification**: Resolve label names to IDs and apply batched
//!   add/remove/archive operations
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_relay::{auth, client::ProductionGmailClient, compose::Forwarder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Authenticate
//!     let hub = auth::initialize_gmail_hub(
//!         "credentials.json".as_ref(),
//!         ".gmail-relay/token-user@example.com.json".as_ref(),
//!     )
//!     .await?;
//!
//!     // Forward a message with its attachments
//!     let forwarder = Forwarder::new(Box::new(ProductionGmailClient::new(hub)));
//!     let outcome = forwarder.forward("18c2f0a9b3d4e5f6", "bob@example.com", None).await?;
//!     println!("sent as {}", outcome.sent);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`cli`] - Command-line interface and command runners
//! - [`client`] - Gmail API client behind a narrow async trait
//! - [`compose`] - Forwarded message assembly and sending
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`labels`] - Label name resolution and batch modification
//! - [`message`] - Message payload traversal and body selection
//! - [`outfmt`] - Text and JSON output formatting

pub mod auth;
pub mod cli;
pub mod client;
pub mod compose;
pub mod config;
pub mod error;
pub mod labels;
pub mod message;
pub mod outfmt;

// Re-export commonly used types for convenience
pub use error::{GmailError, Result};

// Client trait and API types
pub use client::{GmailClient, LabelInfo, ProductionGmailClient, SentMessage};

// Message payload types
pub use message::{AttachmentInfo, BodySelection, Header, MessagePart};

// Forward and modify orchestration
pub use compose::{ForwardOutcome, Forwarder};
pub use labels::{LabelModifier, ModifyOutcome};

// Config types
pub use config::{AccountConfig, AuthConfig, Config};

// CLI types (for binary usage)
pub use cli::{Cli, Commands};
