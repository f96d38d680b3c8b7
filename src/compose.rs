//! Forwarded message composition
//!
//! Rebuilds an existing message as an outgoing forward: quotes the original
//! headers in a preamble above the selected body text, re-fetches and embeds
//! the original attachments, and serializes the whole thing as an RFC2822
//! message with CRLF line endings. One attachment failing to download must
//! not abort the send; the message goes out with whatever could be fetched.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::GmailClient;
use crate::error::{GmailError, Result};
use crate::message::{best_body_for_display, collect_attachments};

/// Attachment successfully re-fetched and ready to embed
#[derive(Debug, Clone)]
struct EmbeddedAttachment {
    filename: String,
    mime_type: String,
    data: Vec<u8>,
}

/// Outcome of one forward operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardOutcome {
    pub sent: String,
    pub thread_id: String,
    pub to: String,
    pub subject: String,
    pub forwarded: String,
    /// Number of attachments actually embedded in the outgoing message
    pub attachments: usize,
}

/// Check forward arguments before any remote work, returning them trimmed
///
/// Also used by the CLI so bad invocations fail before the OAuth flow runs.
pub fn validate_forward_args(message_id: &str, to: &str) -> Result<(String, String)> {
    let message_id = message_id.trim();
    if message_id.is_empty() {
        return Err(GmailError::InvalidArguments(
            "message ID is required".to_string(),
        ));
    }

    let to = to.trim();
    if to.is_empty() {
        return Err(GmailError::InvalidArguments("--to is required".to_string()));
    }

    Ok((message_id.to_string(), to.to_string()))
}

/// Composes and sends forwarded messages
pub struct Forwarder {
    client: Box<dyn GmailClient>,
}

impl Forwarder {
    pub fn new(client: Box<dyn GmailClient>) -> Self {
        Self { client }
    }

    /// Forward a message to a new recipient
    ///
    /// `subject_override` is used verbatim when non-empty; otherwise the
    /// subject becomes `Fwd: ` plus the original subject. Arguments are
    /// validated before any remote call.
    pub async fn forward(
        &self,
        message_id: &str,
        to: &str,
        subject_override: Option<&str>,
    ) -> Result<ForwardOutcome> {
        let (message_id, to) = validate_forward_args(message_id, to)?;

        let original = self
            .client
            .fetch_message(&message_id)
            .await
            .map_err(|e| GmailError::MessageFetch(e.to_string()))?;

        let original_subject = original.header("Subject");
        let original_from = original.header("From");
        let original_to = original.header("To");
        let original_date = original.header("Date");

        let subject = match subject_override {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => format!("Fwd: {}", original_subject),
        };

        let body = best_body_for_display(&original);
        if body.from_html {
            debug!("No plain text part in {}, quoting raw HTML body", message_id);
        }
        let forward_body = forward_preamble(
            &original_from,
            &original_date,
            &original_subject,
            &original_to,
            &body.text,
        );

        // Re-fetch each original attachment; a failed download is reported
        // and skipped, never fatal
        let descriptors = collect_attachments(&original);
        let mut embedded = Vec::with_capacity(descriptors.len());
        for att in &descriptors {
            match self
                .client
                .fetch_attachment(&message_id, &att.attachment_id)
                .await
            {
                Ok(data) => embedded.push(EmbeddedAttachment {
                    filename: att.filename.clone(),
                    mime_type: att.mime_type.clone(),
                    data,
                }),
                Err(e) => {
                    eprintln!("Warning: failed to attach {}: {}", att.filename, e);
                }
            }
        }

        let raw = serialize_message(&to, &subject, &forward_body, &embedded);
        let sent = self
            .client
            .send_raw(raw)
            .await
            .map_err(|e| GmailError::MessageSend(e.to_string()))?;

        info!(
            "Forwarded {} to {} with {} of {} attachment(s)",
            message_id,
            to,
            embedded.len(),
            descriptors.len()
        );

        Ok(ForwardOutcome {
            sent: sent.id,
            thread_id: sent.thread_id,
            attachments: embedded.len(),
            to,
            subject,
            forwarded: message_id,
        })
    }
}

/// Quote the original message's routing headers above its body
fn forward_preamble(from: &str, date: &str, subject: &str, to: &str, body: &str) -> String {
    format!(
        "---------- Forwarded message ----------\nFrom: {}\nDate: {}\nSubject: {}\nTo: {}\n\n{}",
        from, date, subject, to, body
    )
}

/// Assemble the raw RFC2822 message
///
/// With no embedded attachments the message is a flat text/plain body.
/// Otherwise it becomes multipart/mixed under a fresh boundary, text part
/// first, one part per attachment.
fn serialize_message(
    to: &str,
    subject: &str,
    body: &str,
    attachments: &[EmbeddedAttachment],
) -> Vec<u8> {
    if attachments.is_empty() {
        serialize_flat(to, subject, body)
    } else {
        serialize_multipart(to, subject, body, attachments, &fresh_boundary())
    }
}

fn serialize_flat(to: &str, subject: &str, body: &str) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.extend_from_slice(format!("To: {}\r\n", to).as_bytes());
    raw.extend_from_slice(format!("Subject: {}\r\n", subject).as_bytes());
    raw.extend_from_slice(b"Content-Type: text/plain; charset=utf-8\r\n");
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(body.as_bytes());
    raw
}

fn serialize_multipart(
    to: &str,
    subject: &str,
    body: &str,
    attachments: &[EmbeddedAttachment],
    boundary: &str,
) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.extend_from_slice(format!("To: {}\r\n", to).as_bytes());
    raw.extend_from_slice(format!("Subject: {}\r\n", subject).as_bytes());
    raw.extend_from_slice(
        format!("Content-Type: multipart/mixed; boundary=\"{}\"\r\n", boundary).as_bytes(),
    );
    raw.extend_from_slice(b"\r\n");

    raw.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    raw.extend_from_slice(b"Content-Type: text/plain; charset=utf-8\r\n");
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(body.as_bytes());
    raw.extend_from_slice(b"\r\n");

    for att in attachments {
        raw.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        raw.extend_from_slice(format!("Content-Type: {}\r\n", att.mime_type).as_bytes());
        raw.extend_from_slice(
            format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n",
                att.filename
            )
            .as_bytes(),
        );
        raw.extend_from_slice(b"Content-Transfer-Encoding: base64\r\n");
        raw.extend_from_slice(b"\r\n");
        raw.extend_from_slice(STANDARD.encode(&att.data).as_bytes());
        raw.extend_from_slice(b"\r\n");
    }

    raw.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    raw
}

/// Generate a boundary token that cannot collide with message content
/// in practice
fn fresh_boundary() -> String {
    Uuid::new_v4().simple().to_string()
}
