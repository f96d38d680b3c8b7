//! Gmail API client behind a narrow async trait.
//!
//! The trait carries exactly the remote capabilities the tool needs: fetch a
//! message tree, fetch one attachment, submit a raw message, list labels and
//! batch-modify labels. Keeping the boundary this small lets tests swap in a
//! mock and exercise composition and label resolution without any network.
//! Retry and timeout policy deliberately live outside this layer; errors are
//! classified (see [`crate::error`]) and surfaced as-is.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use google_gmail1::{
    api::{BatchModifyMessagesRequest, Message},
    hyper_rustls, hyper_util, Gmail,
};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use crate::error::{GmailError, Result};
use crate::message::{Header, MessagePart};

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// Identifiers the API assigned to a sent message
#[derive(Debug, Clone, Default)]
pub struct SentMessage {
    pub id: String,
    pub thread_id: String,
}

/// Trait defining Gmail operations, kept narrow for easier testing
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// Fetch a message's full MIME part tree
    async fn fetch_message(&self, id: &str) -> Result<MessagePart>;

    /// Fetch the content of one attachment of a message
    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>>;

    /// Submit a fully assembled RFC2822 message for delivery
    async fn send_raw(&self, raw: Vec<u8>) -> Result<SentMessage>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Add and remove labels on a batch of messages
    async fn batch_modify(
        &self,
        message_ids: &[String],
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()>;
}

/// Production Gmail client over the generated API bindings.
///
/// One hub, no shared state between calls. Every call attaches the OAuth
/// scope it needs and maps binding errors through [`GmailError`].
pub struct ProductionGmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>,
}

impl ProductionGmailClient {
    pub fn new(
        hub: Gmail<
            hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        >,
    ) -> Self {
        Self { hub }
    }
}

/// Convert the API part shape into the crate's owned tree.
///
/// The generated bindings hand body payloads over as decoded bytes; the tree
/// keeps the wire encoding (URL-safe base64) so that traversal code owns
/// every decode decision, including the skip-on-failure rule.
fn part_from_api(part: google_gmail1::api::MessagePart) -> MessagePart {
    let headers = part
        .headers
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some(Header { name, value }),
            _ => None,
        })
        .collect();

    let (body_data, attachment_id) = match part.body {
        Some(body) => (
            body.data.map(|bytes| URL_SAFE_NO_PAD.encode(bytes)),
            body.attachment_id,
        ),
        None => (None, None),
    };

    MessagePart {
        mime_type: part.mime_type.unwrap_or_default(),
        filename: part.filename.unwrap_or_default(),
        headers,
        body_data,
        attachment_id,
        parts: part
            .parts
            .unwrap_or_default()
            .into_iter()
            .map(part_from_api)
            .collect(),
    }
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn fetch_message(&self, id: &str) -> Result<MessagePart> {
        debug!("Fetching message {} in full format", id);
        let (_, msg) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("full")
            .add_scope("https://www.googleapis.com/auth/gmail.modify")
            .doit()
            .await?;

        let payload = msg
            .payload
            .ok_or_else(|| GmailError::ApiError("Message response carried no payload".to_string()))?;

        Ok(part_from_api(payload))
    }

    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>> {
        debug!(
            "Fetching attachment {} of message {}",
            attachment_id, message_id
        );
        let (_, body) = self
            .hub
            .users()
            .messages_attachments_get("me", message_id, attachment_id)
            .add_scope("https://www.googleapis.com/auth/gmail.modify")
            .doit()
            .await?;

        body.data
            .ok_or_else(|| GmailError::ApiError("Attachment response carried no data".to_string()))
    }

    async fn send_raw(&self, raw: Vec<u8>) -> Result<SentMessage> {
        debug!("Submitting composed message ({} bytes)", raw.len());
        let mime_type = "message/rfc822"
            .parse()
            .map_err(|_| GmailError::Unknown("Invalid upload MIME type".to_string()))?;

        let (_, sent) = self
            .hub
            .users()
            .messages_send(Message::default(), "me")
            .add_scope("https://www.googleapis.com/auth/gmail.modify")
            .upload(Cursor::new(raw), mime_type)
            .await?;

        Ok(SentMessage {
            id: sent.id.unwrap_or_default(),
            thread_id: sent.thread_id.unwrap_or_default(),
        })
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        debug!("Calling Gmail API to list labels...");
        let (_, response) = self
            .hub
            .users()
            .labels_list("me")
            .add_scope("https://www.googleapis.com/auth/gmail.labels")
            .doit()
            .await?;

        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn batch_modify(
        &self,
        message_ids: &[String],
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }

        // The API caps batchModify at 1000 ids per call
        const BATCH_SIZE: usize = 1000;

        let add_labels = if add_label_ids.is_empty() {
            None
        } else {
            Some(add_label_ids.to_vec())
        };

        let remove_labels = if remove_label_ids.is_empty() {
            None
        } else {
            Some(remove_label_ids.to_vec())
        };

        for chunk in message_ids.chunks(BATCH_SIZE) {
            let request = BatchModifyMessagesRequest {
                ids: Some(chunk.to_vec()),
                add_label_ids: add_labels.clone(),
                remove_label_ids: remove_labels.clone(),
            };

            self.hub
                .users()
                .messages_batch_modify(request, "me")
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await?;
        }

        Ok(())
    }
}

// Implement GmailClient for Arc<ProductionGmailClient> to allow shared ownership
#[async_trait]
impl GmailClient for Arc<ProductionGmailClient> {
    async fn fetch_message(&self, id: &str) -> Result<MessagePart> {
        self.as_ref().fetch_message(id).await
    }

    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>> {
        self.as_ref().fetch_attachment(message_id, attachment_id).await
    }

    async fn send_raw(&self, raw: Vec<u8>) -> Result<SentMessage> {
        self.as_ref().send_raw(raw).await
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.as_ref().list_labels().await
    }

    async fn batch_modify(
        &self,
        message_ids: &[String],
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        self.as_ref()
            .batch_modify(message_ids, add_label_ids, remove_label_ids)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_gmail1::api;

    fn api_header(name: &str, value: &str) -> api::MessagePartHeader {
        api::MessagePartHeader {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn test_part_from_api_reencodes_body_bytes() {
        let part = api::MessagePart {
            mime_type: Some("text/plain".to_string()),
            body: Some(api::MessagePartBody {
                data: Some(b"Hello World".to_vec()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let converted = part_from_api(part);
        assert_eq!(converted.mime_type, "text/plain");
        // The tree keeps the wire encoding
        assert_eq!(converted.body_data.as_deref(), Some("SGVsbG8gV29ybGQ"));
        assert!(converted.attachment_id.is_none());
        assert!(converted.parts.is_empty());
    }

    #[test]
    fn test_part_from_api_nested_tree_and_headers() {
        let part = api::MessagePart {
            mime_type: Some("multipart/mixed".to_string()),
            headers: Some(vec![
                api_header("Subject", "Greetings"),
                api::MessagePartHeader {
                    name: Some("X-Broken".to_string()),
                    value: None,
                },
            ]),
            parts: Some(vec![
                api::MessagePart {
                    mime_type: Some("text/plain".to_string()),
                    ..Default::default()
                },
                api::MessagePart {
                    mime_type: Some("application/pdf".to_string()),
                    filename: Some("doc.pdf".to_string()),
                    body: Some(api::MessagePartBody {
                        attachment_id: Some("att-1".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };

        let converted = part_from_api(part);
        assert_eq!(converted.mime_type, "multipart/mixed");
        // Headers without both name and value are dropped
        assert_eq!(converted.headers.len(), 1);
        assert_eq!(converted.header("subject"), "Greetings");
        assert_eq!(converted.parts.len(), 2);
        assert_eq!(converted.parts[1].filename, "doc.pdf");
        assert_eq!(converted.parts[1].attachment_id.as_deref(), Some("att-1"));
    }

    #[test]
    fn test_part_from_api_tolerates_empty_part() {
        let converted = part_from_api(api::MessagePart::default());
        assert_eq!(converted.mime_type, "");
        assert!(converted.body_data.is_none());
        assert!(converted.headers.is_empty());
        assert!(converted.parts.is_empty());
    }
}
