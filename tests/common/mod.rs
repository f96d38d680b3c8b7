//! Common test utilities and fixtures

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use gmail_relay::client::{GmailClient, LabelInfo, SentMessage};
use gmail_relay::error::Result;
use gmail_relay::message::{Header, MessagePart};
use mockall::mock;

/// Encode bytes the way Gmail stores part bodies
pub fn web64(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Create a text/plain part with an encoded body
pub fn text_part(body: &str) -> MessagePart {
    MessagePart {
        mime_type: "text/plain".to_string(),
        filename: String::new(),
        headers: vec![Header::new("Content-Type", "text/plain; charset=\"UTF-8\"")],
        body_data: Some(web64(body.as_bytes())),
        attachment_id: None,
        parts: Vec::new(),
    }
}

/// Create an attachment part whose content lives behind an attachment ID
pub fn attachment_part(filename: &str, mime_type: &str, attachment_id: &str) -> MessagePart {
    MessagePart {
        mime_type: mime_type.to_string(),
        filename: filename.to_string(),
        headers: vec![Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        )],
        body_data: None,
        attachment_id: Some(attachment_id.to_string()),
        parts: Vec::new(),
    }
}

/// Create a fetched message: fixed sender headers, a text body, extra parts
pub fn original_message(subject: &str, body: &str, extra_parts: Vec<MessagePart>) -> MessagePart {
    let mut parts = vec![text_part(body)];
    parts.extend(extra_parts);

    MessagePart {
        mime_type: "multipart/mixed".to_string(),
        filename: String::new(),
        headers: vec![
            Header::new("From", "alice@example.com"),
            Header::new("Date", "Mon, 1 Jan 2024 10:00:00 -0800"),
            Header::new("Subject", subject),
            Header::new("To", "me@example.com"),
        ],
        body_data: None,
        attachment_id: None,
        parts,
    }
}

/// Create a test LabelInfo
pub fn label(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

// Mock implementation of GmailClient for testing
mock! {
    pub GmailClient {}

    #[async_trait::async_trait]
    impl GmailClient for GmailClient {
        async fn fetch_message(&self, id: &str) -> Result<MessagePart>;
        async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>>;
        async fn send_raw(&self, raw: Vec<u8>) -> Result<SentMessage>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn batch_modify(
            &self,
            message_ids: &[String],
            add_label_ids: &[String],
            remove_label_ids: &[String],
        ) -> Result<()>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_encodes_body() {
        let part = text_part("Meeting notes attached.");
        assert_eq!(part.mime_type, "text/plain");
        assert_eq!(
            part.body_data.as_deref(),
            Some("TWVldGluZyBub3RlcyBhdHRhY2hlZC4")
        );
    }

    #[test]
    fn test_original_message_carries_headers_and_parts() {
        let msg = original_message(
            "Quarterly Report",
            "See attached.",
            vec![attachment_part("report.pdf", "application/pdf", "att-1")],
        );

        assert_eq!(msg.header("From"), "alice@example.com");
        assert_eq!(msg.header("Subject"), "Quarterly Report");
        assert_eq!(msg.parts.len(), 2);
        assert_eq!(msg.parts[1].attachment_id.as_deref(), Some("att-1"));
    }
}
