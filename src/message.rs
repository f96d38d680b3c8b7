//! MIME part tree model for fetched Gmail messages.
//!
//! The Gmail API returns a message body as a recursive part tree: every node
//! has a MIME type and headers, and carries either inline base64 payload,
//! child parts, or a remote attachment handle. This module owns that model
//! plus the pure traversals over it: header lookup, selection of the best
//! body text for quoting, and attachment discovery. Nothing here touches the
//! network, so all of it is testable with hand-built trees.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;

/// Filename parameter of a Content-Disposition or Content-Type header,
/// quoted or bare
static FILENAME_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(?:filename|name)\s*=\s*(?:"([^"]*)"|([^;\s]+))"#).unwrap());

/// A single message header as returned by the Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One node of a message's MIME tree, in the shape the API's "full" format
/// delivers it.
///
/// Per MIME, a part meaningfully carries either inline `body_data` or child
/// `parts`, and attachments carry an `attachment_id` instead of inline data.
/// Real payloads are looser than that, so the model tolerates any
/// combination, including none.
#[derive(Debug, Clone, Default)]
pub struct MessagePart {
    pub mime_type: String,
    /// Display filename the API derived for attachment parts; empty otherwise
    pub filename: String,
    pub headers: Vec<Header>,
    /// Inline body payload, URL-safe base64 as delivered by the API
    pub body_data: Option<String>,
    /// Remote handle for attachment content fetched separately
    pub attachment_id: Option<String>,
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Look up a header on this part by name, case-insensitively.
    pub fn header(&self, name: &str) -> String {
        header_value(&self.headers, name)
    }
}

/// Return the value of the first header whose name matches
/// case-insensitively, or the empty string when no header matches.
///
/// Absence is a normal, silent outcome. Used for `Subject`, `From`, `To`
/// and `Date` when quoting a message.
pub fn header_value(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

/// Decode URL-safe (web) base64 as the Gmail API emits it.
///
/// The API documents unpadded web-safe base64 but padded data shows up in
/// practice, so both variants are accepted. Returns `None` when neither
/// decodes.
pub fn decode_web64(data: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| URL_SAFE.decode(data))
        .ok()
}

fn decode_body_text(data: &str) -> Option<String> {
    let bytes = decode_web64(data)?;
    String::from_utf8(bytes).ok()
}

/// Body text selected for quoting in a forward, plus whether it came from an
/// HTML part because no plain-text part was usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySelection {
    pub text: String,
    pub from_html: bool,
}

/// The selector's pick with the node it came from, so the attachment
/// collector can exclude that exact part.
struct BodyPick<'a> {
    part: &'a MessagePart,
    text: String,
    from_html: bool,
}

/// Pick the best plain-text rendering of a message body.
///
/// A decodable `text/plain` part anywhere in the tree always wins over any
/// `text/html` part. With no plain candidate, the first `text/html` part is
/// returned raw, markup untouched, and the fallback flag set. A tree with no
/// usable body yields an empty string; that is not an error. Ties break to
/// the first part encountered in pre-order (node before children, children
/// left to right), and a part whose payload fails to decode contributes
/// nothing.
pub fn best_body_for_display(root: &MessagePart) -> BodySelection {
    match pick_body(root) {
        Some(pick) => BodySelection {
            text: pick.text,
            from_html: pick.from_html,
        },
        None => BodySelection {
            text: String::new(),
            from_html: false,
        },
    }
}

fn pick_body(root: &MessagePart) -> Option<BodyPick<'_>> {
    if let Some((part, text)) = find_text_part(root, "text/plain") {
        return Some(BodyPick {
            part,
            text,
            from_html: false,
        });
    }
    let (part, text) = find_text_part(root, "text/html")?;
    Some(BodyPick {
        part,
        text,
        from_html: true,
    })
}

/// Pre-order search for the first part of the given MIME type carrying
/// decodable inline payload.
fn find_text_part<'a>(part: &'a MessagePart, mime: &str) -> Option<(&'a MessagePart, String)> {
    if part.mime_type.eq_ignore_ascii_case(mime) {
        if let Some(data) = part.body_data.as_deref() {
            if !data.is_empty() {
                if let Some(text) = decode_body_text(data) {
                    return Some((part, text));
                }
            }
        }
    }
    for child in &part.parts {
        if let Some(found) = find_text_part(child, mime) {
            return Some(found);
        }
    }
    None
}

/// Flat descriptor for one attachment found in a message tree. Built fresh
/// per forward, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    /// Opaque remote handle needed to re-fetch the content
    pub attachment_id: String,
    pub filename: String,
    pub mime_type: String,
}

/// Collect descriptors for every attachment part in the tree.
///
/// A part qualifies when it is a leaf with a non-empty filename and a remote
/// attachment handle, and it is not the part the body selector picked as the
/// message text. Results keep pre-order, left-to-right tree order, which is
/// the order attachments appear in the composed output.
pub fn collect_attachments(root: &MessagePart) -> Vec<AttachmentInfo> {
    let body_part = pick_body(root).map(|pick| pick.part);
    let mut found = Vec::new();
    collect_into(root, body_part, &mut found);
    found
}

fn collect_into<'a>(
    part: &'a MessagePart,
    body_part: Option<&'a MessagePart>,
    found: &mut Vec<AttachmentInfo>,
) {
    let is_body_pick = body_part.is_some_and(|picked| std::ptr::eq(picked, part));
    if part.parts.is_empty() && !is_body_pick {
        if let Some(filename) = effective_filename(part) {
            if let Some(attachment_id) = part.attachment_id.as_deref() {
                found.push(AttachmentInfo {
                    attachment_id: attachment_id.to_string(),
                    filename,
                    mime_type: part.mime_type.clone(),
                });
            }
        }
    }
    for child in &part.parts {
        collect_into(child, body_part, found);
    }
}

/// Display filename for a part: the API-derived field when present, else the
/// `filename=` / `name=` parameter of Content-Disposition or Content-Type.
fn effective_filename(part: &MessagePart) -> Option<String> {
    if !part.filename.is_empty() {
        return Some(part.filename.clone());
    }
    for header_name in ["Content-Disposition", "Content-Type"] {
        let value = part.header(header_name);
        if let Some(caps) = FILENAME_PARAM.captures(&value) {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string());
            match name {
                Some(n) if !n.is_empty() => return Some(n),
                _ => {}
            }
        }
    }
    None
}
