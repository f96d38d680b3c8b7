//! Label name resolution and batch label changes
//!
//! Callers refer to labels by display name or by canonical ID. Resolution
//! fetches the account's label table fresh per invocation, maps names it
//! knows, and passes anything else through untouched so an already canonical
//! ID keeps working.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::client::{GmailClient, LabelInfo};
use crate::error::{GmailError, Result};

/// Canonical ID of the system inbox label
pub const INBOX_LABEL_ID: &str = "INBOX";

/// Expand repeated flag values and embedded commas into a flat list
///
/// Entries are trimmed; blank entries are dropped.
pub fn split_csv(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the name to canonical ID table from a remote listing
///
/// Names are kept case-sensitive, exactly as the service returns them.
/// The table is built fresh per invocation and never cached.
pub fn build_label_table(labels: Vec<LabelInfo>) -> HashMap<String, String> {
    labels.into_iter().map(|l| (l.name, l.id)).collect()
}

/// Map requested label names to canonical IDs
///
/// Names found in the table become their ID. Anything else passes through
/// untouched, so callers can hand over canonical IDs directly.
pub fn resolve_label_ids(names: &[String], table: &HashMap<String, String>) -> Vec<String> {
    names
        .iter()
        .map(|name| table.get(name).cloned().unwrap_or_else(|| name.clone()))
        .collect()
}

/// Merge the archive shorthand into the removal set
///
/// INBOX lands in the set exactly once, even when the caller also asked to
/// remove it explicitly.
pub fn merge_archive(remove_ids: &mut Vec<String>, archive: bool) {
    if archive && !remove_ids.iter().any(|id| id == INBOX_LABEL_ID) {
        remove_ids.push(INBOX_LABEL_ID.to_string());
    }
}

/// Check modify arguments before any remote work
///
/// Also used by the CLI so bad invocations fail before the OAuth flow runs.
pub fn validate_modify_args(
    ids: &[String],
    add_labels: &[String],
    remove_labels: &[String],
    archive: bool,
) -> Result<()> {
    if split_csv(ids).is_empty() {
        return Err(GmailError::InvalidArguments(
            "must specify --ids".to_string(),
        ));
    }

    if split_csv(add_labels).is_empty() && split_csv(remove_labels).is_empty() && !archive {
        return Err(GmailError::InvalidArguments(
            "must specify --add-label, --remove-label, and/or --archive".to_string(),
        ));
    }

    Ok(())
}

/// Outcome of one batch label change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyOutcome {
    pub modified: Vec<String>,
    pub count: usize,
    pub added_labels: Vec<String>,
    pub removed_labels: Vec<String>,
    pub archived: bool,
}

/// Applies batch label changes to an account's messages
pub struct LabelModifier {
    client: Box<dyn GmailClient>,
}

impl LabelModifier {
    pub fn new(client: Box<dyn GmailClient>) -> Self {
        Self { client }
    }

    /// Change labels on a batch of messages
    ///
    /// `add_labels` and `remove_labels` accept display names or canonical
    /// IDs; `archive` is shorthand for removing INBOX. Arguments are
    /// validated before any remote call.
    pub async fn modify(
        &self,
        ids: &[String],
        add_labels: &[String],
        remove_labels: &[String],
        archive: bool,
    ) -> Result<ModifyOutcome> {
        validate_modify_args(ids, add_labels, remove_labels, archive)?;

        let ids = split_csv(ids);
        let add_labels = split_csv(add_labels);
        let remove_labels = split_csv(remove_labels);

        let table = build_label_table(self.client.list_labels().await?);
        debug!("Fetched label table with {} entries", table.len());

        let add_ids = resolve_label_ids(&add_labels, &table);
        let mut remove_ids = resolve_label_ids(&remove_labels, &table);
        merge_archive(&mut remove_ids, archive);

        self.client
            .batch_modify(&ids, &add_ids, &remove_ids)
            .await?;

        info!(
            "Modified {} message(s), adding {:?} and removing {:?}",
            ids.len(),
            add_ids,
            remove_ids
        );

        Ok(ModifyOutcome {
            count: ids.len(),
            modified: ids,
            added_labels: add_ids,
            removed_labels: remove_ids,
            archived: archive,
        })
    }
}
