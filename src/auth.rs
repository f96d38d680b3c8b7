//! OAuth2 authentication management for Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;
use yup_oauth2::ApplicationSecret;

use crate::error::{GmailError, Result};

/// Gmail API scopes required for forwarding and label changes
///
/// These scopes provide:
/// - gmail.modify: Read/write access (no permanent deletion)
/// - gmail.labels: Label listing for name resolution
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.labels",
];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub = Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Token cache file for one account inside the cache directory
///
/// Tokens are cached per account so one machine can hold authorizations
/// for several mailboxes side by side.
pub fn token_cache_file(token_cache_dir: &Path, account: &str) -> PathBuf {
    token_cache_dir.join(format!("token-{}.json", account))
}

/// Initialize Gmail API hub with OAuth2 authentication
///
/// This function sets up the complete Gmail API client with:
/// - OAuth2 authentication using InstalledFlow (desktop app flow)
/// - Token persistence to disk for automatic refresh
/// - HTTP/1 client with TLS support
///
/// # Arguments
/// * `credentials_path` - Path to the OAuth2 credentials JSON file
/// * `token_cache_path` - Path where access tokens will be cached
///
/// # Returns
/// A configured Gmail hub ready for API calls
pub async fn initialize_gmail_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
) -> Result<GmailHub> {
    let secret = load_application_secret(credentials_path).await?;

    if let Some(parent) = token_cache_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Build authenticator with token persistence
    // HTTPRedirect opens a browser for user authorization
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Pre-authenticate with required scopes to ensure token is cached with correct scopes
    let _token = auth
        .token(REQUIRED_SCOPES)
        .await
        .map_err(|e| GmailError::AuthError(format!("Failed to obtain token: {}", e)))?;

    if let Err(e) = secure_token_file(token_cache_path).await {
        warn!("Could not restrict token file permissions: {}", e);
    }

    // Configure HTTP client with TLS
    // Use HTTP/1 for compatibility (HTTP/2 is default but HTTP/1 works better with google-gmail1)
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| {
                    GmailError::AuthError(format!("Failed to load TLS roots: {}", e))
                })?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Load the OAuth2 application secret
///
/// Reads the credentials JSON file when present, otherwise falls back to
/// environment variables.
async fn load_application_secret(credentials_path: &Path) -> Result<ApplicationSecret> {
    if credentials_path.exists() {
        return yup_oauth2::read_application_secret(credentials_path)
            .await
            .map_err(|e| GmailError::AuthError(format!("Failed to read credentials: {}", e)));
    }

    match load_credentials_from_env() {
        Ok(secret) => Ok(secret),
        Err(e) => Err(GmailError::AuthError(format!(
            "No credentials file at {}: {}",
            credentials_path.display(),
            e
        ))),
    }
}

/// Load OAuth2 credentials from environment variables
///
/// This avoids storing credentials in files on machines where that
/// is not wanted.
///
/// # Environment Variables
/// - `GMAIL_CLIENT_ID`: OAuth2 client ID
/// - `GMAIL_CLIENT_SECRET`: OAuth2 client secret
/// - `GMAIL_REDIRECT_URI`: Redirect URI (optional, defaults to http://localhost:8080)
///
/// # Returns
/// ApplicationSecret ready for use with authenticator
pub fn load_credentials_from_env() -> Result<ApplicationSecret> {
    let client_id = env::var("GMAIL_CLIENT_ID")
        .map_err(|_| GmailError::ConfigError("GMAIL_CLIENT_ID not set".to_string()))?;
    let client_secret = env::var("GMAIL_CLIENT_SECRET")
        .map_err(|_| GmailError::ConfigError("GMAIL_CLIENT_SECRET not set".to_string()))?;
    let redirect_uri = env::var("GMAIL_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());

    Ok(ApplicationSecret {
        client_id,
        client_secret,
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        redirect_uris: vec![redirect_uri],
        ..Default::default()
    })
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
/// to prevent unauthorized access to OAuth2 tokens
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600); // Read/write for owner only
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Secure token file on Windows (stub implementation)
///
/// Windows uses ACLs instead of Unix permissions
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
