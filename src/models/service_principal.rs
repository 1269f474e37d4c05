use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Raw service principal record as returned by the directory listing.
///
/// Only the fields requested via `$select` are modeled; anything else in the
/// payload is ignored at the boundary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    /// Directory object id; stable across renames
    pub id: String,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub account_enabled: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub app_owner_organization_id: Option<String>,
    #[serde(default)]
    pub publisher_name: Option<String>,
    #[serde(default)]
    pub app_role_assignment_required: Option<bool>,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferred_single_sign_on_mode: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notification_email_addresses: Vec<String>,
    #[serde(default)]
    pub key_credentials: Vec<KeyCredential>,
}

/// Signing or authentication credential attached to a service principal
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCredential {
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
    /// Expiry; absent or unparseable values are treated as no expiry
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub end_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Parses an RFC 3339 timestamp, mapping anything unparseable to `None`
/// rather than failing the whole record.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
