use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Enriched enterprise application record produced by one sync pass.
///
/// `synced_at` is stamped by the database on write and therefore lives only
/// on [`EnterpriseAppRow`].
#[derive(Debug, Clone, Serialize)]
pub struct EnterpriseApp {
    pub app_object_id: String,
    pub app_id: Option<String>,
    pub display_name: Option<String>,
    pub account_enabled: Option<bool>,
    pub user_signins_last_30_days: i32,
    pub has_valid_certificate: bool,
    pub nearest_cert_expiry: Option<DateTime<Utc>>,
    /// Upper bound of the sign-in lookback window for this record
    pub sampled_until: DateTime<Utc>,
    pub app_owner_organization_id: Option<String>,
    pub publisher_name: Option<String>,
    pub app_role_assignment_required: Option<bool>,
    pub created_datetime: Option<DateTime<Utc>>,
    pub preferred_single_sign_on_mode: Option<String>,
    pub homepage: Option<String>,
    pub login_url: Option<String>,
    pub notes: Option<String>,
    pub description: Option<String>,
    pub notification_emails: Option<serde_json::Value>,
    pub tags: Option<serde_json::Value>,
}

/// Stored row, as read back from the `enterprise_apps` table
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnterpriseAppRow {
    pub app_object_id: String,
    pub app_id: Option<String>,
    pub display_name: Option<String>,
    pub account_enabled: Option<bool>,
    pub user_signins_last_30_days: Option<i32>,
    pub has_valid_certificate: Option<bool>,
    pub nearest_cert_expiry: Option<DateTime<Utc>>,
    pub sampled_until: DateTime<Utc>,
    pub app_owner_organization_id: Option<String>,
    pub publisher_name: Option<String>,
    pub app_role_assignment_required: Option<bool>,
    pub created_datetime: Option<DateTime<Utc>>,
    pub preferred_single_sign_on_mode: Option<String>,
    pub homepage: Option<String>,
    pub login_url: Option<String>,
    pub notes: Option<String>,
    pub description: Option<String>,
    pub notification_emails: Option<serde_json::Value>,
    pub tags: Option<serde_json::Value>,
    pub synced_at: DateTime<Utc>,
}
