//! Test fixtures and data builders
//!
//! Provides reusable test data for service principals and stored records.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use appcensus::models::EnterpriseApp;

/// Builds service principal payloads with sensible defaults
pub struct ServicePrincipalBuilder {
    id: String,
    app_id: Option<String>,
    display_name: String,
    account_enabled: bool,
    tags: Vec<String>,
    app_owner_organization_id: Option<String>,
    publisher_name: Option<String>,
    key_credentials: Vec<Value>,
}

impl ServicePrincipalBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            app_id: Some(format!("{}-client", id)),
            display_name: "Test App".to_string(),
            account_enabled: true,
            tags: Vec::new(),
            app_owner_organization_id: None,
            publisher_name: None,
            key_credentials: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn without_app_id(mut self) -> Self {
        self.app_id = None;
        self
    }

    pub fn with_account_enabled(mut self, enabled: bool) -> Self {
        self.account_enabled = enabled;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn with_owner_organization(mut self, tenant_id: &str) -> Self {
        self.app_owner_organization_id = Some(tenant_id.to_string());
        self
    }

    pub fn with_publisher(mut self, publisher: &str) -> Self {
        self.publisher_name = Some(publisher.to_string());
        self
    }

    /// Adds an X.509 signing certificate expiring at the given instant
    pub fn with_certificate(mut self, end_date_time: DateTime<Utc>) -> Self {
        let key_id = format!("key-{}", self.key_credentials.len());
        self.key_credentials.push(json!({
            "type": "AsymmetricX509Cert",
            "usage": "Verify",
            "keyId": key_id,
            "endDateTime": end_date_time.to_rfc3339(),
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "id": self.id,
            "appId": self.app_id,
            "displayName": self.display_name,
            "accountEnabled": self.account_enabled,
            "tags": self.tags,
            "appOwnerOrganizationId": self.app_owner_organization_id,
            "publisherName": self.publisher_name,
            "keyCredentials": self.key_credentials,
        })
    }
}

/// Builds an enriched record with defaults, for exercising the store directly
pub fn enterprise_app(app_object_id: &str) -> EnterpriseApp {
    EnterpriseApp {
        app_object_id: app_object_id.to_string(),
        app_id: Some(format!("{}-client", app_object_id)),
        display_name: Some("Test App".to_string()),
        account_enabled: Some(true),
        user_signins_last_30_days: 0,
        has_valid_certificate: false,
        nearest_cert_expiry: None,
        sampled_until: Utc::now(),
        app_owner_organization_id: None,
        publisher_name: None,
        app_role_assignment_required: None,
        created_datetime: None,
        preferred_single_sign_on_mode: None,
        homepage: None,
        login_url: None,
        notes: None,
        description: None,
        notification_emails: Some(json!([])),
        tags: Some(json!([])),
    }
}
