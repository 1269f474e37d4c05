//! Client-side exclusion rules applied to raw directory records.
//!
//! Filtering runs before enrichment so excluded records never cost the
//! per-application Graph lookups. All rules must pass for a record to be
//! kept; each rule is independent of the others.

use std::collections::HashSet;

use crate::config::FilterConfig;
use crate::models::ServicePrincipal;

/// Tag used by tenant admins to hide an application from end-user portals
pub const HIDE_APP_TAG: &str = "HideApp";

/// Compiled exclusion rules for one sync pass
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    exclude_hide_app_tag: bool,
    excluded_owner_organizations: HashSet<String>,
    excluded_publishers: HashSet<String>,
}

impl ExclusionRules {
    /// Builds the rule set from configuration
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            exclude_hide_app_tag: config.exclude_hide_app_tag,
            excluded_owner_organizations: config
                .exclude_owner_organization_ids
                .iter()
                .cloned()
                .collect(),
            excluded_publishers: config.exclude_publishers.iter().cloned().collect(),
        }
    }

    /// Returns true if the record should proceed to enrichment.
    ///
    /// Deterministic and side-effect-free; publisher and owner matching is
    /// exact (no case folding, no substring matching).
    pub fn keep(&self, record: &ServicePrincipal) -> bool {
        if self.exclude_hide_app_tag && record.tags.iter().any(|tag| tag == HIDE_APP_TAG) {
            return false;
        }

        if let Some(owner) = &record.app_owner_organization_id {
            if self.excluded_owner_organizations.contains(owner) {
                return false;
            }
        }

        if let Some(publisher) = &record.publisher_name {
            if self.excluded_publishers.contains(publisher) {
                return false;
            }
        }

        true
    }
}
