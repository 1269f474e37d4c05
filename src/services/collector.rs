//! The synchronization pass: list, filter, enrich, upsert.

use chrono::{Duration, Utc};
use futures_util::{pin_mut, TryStreamExt};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppResult;
use crate::graph::GraphClient;
use crate::models::{EnterpriseApp, ServicePrincipal};
use crate::services::certificates;
use crate::services::filter::ExclusionRules;
use crate::services::store::AppStore;

/// Records accumulated before each flush to the database
const UPSERT_BATCH_SIZE: usize = 100;

/// Counters reported at the end of a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Records returned by the directory listing
    pub discovered: u64,
    /// Records dropped by the exclusion rules
    pub excluded: u64,
    /// Records enriched and written
    pub upserted: u64,
}

/// Coordinates directory ingestion and database persistence for one pass
pub struct CollectorService {
    client: GraphClient,
    rules: ExclusionRules,
    lookback_days: i64,
}

impl CollectorService {
    /// Builds the collector from loaded configuration
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            client: GraphClient::new(config.graph.clone(), config.sync.clone())?,
            rules: ExclusionRules::from_config(&config.filter),
            lookback_days: config.sync.lookback_days,
        })
    }

    /// Runs a complete synchronization pass.
    ///
    /// The listing is consumed as a stream, so memory stays bounded by the
    /// page and batch sizes rather than the tenant size. Batches committed
    /// before a failure remain valid; the pass itself is idempotent.
    pub async fn run(&self, pool: &PgPool) -> AppResult<SyncSummary> {
        let mut summary = SyncSummary::default();
        let mut batch: Vec<EnterpriseApp> = Vec::with_capacity(UPSERT_BATCH_SIZE);

        let records = self.client.list_service_principals();
        pin_mut!(records);

        while let Some(record) = records.try_next().await? {
            summary.discovered += 1;

            if !self.rules.keep(&record) {
                log::debug!(
                    "Excluding service principal {} ({})",
                    record.id,
                    record.display_name.as_deref().unwrap_or("-")
                );
                summary.excluded += 1;
                continue;
            }

            batch.push(self.enrich(record).await?);
            if batch.len() >= UPSERT_BATCH_SIZE {
                AppStore::upsert_batch(pool, &batch).await?;
                summary.upserted += batch.len() as u64;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            AppStore::upsert_batch(pool, &batch).await?;
            summary.upserted += batch.len() as u64;
        }

        log::info!(
            "Sync pass complete: {} discovered, {} excluded, {} upserted",
            summary.discovered,
            summary.excluded,
            summary.upserted
        );
        Ok(summary)
    }

    /// Maps a filtered record to a complete enterprise application value.
    ///
    /// `sampled_until` is captured per record, at the moment its sign-in
    /// window is evaluated; records enriched late in a long pass carry a
    /// slightly later bound than early ones.
    async fn enrich(&self, record: ServicePrincipal) -> AppResult<EnterpriseApp> {
        let sampled_until = Utc::now();

        let signins = match &record.app_id {
            None => 0,
            Some(app_id) => {
                let window_start = sampled_until - Duration::days(self.lookback_days);
                match self.client.signin_count(app_id, window_start).await {
                    Ok(count) => count,
                    Err(err) if err.is_permission_denied() => {
                        // Missing AuditLog.Read.All consent: a documented
                        // degradation, not a pass failure.
                        log::warn!(
                            "Sign-in query denied for app {}; defaulting count to 0",
                            app_id
                        );
                        0
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        let certs = certificates::assess(&record.key_credentials, sampled_until);

        Ok(EnterpriseApp {
            app_object_id: record.id,
            app_id: record.app_id,
            display_name: record.display_name,
            account_enabled: record.account_enabled,
            user_signins_last_30_days: i32::try_from(signins).unwrap_or(i32::MAX),
            has_valid_certificate: certs.has_valid_certificate,
            nearest_cert_expiry: certs.nearest_cert_expiry,
            sampled_until,
            app_owner_organization_id: record.app_owner_organization_id,
            publisher_name: record.publisher_name,
            app_role_assignment_required: record.app_role_assignment_required,
            created_datetime: record.created_date_time,
            preferred_single_sign_on_mode: record.preferred_single_sign_on_mode,
            homepage: record.homepage,
            login_url: record.login_url,
            notes: record.notes,
            description: record.description,
            notification_emails: Some(serde_json::json!(record.notification_email_addresses)),
            tags: Some(serde_json::json!(record.tags)),
        })
    }
}
