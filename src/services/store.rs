//! Persistence for enriched enterprise application records.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppResult;
use crate::models::{EnterpriseApp, EnterpriseAppRow};

/// Core table, created on first run. Never dropped or rewritten.
const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS enterprise_apps (
    app_object_id TEXT PRIMARY KEY,
    app_id TEXT,
    display_name TEXT,
    account_enabled BOOLEAN,
    user_signins_last_30_days INTEGER,
    has_valid_certificate BOOLEAN,
    nearest_cert_expiry TIMESTAMPTZ,
    sampled_until TIMESTAMPTZ NOT NULL,
    app_owner_organization_id TEXT,
    publisher_name TEXT,
    app_role_assignment_required BOOLEAN,
    created_datetime TIMESTAMPTZ,
    preferred_single_sign_on_mode TEXT,
    homepage TEXT,
    login_url TEXT,
    notes TEXT,
    description TEXT,
    notification_emails JSONB,
    tags JSONB,
    synced_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Additive migrations so a table created by an older build picks up the
/// descriptive columns in place.
const COLUMN_MIGRATIONS: &[&str] = &[
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS app_owner_organization_id TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS publisher_name TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS app_role_assignment_required BOOLEAN",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS created_datetime TIMESTAMPTZ",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS preferred_single_sign_on_mode TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS homepage TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS login_url TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS notes TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS description TEXT",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS notification_emails JSONB",
    "ALTER TABLE enterprise_apps ADD COLUMN IF NOT EXISTS tags JSONB",
];

pub struct AppStore;

impl AppStore {
    /// Ensures the target schema exists; idempotent and never destructive
    pub async fn ensure_schema(pool: &PgPool) -> AppResult<()> {
        log::debug!("Ensuring enterprise_apps table exists");

        sqlx::query(CREATE_TABLE_SQL).execute(pool).await?;
        for statement in COLUMN_MIGRATIONS {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    /// Upserts a batch of enriched records keyed on `app_object_id`.
    ///
    /// Existing rows are fully overwritten (no partial merge) and stamped
    /// with a fresh `synced_at`. Rows absent from the batch are untouched.
    pub async fn upsert_batch(pool: &PgPool, apps: &[EnterpriseApp]) -> AppResult<()> {
        if apps.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO enterprise_apps (\
             app_object_id, app_id, display_name, account_enabled, \
             user_signins_last_30_days, has_valid_certificate, nearest_cert_expiry, \
             sampled_until, app_owner_organization_id, publisher_name, \
             app_role_assignment_required, created_datetime, preferred_single_sign_on_mode, \
             homepage, login_url, notes, description, notification_emails, tags) ",
        );

        builder.push_values(apps, |mut row, app| {
            row.push_bind(&app.app_object_id)
                .push_bind(&app.app_id)
                .push_bind(&app.display_name)
                .push_bind(app.account_enabled)
                .push_bind(app.user_signins_last_30_days)
                .push_bind(app.has_valid_certificate)
                .push_bind(app.nearest_cert_expiry)
                .push_bind(app.sampled_until)
                .push_bind(&app.app_owner_organization_id)
                .push_bind(&app.publisher_name)
                .push_bind(app.app_role_assignment_required)
                .push_bind(app.created_datetime)
                .push_bind(&app.preferred_single_sign_on_mode)
                .push_bind(&app.homepage)
                .push_bind(&app.login_url)
                .push_bind(&app.notes)
                .push_bind(&app.description)
                .push_bind(&app.notification_emails)
                .push_bind(&app.tags);
        });

        builder.push(
            " ON CONFLICT (app_object_id) DO UPDATE SET \
             app_id = EXCLUDED.app_id, \
             display_name = EXCLUDED.display_name, \
             account_enabled = EXCLUDED.account_enabled, \
             user_signins_last_30_days = EXCLUDED.user_signins_last_30_days, \
             has_valid_certificate = EXCLUDED.has_valid_certificate, \
             nearest_cert_expiry = EXCLUDED.nearest_cert_expiry, \
             sampled_until = EXCLUDED.sampled_until, \
             app_owner_organization_id = EXCLUDED.app_owner_organization_id, \
             publisher_name = EXCLUDED.publisher_name, \
             app_role_assignment_required = EXCLUDED.app_role_assignment_required, \
             created_datetime = EXCLUDED.created_datetime, \
             preferred_single_sign_on_mode = EXCLUDED.preferred_single_sign_on_mode, \
             homepage = EXCLUDED.homepage, \
             login_url = EXCLUDED.login_url, \
             notes = EXCLUDED.notes, \
             description = EXCLUDED.description, \
             notification_emails = EXCLUDED.notification_emails, \
             tags = EXCLUDED.tags, \
             synced_at = NOW()",
        );

        builder.build().execute(pool).await?;

        log::debug!("Upserted {} enterprise app rows", apps.len());
        Ok(())
    }

    /// Reads the full snapshot back, ordered for stable display
    pub async fn list_all(pool: &PgPool) -> AppResult<Vec<EnterpriseAppRow>> {
        let rows = sqlx::query_as::<_, EnterpriseAppRow>(
            "SELECT * FROM enterprise_apps ORDER BY display_name, app_object_id",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
