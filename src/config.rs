use std::env;

use sqlx::postgres::PgSslMode;
use url::Url;

/// Well-known tenant id that owns Microsoft first-party applications.
pub const MICROSOFT_FIRST_PARTY_TENANT_ID: &str = "f8cdef31-a31e-4b4a-93e4-5f571e91255a";

/// Publisher name stamped on Microsoft first-party service principals.
pub const MICROSOFT_SERVICES_PUBLISHER: &str = "Microsoft Services";

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_SERVICE_PRINCIPAL_FILTER: &str = "servicePrincipalType eq 'Application'";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub graph: GraphConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub filter: FilterConfig,
}

/// Microsoft Graph credentials and endpoints
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Versioned Graph API base, e.g. `https://graph.microsoft.com/v1.0`
    pub graph_base_url: String,
    /// Login authority base, e.g. `https://login.microsoftonline.com`
    pub login_base_url: String,
}

/// Database connection configuration (libpq-style discrete variables)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub sslmode: Option<PgSslMode>,
    pub max_connections: u32,
}

/// Tunables for the synchronization pass
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Sign-in lookback window in days
    pub lookback_days: i64,
    /// Page-size hint sent to the listing endpoint (clamped to 1-999)
    pub page_size: u32,
    /// Server-side `$filter` expression for the listing query
    pub service_principal_filter: String,
}

/// Exclusion rules applied to raw directory records
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub exclude_hide_app_tag: bool,
    pub exclude_owner_organization_ids: Vec<String>,
    pub exclude_publishers: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            graph: GraphConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            sync: SyncConfig::from_env()?,
            filter: FilterConfig::from_env(),
        })
    }
}

impl GraphConfig {
    /// Load Graph credentials and endpoint overrides from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let graph_base_url =
            env::var("GRAPH_BASE_URL").unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string());
        let login_base_url = env::var("AZURE_LOGIN_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_LOGIN_BASE_URL.to_string());

        // Both endpoints are joined with path segments later; reject anything
        // that does not parse as an absolute URL before the first request.
        Url::parse(&graph_base_url).map_err(|_| ConfigError::InvalidBaseUrl("GRAPH_BASE_URL"))?;
        Url::parse(&login_base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl("AZURE_LOGIN_BASE_URL"))?;

        Ok(Self {
            tenant_id: required_var("AZURE_TENANT_ID")?,
            client_id: required_var("AZURE_CLIENT_ID")?,
            client_secret: required_var("AZURE_CLIENT_SECRET")?,
            graph_base_url,
            login_base_url,
        })
    }

    /// OAuth2 token endpoint for the configured tenant
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// Client-credentials scope derived from the Graph origin
    pub fn scope(&self) -> String {
        // graph_base_url was validated in from_env; fall back to the literal
        // base if a caller constructed the config by hand with a bad URL.
        match Url::parse(&self.graph_base_url) {
            Ok(url) => format!("{}/.default", url.origin().ascii_serialization()),
            Err(_) => format!("{}/.default", self.graph_base_url.trim_end_matches('/')),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let sslmode = match env::var("PGSSLMODE") {
            Ok(value) => Some(parse_sslmode(&value)?),
            Err(_) => None,
        };

        Ok(Self {
            host: required_var("PGHOST")?,
            port: env::var("PGPORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PGPORT"))?,
            dbname: required_var("PGDATABASE")?,
            user: required_var("PGUSER")?,
            password: required_var("PGPASSWORD")?,
            sslmode,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }
}

impl SyncConfig {
    /// Load sync tunables from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookback_days = env::var("LOOKBACK_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidNumber("LOOKBACK_DAYS"))?;

        let page_size: u32 = env::var("GRAPH_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidNumber("GRAPH_PAGE_SIZE"))?;

        Ok(Self {
            lookback_days,
            // The listing endpoint rejects $top outside 1-999
            page_size: page_size.clamp(1, 999),
            service_principal_filter: env::var("SERVICE_PRINCIPAL_FILTER")
                .unwrap_or_else(|_| DEFAULT_SERVICE_PRINCIPAL_FILTER.to_string()),
        })
    }
}

impl FilterConfig {
    /// Load exclusion rules from environment variables
    pub fn from_env() -> Self {
        Self {
            exclude_hide_app_tag: env::var("EXCLUDE_HIDE_APP_TAG")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            exclude_owner_organization_ids: env::var("EXCLUDE_OWNER_ORGANIZATION_IDS")
                .map(|v| csv_list(&v))
                .unwrap_or_else(|_| vec![MICROSOFT_FIRST_PARTY_TENANT_ID.to_string()]),
            exclude_publishers: env::var("EXCLUDE_PUBLISHERS")
                .map(|v| csv_list(&v))
                .unwrap_or_else(|_| vec![MICROSOFT_SERVICES_PUBLISHER.to_string()]),
        }
    }
}

/// Fetches a required environment variable, treating empty values as missing
fn required_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Splits a comma-separated list, trimming whitespace and dropping empties
fn csv_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

fn parse_sslmode(value: &str) -> Result<PgSslMode, ConfigError> {
    match value {
        "disable" => Ok(PgSslMode::Disable),
        "allow" => Ok(PgSslMode::Allow),
        "prefer" => Ok(PgSslMode::Prefer),
        "require" => Ok(PgSslMode::Require),
        "verify-ca" => Ok(PgSslMode::VerifyCa),
        "verify-full" => Ok(PgSslMode::VerifyFull),
        other => Err(ConfigError::InvalidSslMode(other.to_string())),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidNumber(&'static str),
    InvalidBaseUrl(&'static str),
    InvalidSslMode(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(name) => {
                write!(f, "{} environment variable is required", name)
            }
            ConfigError::InvalidNumber(name) => write!(f, "{} must be a valid number", name),
            ConfigError::InvalidBaseUrl(name) => write!(f, "{} must be an absolute URL", name),
            ConfigError::InvalidSslMode(value) => {
                write!(f, "PGSSLMODE value '{}' is not recognized", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
