//! Certificate health assessment for service principal key credentials.

use chrono::{DateTime, Utc};

use crate::models::KeyCredential;

/// Credential type carrying an X.509 signing certificate
const X509_CREDENTIAL_TYPE: &str = "AsymmetricX509Cert";

/// Outcome of assessing a service principal's key credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateHealth {
    /// True when at least one certificate expires strictly after `now`
    pub has_valid_certificate: bool,
    /// Soonest expiry among the still-valid certificates, if any
    pub nearest_cert_expiry: Option<DateTime<Utc>>,
}

/// Assesses the key-credential list at the given instant.
///
/// Only `AsymmetricX509Cert` credentials with a parseable expiry are
/// considered. Already-expired certificates never contribute to
/// `nearest_cert_expiry`; a list with no future-dated certificate yields
/// `None` there.
pub fn assess(credentials: &[KeyCredential], now: DateTime<Utc>) -> CertificateHealth {
    let mut has_valid = false;
    let mut nearest: Option<DateTime<Utc>> = None;

    for credential in credentials {
        if credential.credential_type.as_deref() != Some(X509_CREDENTIAL_TYPE) {
            continue;
        }
        let Some(expiry) = credential.end_date_time else {
            continue;
        };
        if expiry > now {
            has_valid = true;
            if nearest.map_or(true, |current| expiry < current) {
                nearest = Some(expiry);
            }
        }
    }

    CertificateHealth {
        has_valid_certificate: has_valid,
        nearest_cert_expiry: nearest,
    }
}
