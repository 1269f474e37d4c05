//! Microsoft Graph directory client: token acquisition, paginated listing,
//! and the per-application enrichment lookups.

pub mod auth;
pub mod client;

pub use auth::TokenProvider;
pub use client::{GraphClient, ODataPage};
