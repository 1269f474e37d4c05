pub mod certificates;
pub mod collector;
pub mod filter;
pub mod store;

pub use certificates::CertificateHealth;
pub use collector::{CollectorService, SyncSummary};
pub use filter::ExclusionRules;
pub use store::AppStore;
