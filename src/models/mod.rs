pub mod enterprise_app;
pub mod service_principal;

pub use enterprise_app::{EnterpriseApp, EnterpriseAppRow};
pub use service_principal::{KeyCredential, ServicePrincipal};
