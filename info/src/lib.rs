//! Build information shared by the catalog binaries.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const REVISION: Option<&str> = option_env!("CATALOG_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");

/// Name under which the service identifies itself in logs and health checks.
pub const SERVICE: &str = "otr-catalog";
