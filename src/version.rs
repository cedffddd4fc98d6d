/// The current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the application, also used for config and data directories
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
