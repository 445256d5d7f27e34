// Build-time identity from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `name/version`, sent as the User-Agent of outbound lookups.
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
