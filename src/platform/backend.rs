use anyhow::Result;

/// Trait for querying the installed-application registry
/// A failed lookup reports the app as absent
pub trait AppRegistry {
    /// Check whether the application with this identifier is installed
    fn is_installed(&self, app_id: &str) -> bool;

    /// Get the registry name (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Trait for the platform's generic "view this URI" action
/// Returns an error when no handler could be resolved or launched
pub trait UriOpener {
    /// Ask the platform to open the URI
    fn open_uri(&self, uri: &str) -> Result<()>;

    /// Get the opener name (for logging/debugging)
    fn name(&self) -> &'static str;
}
