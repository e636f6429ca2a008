pub mod backend;
pub mod desktop;

pub use backend::{AppRegistry, UriOpener};
pub use desktop::{DesktopEntryRegistry, XdgOpener};

/// Create the app registry for the current platform
pub fn create_registry() -> Box<dyn AppRegistry> {
    let registry = DesktopEntryRegistry::from_env();
    log::info!("Using {} app registry", registry.name());
    Box::new(registry)
}

/// Create the URI opener for the current platform
pub fn create_opener(command: &str) -> Box<dyn UriOpener> {
    let opener = XdgOpener::new(command);
    log::info!("Using {} opener ({})", opener.name(), command);
    Box::new(opener)
}
