use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::backend::{AppRegistry, UriOpener};

/// Registry backed by freedesktop.org desktop entries and `$PATH`
/// An app is present when `<app_id>.desktop` exists in an applications
/// directory or an executable named `app_id` is on the search path
pub struct DesktopEntryRegistry {
    application_dirs: Vec<PathBuf>,
    search_path: Vec<PathBuf>,
}

impl DesktopEntryRegistry {
    /// Create a registry from the XDG environment
    ///
    /// Applications directories:
    /// - $XDG_DATA_HOME/applications (default: ~/.local/share/applications)
    /// - each $XDG_DATA_DIRS entry + /applications (default: /usr/local/share:/usr/share)
    pub fn from_env() -> Self {
        let mut application_dirs = Vec::new();

        if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
            application_dirs.push(PathBuf::from(xdg_data).join("applications"));
        } else if let Ok(home) = env::var("HOME") {
            application_dirs.push(PathBuf::from(home).join(".local/share/applications"));
        }

        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|dirs| !dirs.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        application_dirs.extend(
            env::split_paths(&data_dirs).map(|dir| dir.join("applications")),
        );

        let search_path: Vec<PathBuf> = env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();

        log::debug!(
            "DesktopEntryRegistry: {} application dirs, {} search path entries",
            application_dirs.len(),
            search_path.len()
        );

        DesktopEntryRegistry {
            application_dirs,
            search_path,
        }
    }

    /// Create a registry over explicit directories
    pub fn new(application_dirs: Vec<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        DesktopEntryRegistry {
            application_dirs,
            search_path,
        }
    }

    fn has_desktop_entry(&self, app_id: &str) -> bool {
        let file_name = format!("{}.desktop", app_id);
        self.application_dirs
            .iter()
            .any(|dir| dir.join(&file_name).is_file())
    }

    fn has_executable(&self, app_id: &str) -> bool {
        self.search_path
            .iter()
            .any(|dir| is_executable(&dir.join(app_id)))
    }
}

impl AppRegistry for DesktopEntryRegistry {
    fn is_installed(&self, app_id: &str) -> bool {
        // Identifiers with separators would escape the lookup directories
        if app_id.is_empty() || app_id.contains('/') {
            return false;
        }
        self.has_desktop_entry(app_id) || self.has_executable(app_id)
    }

    fn name(&self) -> &'static str {
        "DesktopEntry"
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Opener that delegates to a URI handler command such as `xdg-open`
/// The command's exit status decides whether a handler was resolved
pub struct XdgOpener {
    command: String,
}

impl XdgOpener {
    pub fn new(command: impl Into<String>) -> Self {
        XdgOpener {
            command: command.into(),
        }
    }
}

impl Default for XdgOpener {
    fn default() -> Self {
        XdgOpener::new("xdg-open")
    }
}

impl UriOpener for XdgOpener {
    fn open_uri(&self, uri: &str) -> Result<()> {
        let status = Command::new(&self.command)
            .arg(uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to spawn {}", self.command))?;

        if !status.success() {
            return Err(anyhow!("{} failed with status: {}", self.command, status));
        }

        log::debug!("{} accepted {}", self.command, uri);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "XdgOpen"
    }
}
