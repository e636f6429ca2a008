//! Hands text and images off to the target app
//!
//! A post runs three steps on the caller's thread: an optimistic presence
//! check against the [`AppRegistry`], URI construction from the matching
//! prefix, and the authoritative launch through the [`UriOpener`]. Both the
//! presence check and the launch can report [`DispatchResult::AppNotInstalled`];
//! the launch result covers an app removed between the two steps.
//!
//! `Dispatcher` is not internally synchronized. The fallback flag is only
//! changed through `&mut self`, so share one instance across threads only
//! behind your own lock.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::encoding::PayloadEncoder;
use crate::models::{DispatchResult, Payload, PayloadKind};
use crate::platform::{self, AppRegistry, UriOpener};
use crate::storage::{AssetStager, Config, DirAssetSource, TargetConfig};

/// Runtime options read at operation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PosterConfig {
    /// Open the web URL instead of failing when the app is missing
    pub allow_fallback_when_app_missing: bool,
}

/// Which prefix a URI was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    App,
    Web,
}

/// A share URI ready to be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUri {
    pub route: Route,
    pub uri: String,
}

pub struct Dispatcher {
    config: PosterConfig,
    target: TargetConfig,
    encoder: PayloadEncoder,
    registry: Box<dyn AppRegistry>,
    opener: Box<dyn UriOpener>,
    stager: Option<AssetStager>,
}

impl Dispatcher {
    /// Create a dispatcher for the default target with fallback disabled
    pub fn new(registry: Box<dyn AppRegistry>, opener: Box<dyn UriOpener>) -> Self {
        Dispatcher {
            config: PosterConfig::default(),
            target: TargetConfig::default(),
            encoder: PayloadEncoder::default(),
            registry,
            opener,
            stager: None,
        }
    }

    /// Create a dispatcher wired to the desktop platform adapters
    /// Staged assets go to `files_dir` unless the config names another directory
    pub fn from_config(config: &Config, files_dir: PathBuf) -> Self {
        let mut dispatcher = Dispatcher::new(
            platform::create_registry(),
            platform::create_opener(&config.platform.open_command),
        )
        .with_target(config.target.clone())
        .with_encoder(PayloadEncoder::new(
            config.encoding.charset.clone(),
            config.encoding.percent_encode,
        ));

        if let Some(assets_dir) = &config.storage.assets_dir {
            let files_dir = config.storage.files_dir.clone().unwrap_or(files_dir);
            dispatcher = dispatcher.with_stager(AssetStager::new(
                Box::new(DirAssetSource::new(assets_dir)),
                files_dir,
            ));
        }

        dispatcher.set_allow_fallback(config.general.allow_fallback);
        dispatcher
    }

    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.target = target;
        self
    }

    pub fn with_encoder(mut self, encoder: PayloadEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_stager(mut self, stager: AssetStager) -> Self {
        self.stager = Some(stager);
        self
    }

    /// Set whether a missing app falls back to the web URL
    /// Only affects posts made after the call
    pub fn set_allow_fallback(&mut self, enabled: bool) {
        self.config.allow_fallback_when_app_missing = enabled;
    }

    pub fn stager(&self) -> Option<&AssetStager> {
        self.stager.as_ref()
    }

    /// Post a text message
    pub fn post_text(&self, message: &str) -> DispatchResult {
        self.post(&Payload::Text(message.to_string()))
    }

    /// Post an image by local path
    /// The path must be readable by the receiving app
    pub fn post_image(&self, path: &Path) -> DispatchResult {
        self.post(&Payload::ImagePath(path.to_path_buf()))
    }

    /// Stage a bundled asset into the files directory, then post it as an image
    ///
    /// An existing staged file with the same name is overwritten.
    pub fn post_assets_image(&self, asset_path: &str) -> DispatchResult {
        let Some(stager) = &self.stager else {
            log::warn!("No asset source configured, cannot stage {}", asset_path);
            return DispatchResult::AssetCopyFailed;
        };

        let name = match stager.stage(asset_path) {
            Ok(name) => name,
            Err(_) => return DispatchResult::AssetCopyFailed,
        };

        self.post_image(&stager.resolve(&name))
    }

    /// Post any payload
    pub fn post(&self, payload: &Payload) -> DispatchResult {
        let share = match self.share_uri(payload) {
            Ok(share) => share,
            Err(result) => return result,
        };

        match self.open(&share.uri) {
            Ok(()) => {
                log::info!(
                    "Posted {} via {:?}: {}",
                    payload.kind().segment(),
                    share.route,
                    payload.preview(40)
                );
                DispatchResult::Succeeded
            }
            Err(e) => {
                log::warn!("No handler for {}: {:#}", share.uri, e);
                DispatchResult::AppNotInstalled
            }
        }
    }

    /// Build the URI a post would open, without opening it
    ///
    /// Fails with `EncodingFailed` before the registry is consulted, and with
    /// `AppNotInstalled` when the app is absent and fallback is off.
    pub fn share_uri(&self, payload: &Payload) -> Result<ShareUri, DispatchResult> {
        let encoded = self.encoder.encode(payload).map_err(|e| {
            log::warn!("Failed to encode {} payload: {}", payload.kind().segment(), e);
            DispatchResult::EncodingFailed
        })?;

        let installed = self.registry.is_installed(&self.target.app_id);
        log::debug!(
            "{} reports {} {}",
            self.registry.name(),
            self.target.app_id,
            if installed { "installed" } else { "missing" }
        );

        let route = match (installed, self.config.allow_fallback_when_app_missing) {
            (true, _) => Route::App,
            (false, true) => Route::Web,
            (false, false) => return Err(DispatchResult::AppNotInstalled),
        };

        Ok(ShareUri {
            route,
            uri: self.build_uri(route, payload.kind(), &encoded),
        })
    }

    fn build_uri(&self, route: Route, kind: PayloadKind, encoded: &str) -> String {
        let prefix = match route {
            Route::App => self.target.app_prefix.as_str(),
            Route::Web => self.target.web_prefix.as_str(),
        };
        // Only one separator is dropped so scheme-only prefixes keep their `//`
        let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
        format!("{}/{}/{}", prefix, kind.segment(), encoded)
    }

    fn open(&self, uri: &str) -> Result<()> {
        log::debug!("Opening {} with {}", uri, self.opener.name());
        self.opener.open_uri(uri)
    }
}
