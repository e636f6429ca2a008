use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// An opened bundled resource: declared length plus a byte stream
pub struct AssetHandle {
    pub len: u64,
    pub reader: Box<dyn Read>,
}

/// Trait for read-only bundles of named assets
pub trait AssetSource {
    /// Open an asset by its bundle-relative path
    fn open(&self, path: &str) -> io::Result<AssetHandle>;
}

/// Assets stored under a directory on disk
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirAssetSource { root: root.into() }
    }
}

impl AssetSource for DirAssetSource {
    fn open(&self, path: &str) -> io::Result<AssetHandle> {
        let relative = Path::new(path);
        let inside_bundle = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside_bundle {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset path escapes the bundle: {}", path),
            ));
        }

        let file = File::open(self.root.join(relative))?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset is not a regular file: {}", path),
            ));
        }

        Ok(AssetHandle {
            len: meta.len(),
            reader: Box::new(file),
        })
    }
}

/// Assets held in memory, e.g. embedded with `include_bytes!`
#[derive(Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.assets.insert(path.into(), data.into());
    }

    pub fn with(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl AssetSource for MemoryAssetSource {
    fn open(&self, path: &str) -> io::Result<AssetHandle> {
        let data = self.assets.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such asset: {}", path))
        })?;
        Ok(AssetHandle {
            len: data.len() as u64,
            reader: Box::new(Cursor::new(data.clone())),
        })
    }
}

/// Staging failed; the cause is kept only for diagnostics
#[derive(Debug, thiserror::Error)]
#[error("Failed to copy asset {path}")]
pub struct AssetCopyFailed {
    pub path: String,
    #[source]
    pub source: io::Error,
}

/// Copies bundled assets into a writable files directory
///
/// The destination name is the last `/` segment of the asset path. Names
/// are not made unique: staging `a/x.png` then `b/x.png` leaves only the
/// second file.
pub struct AssetStager {
    source: Box<dyn AssetSource>,
    files_dir: PathBuf,
}

impl AssetStager {
    pub fn new(source: Box<dyn AssetSource>, files_dir: impl Into<PathBuf>) -> Self {
        AssetStager {
            source,
            files_dir: files_dir.into(),
        }
    }

    /// Absolute path of a staged file name
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = self.files_dir.join(name);
        if path.is_absolute() {
            return path;
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    }

    /// Copy an asset into the files directory, returning the local file name
    pub fn stage(&self, asset_path: &str) -> Result<String, AssetCopyFailed> {
        let fail = |source: io::Error| {
            log::warn!("Failed to stage asset {}: {}", asset_path, source);
            AssetCopyFailed {
                path: asset_path.to_string(),
                source,
            }
        };

        let name = destination_name(asset_path).ok_or_else(|| {
            fail(io::Error::new(
                io::ErrorKind::InvalidInput,
                "asset path has no file name",
            ))
        })?;

        let handle = self.source.open(asset_path).map_err(fail)?;
        self.copy_to(name, handle).map_err(fail)?;

        log::debug!("Staged asset {} as {:?}", asset_path, self.files_dir.join(name));
        Ok(name.to_string())
    }

    fn copy_to(&self, name: &str, handle: AssetHandle) -> io::Result<()> {
        fs::create_dir_all(&self.files_dir)?;
        let dest_path = self.files_dir.join(name);

        // File::create truncates, so a shorter asset never leaves stale bytes behind
        let mut dest = File::create(&dest_path)?;
        let mut reader = handle.reader.take(handle.len);
        let copied = io::copy(&mut reader, &mut dest)?;
        if copied != handle.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("copied {} of {} bytes", copied, handle.len),
            ));
        }
        dest.sync_all()?;

        set_world_readable(&dest_path)
    }
}

/// Final `/` segment of an asset path, if non-empty
pub fn destination_name(asset_path: &str) -> Option<&str> {
    asset_path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

#[cfg(unix)]
fn set_world_readable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_world_readable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortReadSource;

    impl AssetSource for ShortReadSource {
        fn open(&self, _path: &str) -> io::Result<AssetHandle> {
            Ok(AssetHandle {
                len: 10,
                reader: Box::new(Cursor::new(vec![1, 2, 3])),
            })
        }
    }

    #[test]
    fn test_destination_name() {
        assert_eq!(destination_name("image/test.png"), Some("test.png"));
        assert_eq!(destination_name("a/b/c/deep.jpg"), Some("deep.jpg"));
        assert_eq!(destination_name("plain.png"), Some("plain.png"));
        assert_eq!(destination_name("image/"), None);
        assert_eq!(destination_name(""), None);
        assert_eq!(destination_name("image/.."), None);
    }

    #[test]
    fn test_stage_copies_bytes() {
        let files = tempfile::tempdir().unwrap();
        let source = MemoryAssetSource::new().with("image/test.png", b"\x89PNG data".to_vec());
        let stager = AssetStager::new(Box::new(source), files.path());

        let name = stager.stage("image/test.png").unwrap();
        assert_eq!(name, "test.png");
        assert_eq!(
            fs::read(files.path().join("test.png")).unwrap(),
            b"\x89PNG data"
        );
        assert_eq!(stager.resolve(&name), files.path().join("test.png"));
    }

    #[test]
    fn test_stage_overwrites_same_name() {
        let files = tempfile::tempdir().unwrap();
        let source = MemoryAssetSource::new()
            .with("first/logo.png", b"first version, longer".to_vec())
            .with("second/logo.png", b"second".to_vec());
        let stager = AssetStager::new(Box::new(source), files.path());

        stager.stage("first/logo.png").unwrap();
        stager.stage("second/logo.png").unwrap();

        let entries: Vec<_> = fs::read_dir(files.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read(files.path().join("logo.png")).unwrap(), b"second");
    }

    #[test]
    fn test_stage_twice_keeps_one_file() {
        let files = tempfile::tempdir().unwrap();
        let mut source = MemoryAssetSource::new();
        source.insert("image/test.png", b"v1".to_vec());
        let stager = AssetStager::new(Box::new(source), files.path());

        stager.stage("image/test.png").unwrap();
        stager.stage("image/test.png").unwrap();

        assert_eq!(fs::read_dir(files.path()).unwrap().count(), 1);
        assert_eq!(fs::read(files.path().join("test.png")).unwrap(), b"v1");
    }

    #[test]
    fn test_stage_missing_asset_fails() {
        let files = tempfile::tempdir().unwrap();
        let stager = AssetStager::new(Box::new(MemoryAssetSource::new()), files.path());

        let err = stager.stage("image/test.png").unwrap_err();
        assert_eq!(err.path, "image/test.png");
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
        assert!(!files.path().join("test.png").exists());
    }

    #[test]
    fn test_stage_short_read_fails() {
        let files = tempfile::tempdir().unwrap();
        let stager = AssetStager::new(Box::new(ShortReadSource), files.path());

        let err = stager.stage("image/short.png").unwrap_err();
        assert_eq!(err.source.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_stage_creates_files_dir() {
        let base = tempfile::tempdir().unwrap();
        let files_dir = base.path().join("nested/files");
        let source = MemoryAssetSource::new().with("a.png", b"x".to_vec());
        let stager = AssetStager::new(Box::new(source), &files_dir);

        stager.stage("a.png").unwrap();
        assert!(files_dir.join("a.png").is_file());
    }

    #[test]
    fn test_dir_source_reads_bundle() {
        let bundle = tempfile::tempdir().unwrap();
        fs::create_dir_all(bundle.path().join("image")).unwrap();
        fs::write(bundle.path().join("image/test.png"), b"pixels").unwrap();
        let files = tempfile::tempdir().unwrap();

        let stager = AssetStager::new(Box::new(DirAssetSource::new(bundle.path())), files.path());
        let name = stager.stage("image/test.png").unwrap();
        assert_eq!(fs::read(files.path().join(name)).unwrap(), b"pixels");
    }

    #[test]
    fn test_dir_source_rejects_escape() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("assets");
        fs::create_dir_all(root.join("image")).unwrap();
        fs::write(base.path().join("secret.png"), b"outside").unwrap();
        let source = DirAssetSource::new(&root);

        let err = source.open("../secret.png").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = source.open("image/../../secret.png").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(source.open(base.path().join("secret.png").to_str().unwrap()).is_err());

        // Directories exist but are not assets
        let err = source.open("image").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn test_staged_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let files = tempfile::tempdir().unwrap();
        let source = MemoryAssetSource::new().with("a.png", b"x".to_vec());
        let stager = AssetStager::new(Box::new(source), files.path());
        stager.stage("a.png").unwrap();

        let mode = fs::metadata(files.path().join("a.png"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
