//! On-disk cache of extracted server releases.
//!
//! The store owns everything beneath its root. An entry for
//! `(version, token)` lives at `<root>/<version>/<token>/`, and the
//! executable sits one level deeper inside the platform directory that
//! published archives carry: `<root>/<version>/<token>/<token>/<exe>`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use unity_mcp_schema::{PlatformToken, executable_name};
use walkdir::WalkDir;

/// Directory under the root holding in-flight staging trees. Never a
/// valid version.
pub(crate) const STAGING_DIR: &str = ".tmp";

/// Maps `(version, token)` pairs onto cache directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Store rooted at `root`. Nothing is created until needed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every platform entry of one version.
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// Cache entry directory: `<root>/<version>/<token>/`.
    pub fn entry_dir(&self, version: &str, token: &PlatformToken) -> PathBuf {
        self.version_dir(version).join(token.to_string())
    }

    /// Canonical executable location: `<entry>/<token>/<exe>`.
    pub fn expected_executable_path(&self, version: &str, token: &PlatformToken) -> PathBuf {
        self.entry_dir(version, token)
            .join(token.to_string())
            .join(executable_name(token))
    }

    /// Path of the cached executable, if the entry holds one.
    ///
    /// Checks the canonical location first, then searches the entry the
    /// same way installation does.
    pub fn find_executable(&self, version: &str, token: &PlatformToken) -> Option<PathBuf> {
        let entry = self.entry_dir(version, token);
        locate_executable(&entry, token).map(|relative| entry.join(relative))
    }

    /// Whether the entry for `(version, token)` holds an executable.
    pub fn exists(&self, version: &str, token: &PlatformToken) -> bool {
        self.find_executable(version, token).is_some()
    }

    /// Create the version directory (and the root) if missing.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors from directory creation.
    pub fn ensure_version_dir(&self, version: &str) -> io::Result<PathBuf> {
        let dir = self.version_dir(version);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Fresh staging directory on the same filesystem as the entries, so
    /// that [`publish`](Self::publish) is a plain rename.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors from directory creation.
    pub fn staging_dir(&self) -> io::Result<TempDir> {
        let tmp = self.root.join(STAGING_DIR);
        fs::create_dir_all(&tmp)?;
        tempfile::Builder::new().prefix("stage-").tempdir_in(&tmp)
    }

    /// Move a fully extracted staging tree into place as the entry for
    /// `(version, token)`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors. On failure the staging tree is removed
    /// and no entry is left half-populated.
    pub fn publish(
        &self,
        staging: TempDir,
        version: &str,
        token: &PlatformToken,
    ) -> io::Result<PathBuf> {
        let entry = self.entry_dir(version, token);
        self.ensure_version_dir(version)?;
        remove_dir_if_exists(&entry)?;

        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, &entry) {
            fs::remove_dir_all(&staged).ok();
            return Err(e);
        }

        tracing::debug!(entry = %entry.display(), "published cache entry");
        Ok(entry)
    }

    /// Remove one version's subtree, or with `None` empty the whole cache.
    ///
    /// Clearing something that does not exist is not an error. The root
    /// itself is recreated after a full clear.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors other than "not found".
    pub fn clear(&self, version: Option<&str>) -> io::Result<()> {
        if let Some(version) = version {
            remove_dir_if_exists(&self.version_dir(version))
        } else {
            remove_dir_if_exists(&self.root)?;
            fs::create_dir_all(&self.root)
        }
    }

    /// Versions with a directory in the cache, sorted.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors other than a missing root.
    pub fn versions(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() && name != STAGING_DIR {
                versions.push(name);
            }
        }
        versions.sort();
        Ok(versions)
    }
}

/// Find the executable inside an extracted tree, relative to `root`.
///
/// Prefers the canonical `<token>/<exe>` location, then the first file with
/// the right name in a walk sorted by file name.
pub(crate) fn locate_executable(root: &Path, token: &PlatformToken) -> Option<PathBuf> {
    let name = executable_name(token);
    let canonical = PathBuf::from(token.to_string()).join(&name);
    if root.join(&canonical).is_file() {
        return Some(canonical);
    }

    let found = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|e| e.file_type().is_file() && e.file_name() == name.as_str())?;

    Some(found.path().strip_prefix(root).ok()?.to_path_buf())
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn token(s: &str) -> PlatformToken {
        s.parse().unwrap()
    }

    fn plant(store: &CacheStore, version: &str, t: &PlatformToken) -> PathBuf {
        let exe = store.expected_executable_path(version, t);
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, b"bin").unwrap();
        exe
    }

    #[test]
    fn test_layout_double_nests_token() {
        let store = CacheStore::new("/cache");
        let t = token("linux-x64");
        assert_eq!(
            store.entry_dir("1.2.3", &t),
            PathBuf::from("/cache/1.2.3/linux-x64")
        );
        assert_eq!(
            store.expected_executable_path("1.2.3", &t),
            PathBuf::from("/cache/1.2.3/linux-x64/linux-x64/unity-mcp-server")
        );
        assert_eq!(
            store.expected_executable_path("1.2.3", &token("win-arm64")),
            PathBuf::from("/cache/1.2.3/win-arm64/win-arm64/unity-mcp-server.exe")
        );
    }

    #[test]
    fn test_exists_requires_file() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let t = token("macos-arm64");
        assert!(!store.exists("1.0.0", &t));

        // A directory at the executable path is not a cached binary.
        fs::create_dir_all(store.expected_executable_path("1.0.0", &t)).unwrap();
        assert!(!store.exists("1.0.0", &t));
    }

    #[test]
    fn test_exists_finds_non_canonical_executable() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let t = token("linux-x64");
        let exe = store
            .entry_dir("1.0.0", &t)
            .join("bin")
            .join("unity-mcp-server");
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, b"bin").unwrap();

        assert!(store.exists("1.0.0", &t));
        assert_eq!(store.find_executable("1.0.0", &t), Some(exe));
        assert!(!store.exists("1.0.0", &token("linux-arm64")));
    }

    #[test]
    fn test_find_executable_prefers_canonical() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let t = token("win-x64");
        let stray = store.entry_dir("1.0.0", &t).join("a/unity-mcp-server.exe");
        fs::create_dir_all(stray.parent().unwrap()).unwrap();
        fs::write(&stray, b"MZ").unwrap();
        let exe = plant(&store, "1.0.0", &t);

        assert_eq!(store.find_executable("1.0.0", &t), Some(exe));
    }

    #[test]
    fn test_clear_single_version_keeps_siblings() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let t = token("linux-x64");
        plant(&store, "1.2.3", &t);
        plant(&store, "1.2.4", &t);

        store.clear(Some("1.2.3")).unwrap();

        assert!(!store.exists("1.2.3", &t));
        assert!(!store.version_dir("1.2.3").exists());
        assert!(store.exists("1.2.4", &t));
    }

    #[test]
    fn test_clear_all_recreates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("cache");
        let store = CacheStore::new(&root);
        let t = token("win-x64");
        plant(&store, "1.0.0", &t);
        plant(&store, "2.0.0", &t);

        store.clear(None).unwrap();

        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
        assert!(!store.exists("1.0.0", &t));
        assert!(!store.exists("2.0.0", &t));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("never-created"));
        store.clear(Some("9.9.9")).unwrap();
        store.clear(Some("9.9.9")).unwrap();
        store.clear(None).unwrap();
        store.clear(None).unwrap();
    }

    #[test]
    fn test_publish_replaces_entry() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let t = token("linux-arm64");
        let old = plant(&store, "1.0.0", &t);
        fs::write(old.with_file_name("stale.txt"), b"old").unwrap();

        let staging = store.staging_dir().unwrap();
        let staged_exe = staging.path().join("linux-arm64/unity-mcp-server");
        fs::create_dir_all(staged_exe.parent().unwrap()).unwrap();
        fs::write(&staged_exe, b"new").unwrap();
        let staged_root = staging.path().to_path_buf();

        let entry = store.publish(staging, "1.0.0", &t).unwrap();

        assert_eq!(entry, store.entry_dir("1.0.0", &t));
        assert_eq!(fs::read(&old).unwrap(), b"new");
        assert!(!old.with_file_name("stale.txt").exists());
        assert!(!staged_root.exists());
    }

    #[test]
    fn test_versions_skips_staging() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(store.versions().unwrap().is_empty());

        let t = token("linux-x64");
        plant(&store, "2.0.0", &t);
        plant(&store, "1.0.0", &t);
        let _staging = store.staging_dir().unwrap();

        assert_eq!(store.versions().unwrap(), vec!["1.0.0", "2.0.0"]);
    }
}
