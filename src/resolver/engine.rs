//! The manifest engine: dependency resolution and staleness tracking.
//!
//! A `Resolver` owns the configured inputs (entry globs, search paths,
//! library globs) and `rebuild()` produces an immutable `Snapshot`: the
//! ordered manifest, the provided-file table and the staleness watermark.
//! Rebuilds are value-returning and all-or-nothing — a failed rebuild
//! leaves the previous snapshot in effect, and callers never observe a
//! partially-built manifest.
//!
//! `Engine` wraps a `Resolver` for the serving layer: lock-free snapshot
//! reads through `ArcSwap`, rebuilds serialized by a mutex.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use jwalk::WalkDir;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::resolver::directive::{self, Directive};
use crate::resolver::error::ResolveError;
use crate::resolver::expand::expand_paths;
use crate::resolver::library::LibraryTable;
use crate::resolver::roots::RootSet;
use crate::utils::path::normalize_path;
use crate::{debug, freshness, log};

// ============================================================================
// Snapshot
// ============================================================================

/// Immutable result of one successful rebuild.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Ordered, de-duplicated asset URIs; a file appears only after
    /// everything it requires.
    pub manifest: Vec<String>,
    /// URI → absolute path for every servable file. Superset of the
    /// manifest: provided files need not be required.
    pub provided: FxHashMap<String, PathBuf>,
    /// Newest mtime observed across tracked files at build time.
    pub watermark: Option<SystemTime>,
    /// Entry files that seeded resolution.
    pub source_files: Vec<PathBuf>,
}

impl Snapshot {
    /// All files whose mtimes the watermark covers.
    pub fn tracked_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.source_files.iter().chain(self.provided.values())
    }

    /// Current newest mtime across tracked files. `None` when a tracked
    /// file has vanished, which also reads as stale.
    pub fn current_mtime(&self) -> Option<SystemTime> {
        freshness::max_mtime(self.tracked_paths())
    }

    /// True if any tracked file changed since this snapshot was built.
    pub fn is_stale(&self) -> bool {
        match (self.watermark, self.current_mtime()) {
            (Some(watermark), Some(current)) => current > watermark,
            _ => true,
        }
    }

    /// True if any tracked file is newer than `reference` — used to judge
    /// on-disk bundle artifacts by their own mtime.
    pub fn newer_than(&self, reference: SystemTime) -> bool {
        match self.current_mtime() {
            Some(current) => current > reference,
            None => true,
        }
    }

    /// Look up the absolute path serving a URI.
    pub fn path_for(&self, uri: &str) -> Option<&Path> {
        self.provided.get(uri).map(PathBuf::as_path)
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Configured inputs for dependency resolution.
///
/// Paths are absolute; globs are relative to their bases (the project root
/// for `source_globs`, each search path for the library globs).
#[derive(Debug, Clone)]
pub struct Resolver {
    pub project_root: PathBuf,
    pub app_root: PathBuf,
    pub source_globs: Vec<String>,
    pub search_paths: Vec<PathBuf>,
    pub library_root_globs: Vec<String>,
    pub library_globs: Vec<String>,
}

impl Resolver {
    /// Run one full resolution pass.
    ///
    /// Source files, roots and libraries are re-discovered every pass; the
    /// manifest is rebuilt wholesale, never patched.
    pub fn rebuild(&self) -> Result<Snapshot, ResolveError> {
        let source_files =
            expand_paths(std::slice::from_ref(&self.project_root), &self.source_globs);

        let mut roots = RootSet::new();
        for dir in expand_paths(&self.search_paths, &self.library_root_globs) {
            if dir.is_dir() {
                roots.push_library(dir);
            }
        }
        roots.push_app(self.app_root.clone());

        let library_files = expand_paths(&self.search_paths, &self.library_globs);
        let libraries = LibraryTable::from_paths(&library_files);

        let mut builder = ManifestBuilder {
            roots: &roots,
            libraries: &libraries,
            manifest: Vec::new(),
            provided: FxHashMap::default(),
            visited: FxHashSet::default(),
        };

        for path in &source_files {
            builder.require(path)?;
        }

        let ManifestBuilder {
            manifest, provided, ..
        } = builder;

        let watermark = freshness::max_mtime(source_files.iter().chain(provided.values()));

        log!(
            "resolve";
            "{} source files, {} libraries available, {} assets provided, {} files in manifest",
            source_files.len(),
            libraries.len(),
            provided.len(),
            manifest.len()
        );

        Ok(Snapshot {
            manifest,
            provided,
            watermark,
            source_files,
        })
    }
}

// ============================================================================
// ManifestBuilder (one resolution pass)
// ============================================================================

/// Accumulator for a single depth-first pass. Owned by the pass, never
/// shared, so a failed pass leaves nothing behind.
struct ManifestBuilder<'a> {
    roots: &'a RootSet,
    libraries: &'a LibraryTable,
    manifest: Vec<String>,
    provided: FxHashMap<String, PathBuf>,
    visited: FxHashSet<String>,
}

impl ManifestBuilder<'_> {
    /// Add `path` and everything it requires to the manifest, dependencies
    /// first.
    fn require(&mut self, path: &Path) -> Result<(), ResolveError> {
        let uri = self.roots.uri_for(path)?;

        // Marking before recursion is the cycle breaker: a file that
        // (indirectly) requires itself is expanded once, then skipped.
        if !self.visited.insert(uri.clone()) {
            return Ok(());
        }

        debug!("resolve"; "requiring {} -> {}", path.display(), uri);

        self.preprocess(path)?;

        // Appended only after its dependencies: topological order.
        self.manifest.push(uri.clone());
        self.provided.insert(uri, path.to_path_buf());
        Ok(())
    }

    /// Expand the directives inside one file.
    fn preprocess(&mut self, path: &Path) -> Result<(), ResolveError> {
        let contents = fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        for (line, parsed) in directive::scan(&contents) {
            match parsed {
                Directive::RequireLibrary(name) => {
                    let candidate = self.libraries.get(&name).map(Path::to_path_buf);
                    let target = lint_file(candidate, &format!("<{name}>"), path, line)?;
                    self.require(&target)?;
                }
                Directive::RequireRelative(reference) => {
                    let with_ext = directive::with_default_ext(&reference);
                    let target = lint_file(Some(dir.join(with_ext)), &reference, path, line)?;
                    self.require(&target)?;
                }
                Directive::ProvideRelative(reference) => {
                    let target = lint_exists(dir.join(&reference), &reference, path, line)?;
                    self.provide(&target)?;
                }
            }
        }
        Ok(())
    }

    /// Register a file or directory for serving without touching manifest
    /// order. Directories are walked recursively.
    fn provide(&mut self, path: &Path) -> Result<(), ResolveError> {
        debug!("resolve"; "providing {}", path.display());

        if path.is_dir() {
            for entry in WalkDir::new(path).sort(true) {
                let entry = entry.map_err(|e| {
                    ResolveError::io(path, std::io::Error::other(e.to_string()))
                })?;
                let sub = entry.path();
                if sub.is_file() {
                    let uri = self.roots.uri_for(&sub)?;
                    self.provided.insert(uri, sub);
                }
            }
        } else {
            let uri = self.roots.uri_for(path)?;
            self.provided.insert(uri, path.to_path_buf());
        }
        Ok(())
    }
}

/// Resolve a require target to a canonical, readable file; anything else is
/// an unknown-asset error naming the directive's location.
fn lint_file(
    candidate: Option<PathBuf>,
    reference: &str,
    file: &Path,
    line: usize,
) -> Result<PathBuf, ResolveError> {
    candidate
        .map(|p| normalize_path(&p))
        .filter(|p| p.is_file() && fs::File::open(p).is_ok())
        .ok_or_else(|| ResolveError::UnknownAsset {
            reference: reference.to_string(),
            file: file.to_path_buf(),
            line,
        })
}

/// Resolve a provide target, which may be a directory or a readable file.
fn lint_exists(
    candidate: PathBuf,
    reference: &str,
    file: &Path,
    line: usize,
) -> Result<PathBuf, ResolveError> {
    let resolved = normalize_path(&candidate);
    let usable = resolved.is_dir() || (resolved.is_file() && fs::File::open(&resolved).is_ok());
    if usable {
        Ok(resolved)
    } else {
        Err(ResolveError::UnknownAsset {
            reference: reference.to_string(),
            file: file.to_path_buf(),
            line,
        })
    }
}

// ============================================================================
// Engine (shared serving state)
// ============================================================================

/// Shared manifest state for the serving layer.
///
/// Readers take lock-free snapshot loads; rebuilds are serialized by a
/// mutex and the snapshot is replaced wholesale on success only, so
/// concurrent readers always see a fully-consistent manifest.
pub struct Engine {
    resolver: Resolver,
    current: ArcSwapOption<Snapshot>,
    rebuild_lock: Mutex<()>,
}

impl Engine {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            current: ArcSwapOption::const_empty(),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Latest successful snapshot, fresh or not.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Return a fresh snapshot, rebuilding first if anything tracked
    /// changed. On rebuild failure the previous snapshot stays current and
    /// the error propagates to the caller.
    pub fn refresh(&self) -> Result<Arc<Snapshot>, ResolveError> {
        if let Some(snapshot) = self.current.load_full()
            && !snapshot.is_stale()
        {
            return Ok(snapshot);
        }

        let _guard = self.rebuild_lock.lock();

        // Another thread may have rebuilt while this one waited.
        if let Some(snapshot) = self.current.load_full()
            && !snapshot.is_stale()
        {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(self.resolver.rebuild()?);
        self.current.store(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    /// Test project: `public/` app root, `packages/` library search path.
    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("public")).unwrap();
            fs::create_dir_all(dir.path().join("packages")).unwrap();
            Self { dir }
        }

        fn write(&self, relative: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
            path
        }

        fn resolver(&self, source_globs: &[&str]) -> Resolver {
            Resolver {
                project_root: self.dir.path().to_path_buf(),
                app_root: self.dir.path().join("public"),
                source_globs: source_globs.iter().map(|s| s.to_string()).collect(),
                search_paths: vec![self.dir.path().join("packages")],
                library_root_globs: vec!["*/public".to_string()],
                library_globs: vec!["*/public/vendor/*.js".to_string()],
            }
        }
    }

    #[test]
    fn test_library_require_chain_ordering() {
        // app.js -> "lib/a.js" -> <jquery> yields jquery, a, app
        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= require \"lib/a.js\"\n");
        fixture.write("public/lib/a.js", "//= require <jquery>\n");
        fixture.write("packages/jq/public/vendor/jquery.js", "window.$ = {};\n");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();

        assert_eq!(
            snapshot.manifest,
            vec!["/vendor/jquery.js", "/lib/a.js", "/app.js"]
        );
        // every manifest URI is also provided
        for uri in &snapshot.manifest {
            assert!(snapshot.path_for(uri).is_some());
        }
    }

    #[test]
    fn test_diamond_requires_once_dependency_first() {
        let fixture = Fixture::new();
        fixture.write(
            "public/app.js",
            "//= require \"b\"\n//= require \"c\"\n",
        );
        fixture.write("public/b.js", "//= require \"d\"\n");
        fixture.write("public/c.js", "//= require \"d\"\n");
        fixture.write("public/d.js", "var d;\n");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();

        assert_eq!(snapshot.manifest, vec!["/d.js", "/b.js", "/c.js", "/app.js"]);
    }

    #[test]
    fn test_require_cycle_terminates() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= require \"loop\"\n");
        fixture.write("public/loop.js", "//= require \"app\"\n//= require \"loop\"\n");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();

        // each file exactly once, loop finished before app
        assert_eq!(snapshot.manifest, vec!["/loop.js", "/app.js"]);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= require \"b\"\n");
        fixture.write("public/b.js", "var b;\n");

        let resolver = fixture.resolver(&["public/*.js"]);
        let first = resolver.rebuild().unwrap();
        let second = resolver.rebuild().unwrap();

        assert_eq!(first.manifest, second.manifest);
    }

    #[test]
    fn test_extensionless_require_gets_js() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= require \"widget\"\n");
        fixture.write("public/widget.js", "var w;\n");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();
        assert_eq!(snapshot.manifest, vec!["/widget.js", "/app.js"]);
    }

    #[test]
    fn test_provide_directory_outside_manifest_order() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= provide \"images\"\n");
        fixture.write("public/images/bg.png", "png");
        fixture.write("public/images/icons/ok.png", "png");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();

        assert_eq!(snapshot.manifest, vec!["/app.js"]);
        assert!(snapshot.path_for("/images/bg.png").is_some());
        assert!(snapshot.path_for("/images/icons/ok.png").is_some());
    }

    #[test]
    #[cfg(unix)]
    fn test_provide_unreadable_file_fails_rebuild() {
        use std::os::unix::fs::PermissionsExt;

        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= provide \"data.bin\"\n");
        let data = fixture.write("public/data.bin", "x");
        fs::set_permissions(&data, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged runners can open the file regardless of its mode;
        // the check only bites when the open actually fails
        if fs::File::open(&data).is_err() {
            assert!(fixture.resolver(&["public/app.js"]).rebuild().is_err());
        }

        fs::set_permissions(&data, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn test_unknown_asset_names_file_and_line() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "var a;\n//= require \"missing\"\n");

        let err = fixture.resolver(&["public/app.js"]).rebuild().unwrap_err();
        match err {
            ResolveError::UnknownAsset {
                reference,
                file,
                line,
            } => {
                assert_eq!(reference, "missing");
                assert!(file.ends_with("app.js"));
                assert_eq!(line, 2);
            }
            other => panic!("expected UnknownAsset, got {other}"),
        }
    }

    #[test]
    fn test_unknown_library_fails_rebuild() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "//= require <nothere>\n");

        let err = fixture.resolver(&["public/app.js"]).rebuild().unwrap_err();
        assert!(err.to_string().contains("<nothere>"));
    }

    #[test]
    fn test_traversal_escape_fails_rebuild() {
        let fixture = Fixture::new();
        fixture.write("secret.js", "var s;\n");
        fixture.write("public/app.js", "//= require \"../secret.js\"\n");

        assert!(fixture.resolver(&["public/app.js"]).rebuild().is_err());
    }

    #[test]
    fn test_staleness_after_touch() {
        let fixture = Fixture::new();
        let app = fixture.write("public/app.js", "var a;\n");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();
        assert!(!snapshot.is_stale());

        let future = SystemTime::now() + Duration::from_secs(60);
        fs::File::open(&app).unwrap().set_modified(future).unwrap();
        assert!(snapshot.is_stale());
    }

    #[test]
    fn test_newer_than_artifact_reference() {
        let fixture = Fixture::new();
        fixture.write("public/app.js", "var a;\n");

        let snapshot = fixture.resolver(&["public/app.js"]).rebuild().unwrap();
        let past = SystemTime::now() - Duration::from_secs(3600);
        let future = SystemTime::now() + Duration::from_secs(3600);

        assert!(snapshot.newer_than(past));
        assert!(!snapshot.newer_than(future));
    }

    #[test]
    fn test_engine_keeps_old_snapshot_on_failure() {
        let fixture = Fixture::new();
        let app = fixture.write("public/app.js", "var a;\n");

        let engine = Engine::new(fixture.resolver(&["public/app.js"]));
        let first = engine.refresh().unwrap();
        assert_eq!(first.manifest, vec!["/app.js"]);

        // Break the entry file and force staleness
        fs::write(&app, "//= require \"missing\"\n").unwrap();
        let future = SystemTime::now() + Duration::from_secs(60);
        fs::File::open(&app).unwrap().set_modified(future).unwrap();

        assert!(engine.refresh().is_err());
        let kept = engine.current().unwrap();
        assert_eq!(kept.manifest, vec!["/app.js"]);
    }

    #[test]
    fn test_concurrent_refresh_converges_on_one_snapshot() {
        let fixture = Fixture::new();
        let app = fixture.write("public/app.js", "//= require \"b\"\n");
        fixture.write("public/b.js", "var b;\n");

        let engine = Engine::new(fixture.resolver(&["public/app.js"]));
        engine.refresh().unwrap();

        // Advance a tracked mtime so every thread finds the snapshot stale
        let future = SystemTime::now() + Duration::from_secs(60);
        fs::File::open(&app).unwrap().set_modified(future).unwrap();
        assert!(engine.current().unwrap().is_stale());

        let snapshots: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| engine.refresh().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // The mutex serializes one rebuild; the double-check hands every
        // other thread the stored snapshot
        for snapshot in &snapshots {
            assert_eq!(snapshot.manifest, vec!["/b.js", "/app.js"]);
            assert!(Arc::ptr_eq(snapshot, &snapshots[0]));
        }
        assert!(!engine.current().unwrap().is_stale());
    }
}
