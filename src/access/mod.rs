//! Traced file access.
//!
//! [`TracedOpener`] decorates any [`ResourceOpener`]: every open is delegated
//! first, and only a successful open is classified against
//! [`AccessPatterns`]. Qualifying paths are appended to an [`AccessSink`] and
//! logged. The handle returned to the caller is always the delegate's own.

mod log;
mod patterns;

pub use log::{AccessLog, AccessSink, TracedAccessEvent};
pub use patterns::{
    AccessClassification, AccessPatterns, DEFAULT_EXCLUDED_PATTERNS, DEFAULT_INTERESTING_PATTERNS,
};

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// The primitive "open this resource by path and options" operation.
pub trait ResourceOpener {
    type Handle;

    fn open(&self, path: &Path, options: &OpenOptions) -> io::Result<Self::Handle>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>
    where
        Self::Handle: Read,
    {
        let mut handle = self.open(path, &read_only())?;
        let mut content = String::new();
        handle.read_to_string(&mut content)?;
        Ok(content)
    }
}

impl<O: ResourceOpener + ?Sized> ResourceOpener for &O {
    type Handle = O::Handle;

    fn open(&self, path: &Path, options: &OpenOptions) -> io::Result<Self::Handle> {
        (**self).open(path, options)
    }
}

/// Opens real files through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl ResourceOpener for FsOpener {
    type Handle = File;

    fn open(&self, path: &Path, options: &OpenOptions) -> io::Result<File> {
        options.open(path)
    }
}

pub fn read_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true);
    options
}

pub struct TracedOpener<O, S> {
    inner: O,
    patterns: AccessPatterns,
    sink: S,
    installed: AtomicBool,
}

impl<O, S> TracedOpener<O, S>
where
    O: ResourceOpener,
    S: AccessSink,
{
    /// Wraps `inner`; tracing starts installed.
    pub fn new(inner: O, patterns: AccessPatterns, sink: S) -> Self {
        Self {
            inner,
            patterns,
            sink,
            installed: AtomicBool::new(true),
        }
    }

    pub fn install(&self) {
        self.installed.store(true, Ordering::SeqCst);
    }

    /// Stops recording; later opens go straight to the delegate.
    pub fn restore(&self) {
        self.installed.store(false, Ordering::SeqCst);
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Installs tracing until the returned guard is dropped.
    pub fn scoped(&self) -> TraceScope<'_, O, S> {
        self.install();
        TraceScope { opener: self }
    }

    fn observe(&self, path: &Path) {
        if !self.is_installed() {
            return;
        }

        let classification = self.patterns.classify(&path.to_string_lossy());
        if !classification.should_record() {
            return;
        }

        info!(
            path = %classification.path,
            patterns = ?classification.matched_patterns,
            "file read: {}",
            classification.path
        );
        self.sink.append(classification);
    }
}

impl<O> TracedOpener<O, std::sync::Arc<AccessLog>>
where
    O: ResourceOpener,
{
    pub fn snapshot(&self) -> Vec<TracedAccessEvent> {
        self.sink.snapshot()
    }
}

impl<O, S> ResourceOpener for TracedOpener<O, S>
where
    O: ResourceOpener,
    S: AccessSink,
{
    type Handle = O::Handle;

    fn open(&self, path: &Path, options: &OpenOptions) -> io::Result<O::Handle> {
        let handle = self.inner.open(path, options)?;
        self.observe(path);
        Ok(handle)
    }
}

/// Keeps tracing installed for a lexical scope and restores the untraced
/// opener on every exit path, including unwinding.
pub struct TraceScope<'a, O, S>
where
    O: ResourceOpener,
    S: AccessSink,
{
    opener: &'a TracedOpener<O, S>,
}

impl<O, S> TraceScope<'_, O, S>
where
    O: ResourceOpener,
    S: AccessSink,
{
    pub fn opener(&self) -> &TracedOpener<O, S> {
        self.opener
    }
}

impl<O, S> Drop for TraceScope<'_, O, S>
where
    O: ResourceOpener,
    S: AccessSink,
{
    fn drop(&mut self) {
        self.opener.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AccessClassification, AccessLog, AccessPatterns, AccessSink, FsOpener, ResourceOpener,
        TracedOpener, read_only,
    };
    use std::fs::{self, OpenOptions};
    use std::io::{self, ErrorKind, Read, Write};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::{TempDir, tempdir};

    fn fixture(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().expect("tempdir");
        for (name, body) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(path, body).expect("write fixture");
        }
        dir
    }

    fn traced() -> TracedOpener<FsOpener, Arc<AccessLog>> {
        TracedOpener::new(FsOpener, AccessPatterns::default(), Arc::new(AccessLog::new()))
    }

    /// Records paths without touching the filesystem.
    struct FakeOpener;

    impl ResourceOpener for FakeOpener {
        type Handle = PathBuf;

        fn open(&self, path: &Path, _options: &OpenOptions) -> io::Result<PathBuf> {
            Ok(path.to_path_buf())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<AccessClassification>>,
    }

    impl AccessSink for RecordingSink {
        fn append(&self, access: AccessClassification) {
            self.seen.lock().expect("sink lock").push(access);
        }
    }

    #[test]
    fn records_only_qualifying_paths() {
        let dir = fixture(&[
            ("CLAUDE.md", "# project memory"),
            ("node_modules/foo/system.md", "vendored"),
            ("README.txt", "readme"),
        ]);
        let opener = traced();

        opener
            .open(&dir.path().join("CLAUDE.md"), &read_only())
            .expect("open CLAUDE.md");
        opener
            .open(&dir.path().join("node_modules/foo/system.md"), &read_only())
            .expect("open excluded file");
        opener
            .open(&dir.path().join("README.txt"), &read_only())
            .expect("open README");

        let events = opener.snapshot();
        assert_eq!(events.len(), 1);
        assert!(events[0].path.ends_with("CLAUDE.md"));
        assert_eq!(events[0].sequence_number, 0);
        assert!(!events[0].excluded);
        assert!(events[0].matched_patterns.contains(&"claude.md".to_string()));
    }

    #[test]
    fn relative_paths_are_recorded_as_given() {
        let sink = RecordingSink::default();
        let opener = TracedOpener::new(FakeOpener, AccessPatterns::default(), &sink);

        opener.open(Path::new("CLAUDE.md"), &read_only()).expect("open");
        opener
            .open(Path::new("/project/node_modules/foo/system.md"), &read_only())
            .expect("open");
        opener.open(Path::new("README.txt"), &read_only()).expect("open");

        let seen = sink.seen.lock().expect("sink lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "CLAUDE.md");
    }

    #[test]
    fn traced_handle_behaves_like_direct_open() {
        let dir = fixture(&[(".claude/system.md", "be terse")]);
        let path = dir.path().join(".claude/system.md");
        let opener = traced();

        let mut traced_content = String::new();
        opener
            .open(&path, &read_only())
            .expect("traced open")
            .read_to_string(&mut traced_content)
            .expect("read traced");
        let direct_content = fs::read_to_string(&path).expect("direct read");

        assert_eq!(traced_content, direct_content);
        assert_eq!(opener.read_to_string(&path).expect("helper read"), "be terse");
        assert_eq!(opener.snapshot().len(), 2);
    }

    #[test]
    fn write_options_are_forwarded_unchanged() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("prompt-notes.md");
        let opener = traced();

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        let mut handle = opener.open(&path, &options).expect("create through tracer");
        handle.write_all(b"appended").expect("write");
        drop(handle);

        assert_eq!(fs::read_to_string(&path).expect("read back"), "appended");
        assert_eq!(opener.snapshot().len(), 1);
    }

    #[test]
    fn ordering_follows_access_order() {
        let dir = fixture(&[("first.md", "1"), ("second.md", "2")]);
        let opener = traced();

        opener
            .open(&dir.path().join("first.md"), &read_only())
            .expect("first");
        opener
            .open(&dir.path().join("second.md"), &read_only())
            .expect("second");

        let events = opener.snapshot();
        assert_eq!(events.len(), 2);
        assert!(events[0].path.ends_with("first.md"));
        assert!(events[1].path.ends_with("second.md"));
        assert!(events[0].sequence_number < events[1].sequence_number);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let dir = fixture(&[("CLAUDE.md", "x")]);
        let opener = traced();
        opener
            .open(&dir.path().join("CLAUDE.md"), &read_only())
            .expect("open");

        assert_eq!(opener.snapshot(), opener.snapshot());
    }

    #[test]
    fn delegate_failure_propagates_and_records_nothing() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("missing-system.md");
        let opener = traced();

        let direct = FsOpener
            .open(&missing, &read_only())
            .expect_err("direct open fails");
        let traced_err = opener
            .open(&missing, &read_only())
            .expect_err("traced open fails");

        assert_eq!(traced_err.kind(), ErrorKind::NotFound);
        assert_eq!(traced_err.kind(), direct.kind());
        assert_eq!(traced_err.raw_os_error(), direct.raw_os_error());
        assert!(opener.snapshot().is_empty());
    }

    #[test]
    fn restore_stops_recording() {
        let dir = fixture(&[("CLAUDE.md", "x")]);
        let path = dir.path().join("CLAUDE.md");
        let opener = traced();

        opener.open(&path, &read_only()).expect("open");
        opener.restore();
        assert!(!opener.is_installed());
        opener.open(&path, &read_only()).expect("open after restore");

        assert_eq!(opener.snapshot().len(), 1);
    }

    #[test]
    fn scope_restores_on_early_error_return() {
        let dir = fixture(&[("CLAUDE.md", "x")]);
        let path = dir.path().join("CLAUDE.md");
        let opener = traced();
        opener.restore();

        let outcome: io::Result<()> = (|| {
            let scope = opener.scoped();
            assert!(scope.opener().is_installed());
            scope.opener().open(&path, &read_only())?;
            scope
                .opener()
                .open(&dir.path().join("absent.md"), &read_only())?;
            Ok(())
        })();

        assert!(outcome.is_err());
        assert!(!opener.is_installed());
        opener.open(&path, &read_only()).expect("open after scope");
        assert_eq!(opener.snapshot().len(), 1);
    }

    #[test]
    fn scope_restores_when_unwinding() {
        let opener = TracedOpener::new(
            FakeOpener,
            AccessPatterns::default(),
            Arc::new(AccessLog::new()),
        );
        opener.restore();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = opener.scoped();
            opener
                .open(Path::new("CLAUDE.md"), &read_only())
                .expect("open");
            panic!("scenario blew up");
        }));

        assert!(result.is_err());
        assert!(!opener.is_installed());
        assert_eq!(opener.snapshot().len(), 1);
    }

    #[test]
    fn custom_patterns_drive_classification() {
        let sink = RecordingSink::default();
        let opener = TracedOpener::new(FakeOpener, AccessPatterns::new(["agents"], ["vendor"]), &sink);

        opener.open(Path::new("AGENTS.md"), &read_only()).expect("open");
        opener.open(Path::new("CLAUDE.md"), &read_only()).expect("open");
        opener
            .open(Path::new("vendor/AGENTS.md"), &read_only())
            .expect("open");

        let seen = sink.seen.lock().expect("sink lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].matched_patterns, vec!["agents"]);
    }
}
