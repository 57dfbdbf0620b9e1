//! Demonstration of deferring resource teardown to a cleanup registry.
//!
//! Each acquisition helper registers the release of what it acquired and
//! returns, so the caller never writes a cleanup block per resource.

pub mod logging;

use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teardown_core::{Error, Result};
use teardown_registry::{global, scope, settle, Defer, Global};
use tracing::info;

/// What the demonstration does
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Written to the temporary file and read back
    pub message: String,
    /// Where the temporary file is created, the system temp dir when unset
    pub dir: Option<PathBuf>,
    /// Register an additional action that always fails
    pub fail_cleanup: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            message: "hello world".to_string(),
            dir: None,
            fail_cleanup: false,
        }
    }
}

impl DemoConfig {
    fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Create a temporary file holding `message` and defer its removal
pub fn create_temp_file(defer: &impl Defer, dir: &Path, message: &str) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("teardown-")
        .tempfile_in(dir)
        .map_err(|e| Error::file_system(dir, "create temporary file", e))?;

    file.write_all(message.as_bytes())
        .map_err(|e| Error::file_system(file.path(), "write", e))?;

    let path = file
        .into_temp_path()
        .keep()
        .map_err(|e| Error::file_system(dir, "keep temporary file", e.error))?;

    let removed = path.clone();
    defer.defer(move || {
        info!(path = %removed.display(), "removing temporary file");
        fs::remove_file(&removed).map_err(|e| Error::file_system(&removed, "remove", e))
    });

    Ok(path)
}

/// A file opened for reading whose close is owned by a cleanup registry.
///
/// Clones share the same handle. Once the deferred close has run, reads fail.
#[derive(Debug, Clone)]
pub struct ReadHandle {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl ReadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.lock().is_some()
    }

    /// Read the remainder of the file
    pub fn read_to_string(&self) -> Result<String> {
        let mut guard = self.file.lock();
        let file = guard
            .as_mut()
            .ok_or_else(|| Error::file_system(&self.path, "read", closed()))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| Error::file_system(&self.path, "read", e))?;
        Ok(contents)
    }

    fn close(&self) -> io::Result<()> {
        match self.file.lock().take() {
            Some(file) => {
                drop(file);
                Ok(())
            }
            None => Err(closed()),
        }
    }
}

fn closed() -> io::Error {
    io::Error::other("file is already closed")
}

/// Open `path` for reading and defer closing the handle
pub fn open_file(defer: &impl Defer, path: &Path) -> Result<ReadHandle> {
    let file = File::open(path).map_err(|e| Error::file_system(path, "open", e))?;
    let handle = ReadHandle {
        path: path.to_path_buf(),
        file: Arc::new(Mutex::new(Some(file))),
    };

    let deferred = handle.clone();
    defer.defer_with_context(
        move || {
            info!(path = %deferred.path().display(), "closing file for reading");
            deferred.close()
        },
        "failed to close file: %s",
    );

    Ok(handle)
}

/// Write the configured message to a temporary file and read it back,
/// registering all teardown on `defer`.
pub fn read_back(defer: &impl Defer, config: &DemoConfig) -> Result<String> {
    let path = create_temp_file(defer, &config.dir(), &config.message)?;
    let file = open_file(defer, &path)?;

    if config.fail_cleanup {
        defer.defer_with_context(
            || Err(io::Error::other("simulated failure")),
            "failed to release simulated resource: %s",
        );
    }

    file.read_to_string()
}

/// Run the demonstration with a registry scoped to this call
pub fn run(config: &DemoConfig) -> Result<String> {
    scope(|registry| read_back(registry, config))
}

/// Run the demonstration against the process-wide registry
pub fn run_global(config: &DemoConfig) -> Result<String> {
    let outcome = read_back(&Global, config);
    settle(outcome, global::run())
}
