//! Deterministic doubles for the filesystem and command seams.
//!
//! `MockFs` simulates pseudo-files in memory and `MockExecutor` returns canned
//! command output, so every reader can be exercised without a real host.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::exec::CommandExecutor;
use crate::fs::{FileSystem, FsCapacity};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    capacities: HashMap<PathBuf, FsCapacity>,
    /// Mounts whose free-space query fails while the total query succeeds.
    broken_free: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file, simulating a source that became unreadable.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    /// Registers a mount point with a fixed size.
    pub fn add_mount(&mut self, mount_point: impl AsRef<Path>, total_bytes: u64, free_bytes: u64) {
        self.capacities.insert(
            mount_point.as_ref().to_path_buf(),
            FsCapacity {
                total_bytes,
                free_bytes,
            },
        );
    }

    /// Registers a mount point whose free-space query fails.
    pub fn add_mount_with_broken_free(&mut self, mount_point: impl AsRef<Path>, total_bytes: u64) {
        self.add_mount(&mount_point, total_bytes, 0);
        self.broken_free.insert(mount_point.as_ref().to_path_buf());
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("mock: no such path {}", path.display()),
    )
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(not_found(path));
        }
        let mut entries: Vec<PathBuf> = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }

    fn total_space(&self, mount_point: &Path) -> io::Result<u64> {
        self.capacities
            .get(mount_point)
            .map(|c| c.total_bytes)
            .ok_or_else(|| not_found(mount_point))
    }

    fn free_space(&self, mount_point: &Path) -> io::Result<u64> {
        if self.broken_free.contains(mount_point) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mock: free space query denied",
            ));
        }
        self.capacities
            .get(mount_point)
            .map(|c| c.free_bytes)
            .ok_or_else(|| not_found(mount_point))
    }
}

/// Canned response for one command line.
#[derive(Debug, Clone)]
enum Canned {
    Output(String),
    Fail(Option<i32>),
    Hang,
}

/// Command executor returning canned text keyed by the full command line
/// (`program` and `args` joined with single spaces).
///
/// Unregistered commands behave like a missing binary.
#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command_line: &str, output: &str) -> Self {
        self.responses
            .insert(command_line.to_string(), Canned::Output(output.to_string()));
        self
    }

    pub fn with_failure(mut self, command_line: &str, code: i32) -> Self {
        self.responses
            .insert(command_line.to_string(), Canned::Fail(Some(code)));
        self
    }

    /// The command never finishes on its own; only the timeout ends it.
    pub fn with_hang(mut self, command_line: &str) -> Self {
        self.responses.insert(command_line.to_string(), Canned::Hang);
        self
    }

    /// Command lines issued so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ExecError> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        match self.responses.get(&line) {
            Some(Canned::Output(out)) => Ok(out.trim().to_string()),
            Some(Canned::Fail(code)) => Err(ExecError::Failed {
                program: program.to_string(),
                code: *code,
            }),
            Some(Canned::Hang) => {
                tokio::time::sleep(timeout).await;
                Err(ExecError::Timeout {
                    program: program.to_string(),
                    timeout,
                })
            }
            None => Err(ExecError::NotFound {
                program: program.to_string(),
            }),
        }
    }
}
