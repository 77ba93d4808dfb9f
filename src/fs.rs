//! Filesystem seam for pseudo-file readers.
//!
//! The `FileSystem` trait allows the Linux and macOS readers to work against the
//! real `/proc` and `/sys` trees or against `mock::MockFs` in tests.

use std::io;
use std::path::{Path, PathBuf};

/// Total and available capacity of a mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsCapacity {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Total capacity of the filesystem mounted at `mount_point`.
    fn total_space(&self, mount_point: &Path) -> io::Result<u64>;

    /// Space available to unprivileged users on the filesystem at `mount_point`.
    fn free_space(&self, mount_point: &Path) -> io::Result<u64>;
}

/// Real filesystem implementation that delegates to `std::fs` and `statvfs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn total_space(&self, mount_point: &Path) -> io::Result<u64> {
        statvfs(mount_point).map(|c| c.total_bytes)
    }

    fn free_space(&self, mount_point: &Path) -> io::Result<u64> {
        statvfs(mount_point).map(|c| c.free_bytes)
    }
}

#[cfg(unix)]
fn statvfs(mount_point: &Path) -> io::Result<FsCapacity> {
    let stat = nix::sys::statvfs::statvfs(mount_point)?;
    let fragment = u64::from(stat.fragment_size());
    Ok(FsCapacity {
        total_bytes: u64::from(stat.blocks()).saturating_mul(fragment),
        free_bytes: u64::from(stat.blocks_available()).saturating_mul(fragment),
    })
}

#[cfg(not(unix))]
fn statvfs(_mount_point: &Path) -> io::Result<FsCapacity> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "statvfs is only available on unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_real_fs_read_to_string() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        let content = fs.read_to_string(&cargo_toml).unwrap();
        assert!(content.contains("[package]"));
    }

    #[test]
    fn test_real_fs_exists() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        assert!(fs.exists(&cargo_toml));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_capacity_of_root() {
        let fs = RealFs::new();
        let total = fs.total_space(Path::new("/")).unwrap();
        let free = fs.free_space(Path::new("/")).unwrap();
        assert!(total > 0);
        assert!(free <= total);
    }

    #[test]
    fn test_real_fs_capacity_of_missing_mount_fails() {
        let fs = RealFs::new();
        assert!(fs.total_space(Path::new("/nonexistent/path/12345")).is_err());
    }
}
