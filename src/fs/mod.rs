//! FileSystem abstraction for deployment writes

mod mock;
mod real;

pub use mock::MockFileSystem;
pub use real::RealFileSystem;

use std::io;
use std::path::Path;

/// The operations the deployment stage needs from a writable root
pub trait FileSystem: Send + Sync {
    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create exactly one new directory; fails if it already exists
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Write a file, replacing any existing content
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}
