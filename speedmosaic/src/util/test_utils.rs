//! fixtures shared by unit and integration tests.
use std::path::{Path, PathBuf};

/// a scratch directory under the OS temp dir that is removed on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> std::io::Result<ScratchDir> {
        let path = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        Ok(ScratchDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// writes a file into the scratch directory and returns its path.
    pub fn write(&self, filename: &str, contents: &str) -> std::io::Result<PathBuf> {
        let filepath = self.path.join(filename);
        std::fs::write(&filepath, contents)?;
        Ok(filepath)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// two links A (0,0)-(1,0) and B (1,0)-(2,0) as a link CSV.
pub const TWO_LINK_CSV: &str = "link_id,geometry,direction
A,\"LINESTRING (0 0, 1 0)\",both
B,\"LINESTRING (1 0, 2 0)\",both
";
