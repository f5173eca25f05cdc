//! On-disk fixtures for pipeline tests.
//!
//! Fixtures live in a [`TempDir`] that is removed when the workspace drops.

use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

/// Temporary directory holding input and output files for one test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates an empty workspace.
    ///
    /// # Errors
    /// Returns any error raised while creating the temporary directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Path of `name` inside the workspace; the file need not exist.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes `contents` verbatim to `name` and returns its path.
    ///
    /// # Errors
    /// Returns any error raised while writing the file.
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Writes a distance matrix, one space-separated row per line.
    ///
    /// # Errors
    /// Returns any error raised while writing the file.
    ///
    /// # Examples
    /// ```
    /// use affinage_test_support::fixtures::{Workspace, read};
    ///
    /// let workspace = Workspace::new()?;
    /// let path = workspace.write_matrix("m.txt", &[vec![0.0, 1.5], vec![1.5, 0.0]])?;
    /// assert_eq!(read(&path)?, "0 1.5\n1.5 0\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_matrix(&self, name: &str, rows: &[Vec<f64>]) -> io::Result<PathBuf> {
        let mut contents = String::new();
        for row in rows {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            let _ = writeln!(contents, "{}", line.join(" "));
        }
        self.write(name, &contents)
    }
}

/// Symmetric matrix for points on a line, `d(a, b) = |a - b|`.
#[must_use]
pub fn line_matrix(points: &[f64]) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|a| points.iter().map(|b| (a - b).abs()).collect())
        .collect()
}

/// Reads a file into a string.
///
/// # Errors
/// Returns any error raised while reading the file.
pub fn read(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}
