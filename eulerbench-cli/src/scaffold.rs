//! Problem file scaffolding for `create`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of scaffolding one problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scaffold {
    /// A new file was written
    Created(PathBuf),
    /// The file was already there and was left untouched
    Exists(PathBuf),
}

/// Source of a fresh problem file
pub fn template(id: u32) -> String {
    format!(
        r#"use eulerbench::prelude::*;

/// Problem title
///
/// Problem description
#[problem]
pub struct Problem{id:04};

#[solve]
fn solve() -> i64 {{
    0
}}
"#
    )
}

/// Write `p{id:04}.rs` into `dir`, creating the directory if needed
pub fn create_problem(dir: &Path, id: u32) -> io::Result<Scaffold> {
    let path = dir.join(format!("p{id:04}.rs"));
    if path.exists() {
        return Ok(Scaffold::Exists(path));
    }
    fs::create_dir_all(dir)?;
    fs::write(&path, template(id))?;
    tracing::debug!(path = %path.display(), "created problem file");
    Ok(Scaffold::Created(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_padded_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("problems");
        let outcome = create_problem(&target, 12).unwrap();
        let path = target.join("p0012.rs");
        assert_eq!(outcome, Scaffold::Created(path.clone()));

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("pub struct Problem0012;"));
        assert!(text.contains("#[solve]"));
    }

    #[test]
    fn test_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p0001.rs");
        fs::write(&path, "// mine").unwrap();

        let outcome = create_problem(dir.path(), 1).unwrap();
        assert_eq!(outcome, Scaffold::Exists(path.clone()));
        assert_eq!(fs::read_to_string(path).unwrap(), "// mine");
    }
}
