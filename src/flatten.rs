//! Folder flattening: move every file in a source tree into a single
//! destination directory.
//!
//! Name collisions skip the file rather than overwrite; nothing in the
//! destination is ever replaced.

use std::io;
use std::path::Path;

/// Outcome of a flatten run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlattenSummary {
    pub moved: usize,
    pub skipped: usize,
}

/// Move every file under `source` directly into `dest`.
pub fn flatten_tree(source: &Path, dest: &Path) -> io::Result<FlattenSummary> {
    std::fs::create_dir_all(dest)?;
    let mut summary = FlattenSummary::default();
    flatten_dir(source, dest, &mut summary)?;
    Ok(summary)
}

fn flatten_dir(dir: &Path, dest: &Path, summary: &mut FlattenSummary) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            flatten_dir(&path, dest, summary)?;
            continue;
        }

        let Some(name) = path.file_name() else {
            continue;
        };
        let target = dest.join(name);
        if path == target {
            continue;
        }
        if target.exists() {
            tracing::info!(file = %path.display(), "skipping existing file");
            summary.skipped += 1;
            continue;
        }

        move_file(&path, &target)?;
        tracing::info!(file = %path.display(), to = %target.display(), "moved");
        summary.moved += 1;
    }
    Ok(())
}

/// Rename, falling back to copy-then-remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_flatten_moves_nested_files() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        touch(&src.path().join("a.txt"), "a");
        touch(&src.path().join("nested/b.txt"), "b");
        touch(&src.path().join("nested/deeper/c.txt"), "c");

        let summary = flatten_tree(src.path(), dest.path()).unwrap();
        assert_eq!(summary.moved, 3);
        assert_eq!(summary.skipped, 0);
        assert!(dest.path().join("a.txt").exists());
        assert!(dest.path().join("b.txt").exists());
        assert!(dest.path().join("c.txt").exists());
        assert!(!src.path().join("nested/b.txt").exists());
    }

    #[test]
    fn test_flatten_skips_collisions() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        touch(&src.path().join("x/report.txt"), "new");
        touch(&dest.path().join("report.txt"), "original");

        let summary = flatten_tree(src.path(), dest.path()).unwrap();
        assert_eq!(summary.moved, 0);
        assert_eq!(summary.skipped, 1);
        // the existing file is untouched
        let kept = std::fs::read_to_string(dest.path().join("report.txt")).unwrap();
        assert_eq!(kept, "original");
    }
}
