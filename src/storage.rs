use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::NoteError;

/// `~/.jotter`, created on demand.
pub fn app_dir() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(".jotter");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Read a UTF-8 file, treating a missing file as `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>, NoteError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(NoteError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write via a sibling temp file and rename so readers never see a torn file.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), NoteError> {
    let tmp_path = tmp_sibling(path);
    let write = |p: &Path| -> io::Result<()> {
        fs::write(p, content)?;
        fs::rename(p, path)
    };

    write(&tmp_path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        NoteError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = read_optional(&dir.path().join("absent.md")).expect("read");
        assert!(result.is_none());
    }

    #[test]
    fn atomic_write_replaces_content_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("2024-01-01.md");

        write_atomic(&path, "first").expect("write");
        write_atomic(&path, "second").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        assert!(!dir.path().join("2024-01-01.md.tmp").exists());
    }

    #[test]
    fn atomic_write_into_missing_folder_fails_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("note.md");

        let err = write_atomic(&path, "x").expect_err("folder does not exist");
        assert!(matches!(err, NoteError::Write { .. }));
        assert!(err.to_string().contains("note.md"));
    }
}
