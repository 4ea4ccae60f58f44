//! Input discovery: one contract for every pipeline.
//!
//! List the entries of a directory (non-recursive), keep regular files whose
//! extension matches case-insensitively, return a sorted, de-duplicated list.

use std::fs;
use std::path::{Path, PathBuf};

/// Extensions accepted as calibration images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Extensions accepted as source videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mov"];

#[derive(thiserror::Error, Debug)]
pub enum DiscoverError {
    #[error("cannot read directory '{}': {source}", dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no {} files found in '{}'", extensions.join("/"), dir.display())]
    NoInputs {
        dir: PathBuf,
        extensions: Vec<String>,
    },
}

/// Whether `path` carries one of `extensions` (compared case-insensitively).
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|want| ext.eq_ignore_ascii_case(want.as_ref().trim_start_matches('.')))
}

/// Discover matching files in `dir`.
///
/// An empty result is an error: every pipeline treats "nothing to do" as
/// fatal.
pub fn discover_files<S: AsRef<str>>(
    dir: impl AsRef<Path>,
    extensions: &[S],
) -> Result<Vec<PathBuf>, DiscoverError> {
    let dir = dir.as_ref();
    let io_err = |source| DiscoverError::Io {
        dir: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        return Err(DiscoverError::NoInputs {
            dir: dir.to_path_buf(),
            extensions: extensions.iter().map(|e| e.as_ref().to_string()).collect(),
        });
    }
    log::debug!("discovered {} file(s) in {}", paths.len(), dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn matches_extensions_case_insensitively_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "c.JPG", "notes.txt", "d.png.bak", "e.Png"] {
            touch(tmp.path(), name);
        }
        fs::create_dir(tmp.path().join("nested.jpg")).unwrap();

        let found = discover_files(tmp.path(), IMAGE_EXTENSIONS).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG", "c.JPG", "e.Png"]);
    }

    #[test]
    fn empty_directory_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "clip.mp4");
        let err = discover_files(tmp.path(), VIDEO_EXTENSIONS).unwrap_err();
        assert!(matches!(err, DiscoverError::NoInputs { .. }));
        assert!(err.to_string().contains("mov"));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_files(tmp.path().join("absent"), IMAGE_EXTENSIONS).unwrap_err();
        assert!(matches!(err, DiscoverError::Io { .. }));
    }

    #[test]
    fn leading_dot_in_extension_list_is_ignored() {
        assert!(has_extension(Path::new("x/clip.MOV"), &[".mov"]));
        assert!(!has_extension(Path::new("x/clip"), &["mov"]));
    }
}
