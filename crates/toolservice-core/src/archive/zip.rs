//! Zip packaging of a directory tree
//!
//! Entries are written parent-before-children with paths relative to the packed
//! root. Links to regular files are stored as copies of their target; other
//! links are skipped. On Unix-like targets every entry carries explicit
//! permissions so the extracted project is readable and directories are
//! traversable, whatever the permissions of the scratch files were.

use super::{CompressionLevel, PackageError, Packager};
use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, ZipWriter};
use std::fs::File;
use std::io::Cursor;
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// rw-r--r--
#[cfg(not(windows))]
const UNIX_FILE_PERMISSIONS: u32 = 0o644;

/// rwxr-xr-x
#[cfg(not(windows))]
const UNIX_DIRECTORY_PERMISSIONS: u32 = 0o755;

/// Entries at or above this size need zip64 extensions
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Packager producing `application/zip` archives
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager {
    compression: CompressionLevel,
}

impl ZipPackager {
    pub fn new(compression: CompressionLevel) -> Self {
        Self { compression }
    }

    fn file_options(&self, size: u64) -> SimpleFileOptions {
        let (method, level) = match self.compression {
            CompressionLevel::Fastest => (CompressionMethod::Deflated, Some(1)),
            CompressionLevel::Default => (CompressionMethod::Deflated, None),
            CompressionLevel::Smallest => (CompressionMethod::Deflated, Some(9)),
            CompressionLevel::Stored => (CompressionMethod::Stored, None),
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level)
            .large_file(size >= LARGE_FILE_THRESHOLD);
        #[cfg(not(windows))]
        let options = options.unix_permissions(UNIX_FILE_PERMISSIONS);
        options
    }

    /// Store `path` (read through any symbolic link) as `name`
    fn add_file(
        &self,
        zip: &mut ZipWriter<Cursor<Vec<u8>>>,
        name: String,
        path: &Path,
    ) -> Result<(), PackageError> {
        let io_err = |source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(io_err)?.len();
        let mut file = File::open(path).map_err(io_err)?;
        zip.start_file(name, self.file_options(size))?;
        std::io::copy(&mut file, zip).map_err(io_err)?;
        Ok(())
    }

    fn directory_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        #[cfg(not(windows))]
        let options = options.unix_permissions(UNIX_DIRECTORY_PERMISSIONS);
        options
    }
}

impl Packager for ZipPackager {
    fn name(&self) -> &str {
        "zip"
    }

    fn file_extension(&self) -> &str {
        ".zip"
    }

    fn mime_type(&self) -> &str {
        "application/zip"
    }

    fn pack(&self, root: &Path) -> Result<Vec<u8>, PackageError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = 0usize;

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|source| PackageError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            let relative = match entry.path().strip_prefix(root) {
                Ok(relative) => archive_path(relative),
                Err(_) => continue,
            };
            let file_type = entry.file_type();

            if file_type.is_dir() {
                zip.add_directory(format!("{}/", relative), self.directory_options())?;
            } else if file_type.is_file() || points_to_file(entry.path()) {
                self.add_file(&mut zip, relative, entry.path())?;
            } else {
                // Directory links could loop or leave the root.
                warn!(path = %entry.path().display(), "skipping entry that is not a file or directory");
                continue;
            }
            entries += 1;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(
            root = %root.display(),
            entries,
            bytes = bytes.len(),
            "packaged directory as zip"
        );
        Ok(bytes)
    }
}

/// A symbolic link whose target is a regular file
fn points_to_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file())
}

/// Slash-separated archive path for a path relative to the packed root
fn archive_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::zip::ZipArchive;
    use std::fs;
    use std::io::Read;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_empty_directory_gives_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = ZipPackager::default().pack(dir.path()).unwrap();

        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_archives_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("d1")).unwrap();
        fs::write(dir.path().join("d1").join("f1"), "f1 stuff").unwrap();

        let bytes = ZipPackager::default().pack(dir.path()).unwrap();
        assert_eq!(entry_names(&bytes), ["d1/", "d1/f1"]);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        archive
            .by_name("d1/f1")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "f1 stuff");
        assert!(archive.by_index(0).unwrap().is_dir());
    }

    #[test]
    fn test_archives_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("d1").join("d2")).unwrap();

        let bytes = ZipPackager::default().pack(dir.path()).unwrap();
        assert_eq!(entry_names(&bytes), ["d1/", "d1/d2/"]);
    }

    #[test]
    fn test_paths_are_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Joe");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("Joe.csproj"), "<Project />").unwrap();
        fs::write(root.join("src").join("Program.cs"), "// main").unwrap();

        let bytes = ZipPackager::default().pack(&root).unwrap();
        let names = entry_names(&bytes);

        assert_eq!(names, ["Joe.csproj", "src/", "src/Program.cs"]);
        assert!(names.iter().all(|n| !n.starts_with('/') && !n.contains("Joe/")));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("bin");
        fs::create_dir(&sub).unwrap();
        let script = sub.join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o777)).unwrap();

        let bytes = ZipPackager::default().pack(dir.path()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let dir_mode = archive.by_name("bin/").unwrap().unix_mode().unwrap();
        assert_eq!(dir_mode & 0o7777, 0o755);
        let file_mode = archive.by_name("bin/run.sh").unwrap().unix_mode().unwrap();
        assert_eq!(file_mode & 0o7777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_links_are_archived_with_target_contents() {
        use std::os::unix::fs::symlink;

        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("shared.props"), "<Project />").unwrap();
        fs::create_dir(outside.path().join("shared")).unwrap();

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        symlink(outside.path().join("shared.props"), dir.path().join("b.props")).unwrap();
        symlink(dir.path().join("a.txt"), dir.path().join("c.txt")).unwrap();
        symlink(outside.path().join("shared"), dir.path().join("linked-dir")).unwrap();
        symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();

        let bytes = ZipPackager::default().pack(dir.path()).unwrap();
        assert_eq!(entry_names(&bytes), ["a.txt", "b.props", "c.txt"]);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        archive
            .by_name("b.props")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "<Project />");
    }

    #[test]
    fn test_compression_levels_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "all work and no play\n".repeat(2000);
        fs::write(dir.path().join("big.txt"), &contents).unwrap();

        let stored = ZipPackager::new(CompressionLevel::Stored).pack(dir.path()).unwrap();
        let smallest = ZipPackager::new(CompressionLevel::Smallest).pack(dir.path()).unwrap();
        assert!(smallest.len() < stored.len());

        let mut archive = ZipArchive::new(Cursor::new(smallest)).unwrap();
        let mut read_back = String::new();
        archive
            .by_name("big.txt")
            .unwrap()
            .read_to_string(&mut read_back)
            .unwrap();
        assert_eq!(read_back, contents);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZipPackager::default()
            .pack(&dir.path().join("missing"))
            .unwrap_err();

        assert!(matches!(err, PackageError::Walk { .. }));
    }
}
