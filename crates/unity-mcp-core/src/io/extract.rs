//! Archive extraction module
//!
//! Handles the two release containers: zip (Windows) and tar.gz (everything
//! else). Entries are unpacked with their relative paths intact; the
//! platform directory embedded in published archives is not stripped.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use unity_mcp_schema::{ArchiveFormat, PlatformToken, archive_format};
use zip::ZipArchive;

/// Failures while unpacking an archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Reading the archive or writing an entry failed. Truncated or
    /// non-gzip input also surfaces here.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive structure is invalid.
    #[error("Archive error: {0}")]
    Archive(String),

    /// An entry would land outside the destination directory.
    #[error("Invalid path in archive: {}", .0.display())]
    UnsafePath(PathBuf),
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Whether the archive marked this entry executable
    pub is_executable: bool,
}

/// Extract a release archive for `token` into `dest_dir`.
///
/// The container format follows the token: zip for Windows, tar.gz for the
/// rest. A well-formed archive holding only directories yields an empty
/// list; finding the executable is the caller's job.
///
/// # Errors
///
/// Returns an [`ExtractError`] on malformed, truncated or zero-length
/// archives, entries or links escaping `dest_dir`, and filesystem failures
/// while writing.
pub fn extract(
    archive_path: &Path,
    dest_dir: &Path,
    token: &PlatformToken,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let format = archive_format(token);
    tracing::debug!(
        archive = %archive_path.display(),
        dest = %dest_dir.display(),
        %format,
        "extracting"
    );

    if fs::metadata(archive_path)?.len() == 0 {
        return Err(ExtractError::Archive(format!(
            "{} is empty",
            archive_path.display()
        )));
    }

    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
    }
}

/// Extract a tar.gz archive to a destination directory
///
/// # Errors
///
/// See [`extract`].
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, dest_dir)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<ExtractedFile>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut extracted_files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative_path = sanitize(&entry.path()?)?;
        let kind = entry.header().entry_type();

        if kind.is_symlink() || kind.is_hard_link() {
            check_link(&relative_path, &entry, kind.is_symlink())?;
        }

        // unpack_in refuses to write through links that lead outside dest_dir.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractError::UnsafePath(relative_path));
        }
        if kind.is_dir() {
            continue;
        }

        let is_executable = entry.header().mode().is_ok_and(|m| m & 0o111 != 0);

        extracted_files.push(ExtractedFile {
            absolute_path: dest_dir.join(&relative_path),
            relative_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Reject link entries whose target resolves outside the archive root.
///
/// Symlink targets are relative to the link's directory, hard link targets
/// to the archive root.
fn check_link<R: Read>(
    relative_path: &Path,
    entry: &tar::Entry<'_, R>,
    is_symlink: bool,
) -> Result<(), ExtractError> {
    let target = entry.link_name()?.ok_or_else(|| {
        ExtractError::Archive(format!("link {} has no target", relative_path.display()))
    })?;

    let base = if is_symlink {
        relative_path.parent().unwrap_or(Path::new(""))
    } else {
        Path::new("")
    };

    let mut depth: usize = 0;
    for component in base.join(&target).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath(relative_path.to_path_buf()));
            }
        }
    }
    Ok(())
}

/// Extract a zip archive
///
/// # Errors
///
/// See [`extract`].
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let relative_path = file
            .enclosed_name()
            .ok_or_else(|| ExtractError::UnsafePath(PathBuf::from(file.name())))?;

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        let is_executable = if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // Permission bits only; link entries are written as plain files.
            let mode = mode & 0o777;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            mode & 0o111 != 0
        } else {
            false
        };
        #[cfg(not(unix))]
        let is_executable = false;

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Reject absolute paths and `..` so nothing is written outside the
/// destination (Zip Slip).
fn sanitize(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath(path.to_path_buf()));
            }
        }
    }
    Ok(clean)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    /// Write a zip containing `(path, contents)` entries.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Write a tar.gz containing `(path, contents)` entries. Names ending in
    /// `/` become directory entries.
    pub(crate) fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            if name.ends_with('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
            } else {
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
            }
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    /// Write a tar.gz holding a symlink `link -> target` followed by
    /// `(path, contents)` file entries.
    pub(crate) fn write_tar_gz_with_symlink(
        path: &Path,
        link: &str,
        target: &Path,
        entries: &[(&str, &[u8])],
    ) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder.append_link(&mut header, link, target).unwrap();

        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn token(s: &str) -> PlatformToken {
        s.parse().unwrap()
    }

    #[test]
    fn test_extract_zip_keeps_platform_directory() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_zip(
            &archive,
            &[
                ("win-x64/unity-mcp-server.exe", b"MZ"),
                ("win-x64/README.txt", b"docs"),
            ],
        );

        let dest = dir.path().join("out");
        let files = extract(&archive, &dest, &token("win-x64")).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            fs::read(dest.join("win-x64/unity-mcp-server.exe")).unwrap(),
            b"MZ"
        );
        assert!(files.iter().all(|f| f.absolute_path.starts_with(&dest)));
    }

    #[test]
    fn test_extract_tar_gz_keeps_platform_directory() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        write_tar_gz(&archive, &[("linux-x64/unity-mcp-server", b"\x7fELF")]);

        let dest = dir.path().join("out");
        let files = extract(&archive, &dest, &token("linux-x64")).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].relative_path,
            PathBuf::from("linux-x64/unity-mcp-server")
        );
        assert_eq!(
            fs::read(dest.join("linux-x64/unity-mcp-server")).unwrap(),
            b"\x7fELF"
        );
    }

    #[test]
    fn test_format_follows_token_not_extension() {
        // A zip handed to a linux token is read as tar.gz and rejected.
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        write_zip(&archive, &[("linux-x64/unity-mcp-server", b"bin")]);

        let err = extract(&archive, &dir.path().join("out"), &token("linux-x64"));
        assert!(err.is_err());
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("junk");
        fs::write(&archive, b"this is definitely not an archive").unwrap();

        for t in ["win-x64", "linux-x64", "macos-arm64"] {
            let dest = dir.path().join(t);
            assert!(extract(&archive, &dest, &token(t)).is_err(), "{t}");
        }
    }

    #[test]
    fn test_truncated_zip_is_rejected() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_zip(&archive, &[("win-x64/unity-mcp-server.exe", &[1u8; 4096])]);

        let bytes = fs::read(&archive).unwrap();
        fs::write(&archive, &bytes[..bytes.len() / 2]).unwrap();

        let dest = dir.path().join("out");
        let err = extract(&archive, &dest, &token("win-x64")).unwrap_err();
        assert!(matches!(err, ExtractError::Archive(_)));
        assert!(!dest.join("win-x64/unity-mcp-server.exe").exists());
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("empty.tar.gz");
        fs::write(&archive, b"").unwrap();

        let dest = dir.path().join("out");
        assert!(matches!(
            extract(&archive, &dest, &token("linux-arm64")),
            Err(ExtractError::Archive(_))
        ));
    }

    #[test]
    fn test_directory_only_archive_extracts_nothing() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        write_tar_gz(&archive, &[("linux-x64/", b"")]);

        let dest = dir.path().join("out");
        let files = extract(&archive, &dest, &token("linux-x64")).unwrap();

        assert!(files.is_empty());
        assert!(dest.join("linux-x64").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_destination_is_rejected() {
        let dir = tempdir().unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();

        let archive = dir.path().join("a.tar.gz");
        write_tar_gz_with_symlink(
            &archive,
            "linux-x64/link",
            &outside,
            &[
                ("linux-x64/link/planted", b"owned"),
                ("linux-x64/unity-mcp-server", b"\x7fELF"),
            ],
        );

        let dest = dir.path().join("out");
        let err = extract(&archive, &dest, &token("linux-x64")).unwrap_err();

        assert!(matches!(err, ExtractError::UnsafePath(_)), "{err:?}");
        assert!(!outside.join("planted").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_symlink_escape_is_rejected() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        write_tar_gz_with_symlink(&archive, "linux-x64/up", Path::new("../../.."), &[]);

        let err = extract(&archive, &dir.path().join("out"), &token("linux-x64")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsafePath(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_destination_is_kept() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        write_tar_gz_with_symlink(
            &archive,
            "linux-x64/current",
            Path::new("unity-mcp-server"),
            &[("linux-x64/unity-mcp-server", b"\x7fELF")],
        );

        let dest = dir.path().join("out");
        let files = extract(&archive, &dest, &token("linux-x64")).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(fs::read(dest.join("linux-x64/current")).unwrap(), b"\x7fELF");
    }

    #[test]
    fn test_sanitize_rejects_escape() {
        assert!(matches!(
            sanitize(Path::new("../etc/passwd")),
            Err(ExtractError::UnsafePath(_))
        ));
        assert!(matches!(
            sanitize(Path::new("/abs/path")),
            Err(ExtractError::UnsafePath(_))
        ));
        assert_eq!(
            sanitize(Path::new("./linux-x64/bin")).unwrap(),
            PathBuf::from("linux-x64/bin")
        );
    }
}
