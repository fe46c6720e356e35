use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use tempfile::NamedTempFile;
use log::debug;
use crate::errors::AppError;

// @module: File and directory utilities

// @const: Accepted input containers
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v"];

/// Suffix appended to the input stem for the captioned video
pub const CAPTIONED_SUFFIX: &str = "_with_captions";

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Video container we accept
    Video,
    /// Anything else
    Unknown,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Classify a path by its extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        match ext.as_deref() {
            Some("srt") => FileType::Subtitle,
            Some(e) if VIDEO_EXTENSIONS.contains(&e) => FileType::Video,
            _ => FileType::Unknown,
        }
    }

    /// Check an input video before any external tool sees it.
    ///
    /// Returns the file size in bytes.
    pub fn validate_input<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<u64, AppError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(AppError::InvalidInput(format!("Input file does not exist: {:?}", path)));
        }

        if Self::detect_file_type(path) != FileType::Video {
            return Err(AppError::InvalidInput(format!(
                "Unsupported file type {:?}; expected one of: {}",
                path,
                VIDEO_EXTENSIONS.join(", ")
            )));
        }

        let size = fs::metadata(path)?.len();
        if size == 0 {
            return Err(AppError::InvalidInput(format!("Input file is empty: {:?}", path)));
        }
        if size > max_bytes {
            return Err(AppError::InvalidInput(format!(
                "Input file is {} bytes, above the {} byte limit: {:?}",
                size, max_bytes, path
            )));
        }

        Ok(size)
    }

    // @generates: Default output path for a captioned video
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        output_dir.as_ref().join(format!("{}{}.mp4", stem, CAPTIONED_SUFFIX))
    }

    // @generates: Path of the SRT file kept next to an output
    pub fn sidecar_srt_path<P: AsRef<Path>>(output: P) -> PathBuf {
        output.as_ref().with_extension("srt")
    }

    /// Find accepted video files under a directory, sorted by path.
    ///
    /// Previous outputs (`*_with_captions.mp4`) are left out.
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() || Self::detect_file_type(path) != FileType::Video {
                continue;
            }
            let is_output = path
                .file_stem()
                .is_some_and(|s| s.to_string_lossy().ends_with(CAPTIONED_SUFFIX));
            if !is_output {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Whether two paths name the same file once `.`, `..` and symlinks
    /// are resolved.
    ///
    /// `candidate` may not exist yet; its parent is resolved instead.
    pub fn same_path<P1: AsRef<Path>, P2: AsRef<Path>>(existing: P1, candidate: P2) -> bool {
        let (existing, candidate) = (existing.as_ref(), candidate.as_ref());
        match (fs::canonicalize(existing), Self::resolve_target(candidate)) {
            (Ok(a), Some(b)) => a == b,
            _ => existing == candidate,
        }
    }

    fn resolve_target(path: &Path) -> Option<PathBuf> {
        if let Ok(resolved) = fs::canonicalize(path) {
            return Some(resolved);
        }
        let name = path.file_name()?;
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::canonicalize(parent).ok().map(|p| p.join(name))
    }

    /// Move a finished artifact to its destination.
    ///
    /// Falls back to a copy when the two paths are on different
    /// filesystems. The copy lands in a temporary sibling of `to` and is
    /// renamed into place, so a failed copy leaves any existing file at
    /// `to` untouched.
    pub fn deliver<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<PathBuf> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {:?}", from));
        }
        let parent = to.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        Self::ensure_dir(parent)?;

        if fs::rename(from, to).is_err() {
            debug!("Rename failed, copying {:?} to {:?}", from, to);
            let staged = NamedTempFile::new_in(parent)
                .with_context(|| format!("Failed to create a temporary file in {:?}", parent))?;
            fs::copy(from, staged.path())
                .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
            staged
                .persist(to)
                .map_err(|e| anyhow::anyhow!("Failed to move copy into {:?}: {}", to, e.error))?;
            fs::remove_file(from).with_context(|| format!("Failed to remove {:?}", from))?;
        }

        Ok(to.to_path_buf())
    }
}
