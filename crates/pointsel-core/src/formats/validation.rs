use crate::error::{PointselError, Result};
use crate::formats::FormatValidation;
use std::path::{Path, PathBuf};

pub struct FormatValidator;

impl FormatValidator {
    /// Validate that a file exists and is readable
    pub fn validate_file_exists(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        if !path.exists() {
            validation.errors.push(format!("File not found: {}", path.display()));
            return validation;
        }
        if let Err(e) = std::fs::metadata(path) {
            validation.errors.push(format!("Cannot access file: {}", e));
        }

        validation
    }

    /// Validate that required component files exist for multi-file formats
    pub fn validate_component_files(
        base_path: &Path,
        required_extensions: &[&str],
        optional_extensions: &[&str],
    ) -> FormatValidation {
        let mut validation = FormatValidation::default();

        for ext in required_extensions {
            if find_component_file(base_path, ext).is_none() {
                validation.errors.push(format!(
                    "Missing required file: {}",
                    base_path.with_extension(ext).display()
                ));
            }
        }

        for ext in optional_extensions {
            if find_component_file(base_path, ext).is_none() {
                validation.warnings.push(format!(
                    "Optional file not found: {}",
                    base_path.with_extension(ext).display()
                ));
            }
        }

        validation
    }

    /// Validate file size against an upper limit in megabytes
    pub fn validate_file_size(path: &Path, max_size_mb: u64) -> FormatValidation {
        let mut validation = FormatValidation::default();

        match std::fs::metadata(path) {
            Ok(metadata) => {
                let size_mb = metadata.len() / (1024 * 1024);
                if size_mb > max_size_mb {
                    validation.errors.push(format!(
                        "File size ({} MB) exceeds maximum allowed size ({} MB)",
                        size_mb, max_size_mb
                    ));
                } else if size_mb > max_size_mb / 2 {
                    validation
                        .warnings
                        .push(format!("Large file ({} MB) may take longer to process", size_mb));
                }
            }
            Err(e) => {
                validation.errors.push(format!("Cannot read file metadata: {}", e));
            }
        }

        validation
    }

    /// Validate JSON structure by attempting to parse
    pub fn validate_json_structure(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                if let Err(e) = serde_json::from_str::<serde_json::Value>(&content) {
                    validation.errors.push(format!("Invalid JSON structure: {}", e));
                }
            }
            Err(e) => {
                validation.errors.push(format!("Cannot read file: {}", e));
            }
        }

        validation
    }

    /// Merge multiple validation results
    pub fn merge_validations(validations: Vec<FormatValidation>) -> FormatValidation {
        let mut merged = FormatValidation::default();

        for validation in validations {
            merged.errors.extend(validation.errors);
            merged.warnings.extend(validation.warnings);
        }

        merged
    }
}

/// Locate the sidecar of `base_path` with extension `ext`.
///
/// The exact name is tried first; otherwise the parent directory is scanned with
/// the base name and extension compared case-insensitively, so `DISTRICTS.SHX`
/// is found for `DISTRICTS.SHP`.
pub fn find_component_file(base_path: &Path, ext: &str) -> Option<PathBuf> {
    let exact = base_path.with_extension(ext);
    if exact.is_file() {
        return Some(exact);
    }

    let stem = base_path.file_name()?.to_str()?;
    let parent = match base_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(parent)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.eq_ignore_ascii_case(stem))
                    .unwrap_or(false)
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(ext))
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Verify that a path names an existing regular file
pub fn verify_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PointselError::FileNotFound { path: path.to_path_buf() });
    }

    if !path.is_file() {
        return Err(PointselError::InvalidPath {
            path: path.to_path_buf(),
            reason: "Path is not a file".to_string(),
        });
    }

    Ok(())
}

/// Checks run before any reader touches the file
pub fn pre_read_validation(path: &Path, max_size_mb: u64) -> Result<()> {
    verify_file_exists(path)?;

    let validation = FormatValidator::validate_file_size(path, max_size_mb);
    for warning in &validation.warnings {
        tracing::warn!("{}: {}", path.display(), warning);
    }

    if !validation.is_valid() {
        return Err(PointselError::InvalidPath {
            path: path.to_path_buf(),
            reason: validation.errors.join("; "),
        });
    }

    Ok(())
}
