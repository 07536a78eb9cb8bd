//! Directory batch mode
//!
//! Every `*.csv` directly inside the target directory is sorted into a
//! sibling file named `<stem><suffix>.<ext>`. Files are processed one after
//! another with no state shared between them; a failing file is recorded and
//! the batch moves on.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AnnoSortError, Result};
use crate::pipeline::{process_file, FileOutcome, SortOptions};

/// Suffix appended to the input stem to name the output
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_sorted";

/// Callback invoked after each file
pub type FileCallback<'a> = Option<&'a dyn Fn(&BatchEntry)>;

/// `data.csv` + `_sorted` -> `data_sorted.csv`
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(name)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_own_output(path: &Path, suffix: &str) -> bool {
    !suffix.is_empty()
        && path
            .file_stem()
            .and_then(OsStr::to_str)
            .is_some_and(|stem| stem.ends_with(suffix))
}

/// CSV files directly inside `dir`, sorted by file name. Files that look
/// like earlier outputs (stem ending in `suffix`) are left out.
pub fn discover_csv_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AnnoSortError::TargetNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_csv(path) {
            continue;
        }
        if is_own_output(path, suffix) {
            log::warn!(
                "skipping {}: name ends with output suffix '{}'",
                path.display(),
                suffix
            );
            continue;
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// Outcome for one file of a batch
#[derive(Debug)]
pub struct BatchEntry {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<FileOutcome>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(FileOutcome::Completed(_))))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(FileOutcome::Skipped { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_err()).count()
    }

    /// Data rows written across all completed files
    pub fn total_rows(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|e| match &e.result {
                Ok(FileOutcome::Completed(report)) => Some(report.rows),
                _ => None,
            })
            .sum()
    }
}

/// Sort every CSV in `dir`.
///
/// `suffix` must be non-empty, otherwise every output would replace its input.
pub fn run_batch(
    dir: &Path,
    suffix: &str,
    options: &SortOptions,
    on_file: FileCallback<'_>,
) -> Result<BatchReport> {
    if suffix.is_empty() {
        return Err(AnnoSortError::InvalidConfigValue {
            key: "sort.output_suffix".to_string(),
            value: String::new(),
            reason: "suffix must not be empty".to_string(),
        });
    }
    let files = discover_csv_files(dir, suffix)?;
    log::info!("found {} CSV file(s) in {}", files.len(), dir.display());

    let mut report = BatchReport::default();
    for input in files {
        let output = output_path_for(&input, suffix);
        let result = process_file(&input, &output, options);
        if let Err(e) = &result {
            log::error!("{}: {}", input.display(), e);
        }

        let entry = BatchEntry {
            input,
            output,
            result,
        };
        if let Some(f) = on_file {
            f(&entry);
        }
        report.entries.push(entry);
    }
    Ok(report)
}
