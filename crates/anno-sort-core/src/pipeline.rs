//! Per-file pipeline: detect column, group, order, assemble.

use std::fmt;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::assembler::assemble;
use crate::category::Category;
use crate::column::{detect_label_column, LABEL_COLUMN_NAMES};
use crate::encoding::InputEncoding;
use crate::error::{AnnoSortError, Result};
use crate::grouper::{GroupedRows, Grouper};
use crate::order::{resolve_order, SecondaryOrder};
use crate::partition::{PartitionSet, DEFAULT_MAX_OPEN_PARTITIONS};

const OUTPUT_TEMP_PREFIX: &str = ".anno-sort-";

/// Options for sorting one file
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub secondary: SecondaryOrder,
    pub encoding: InputEncoding,
    /// Parent for the spill directory (system temp dir if `None`)
    pub spill_dir: Option<PathBuf>,
    pub max_open_partitions: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            secondary: SecondaryOrder::FirstSeen,
            encoding: InputEncoding::default(),
            spill_dir: None,
            max_open_partitions: DEFAULT_MAX_OPEN_PARTITIONS,
        }
    }
}

/// Why a file was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingLabelColumn { headers: Vec<String> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLabelColumn { .. } => {
                write!(f, "no AnnotationName/Annotation column")
            }
        }
    }
}

/// One group as emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub label: String,
    pub category: Category,
    pub first_seen: usize,
    pub rows: usize,
}

/// Result of a completed file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Label column as spelled in the input header
    pub label_column: String,
    pub rows: usize,
    /// Groups in output order
    pub groups: Vec<GroupSummary>,
}

impl FileReport {
    /// Row counts per category, indexed by `Category::index()`
    pub fn category_counts(&self) -> [usize; 7] {
        let mut counts = [0; 7];
        for group in &self.groups {
            counts[usize::from(group.category.index())] += group.rows;
        }
        counts
    }
}

#[derive(Debug, Clone)]
pub enum FileOutcome {
    Completed(FileReport),
    Skipped { input: PathBuf, reason: SkipReason },
}

impl FileOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Sort `input` into `output`.
///
/// Files without a label column are skipped and nothing is written. The
/// output only appears once it has been fully written; spill files are
/// removed on every path.
pub fn process_file(input: &Path, output: &Path, options: &SortOptions) -> Result<FileOutcome> {
    if !input.is_file() {
        return Err(AnnoSortError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    let csv_err = |source| AnnoSortError::Csv {
        path: input.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(options.encoding.open(input)?);
    let header = reader.headers().map_err(csv_err)?.clone();

    let Some(label_column) = detect_label_column(header.iter()) else {
        log::warn!(
            "skipping {}: none of {:?} in header",
            input.display(),
            LABEL_COLUMN_NAMES
        );
        return Ok(FileOutcome::Skipped {
            input: input.to_path_buf(),
            reason: SkipReason::MissingLabelColumn {
                headers: header.iter().map(String::from).collect(),
            },
        });
    };
    log::debug!(
        "{}: label column '{}' at index {}",
        input.display(),
        label_column.name,
        label_column.index
    );

    let partitions =
        PartitionSet::new(options.spill_dir.as_deref(), options.max_open_partitions)?;
    let mut grouper = Grouper::new(header, label_column, partitions);
    let mut row = StringRecord::new();
    while reader.read_record(&mut row).map_err(csv_err)? {
        grouper.push(&row)?;
    }
    let grouped = grouper.finish()?;

    let report = write_output(input, output, &grouped, options.secondary)?;
    grouped.partitions.close()?;

    log::info!(
        "sorted {} ({} rows, {} groups) -> {}",
        input.display(),
        report.rows,
        report.groups.len(),
        output.display()
    );
    Ok(FileOutcome::Completed(report))
}

fn write_output(
    input: &Path,
    output: &Path,
    grouped: &GroupedRows,
    secondary: SecondaryOrder,
) -> Result<FileReport> {
    let order = resolve_order(&grouped.groups, secondary);

    let out_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(OUTPUT_TEMP_PREFIX)
        .tempfile_in(out_dir)?;
    let written = assemble(temp.as_file_mut(), grouped, &order)?;

    if written != grouped.rows_read {
        return Err(AnnoSortError::RowCountMismatch {
            path: input.to_path_buf(),
            read: grouped.rows_read,
            written,
        });
    }
    temp.persist(output).map_err(|e| e.error)?;

    Ok(FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        label_column: grouped.label_column.name.clone(),
        rows: written,
        groups: order
            .iter()
            .map(|g| GroupSummary {
                label: g.label.clone(),
                category: g.category,
                first_seen: g.first_seen,
                rows: grouped.rows_in(g),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::UTF8_BOM;
    use std::fs;
    use tempfile::TempDir;

    fn run(dir: &TempDir, input: &[u8], options: &SortOptions) -> Result<(FileOutcome, PathBuf)> {
        let in_path = dir.path().join("in.csv");
        let out_path = dir.path().join("in_sorted.csv");
        fs::write(&in_path, input)?;
        let outcome = process_file(&in_path, &out_path, options)?;
        Ok((outcome, out_path))
    }

    fn output_text(path: &Path) -> String {
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap()
    }

    #[test]
    fn test_example_scenario() -> Result<()> {
        let dir = TempDir::new()?;
        let input = b"ID,AnnotationName,Value\r\n1,VIS,a\r\n2,CA1,b\r\n3,VIS,c\r\n4,Other1,d\r\n5,CA1,e\r\n";
        let (outcome, out) = run(&dir, input, &SortOptions::default())?;

        let FileOutcome::Completed(report) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(report.rows, 5);
        assert_eq!(report.label_column, "AnnotationName");
        let labels: Vec<&str> = report.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["VIS", "CA1", "Other1"]);
        assert_eq!(report.category_counts(), [2, 2, 0, 0, 0, 0, 1]);

        assert_eq!(
            output_text(&out),
            "ID,AnnotationName,Value\n1,VIS,a\n3,VIS,c\n2,CA1,b\n5,CA1,e\n4,Other1,d\n"
        );
        Ok(())
    }

    #[test]
    fn test_missing_column_skips_without_output() -> Result<()> {
        let dir = TempDir::new()?;
        let (outcome, out) = run(&dir, b"ID,Value\n1,2\n", &SortOptions::default())?;
        match outcome {
            FileOutcome::Skipped { reason, .. } => {
                assert_eq!(
                    reason,
                    SkipReason::MissingLabelColumn {
                        headers: vec!["ID".into(), "Value".into()]
                    }
                );
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!out.exists());
        Ok(())
    }

    #[test]
    fn test_header_only_input() -> Result<()> {
        let dir = TempDir::new()?;
        let (outcome, out) = run(&dir, b"\xEF\xBB\xBFannotation,x\n", &SortOptions::default())?;
        assert!(!outcome.is_skipped());
        assert_eq!(output_text(&out), "annotation,x\n");
        Ok(())
    }

    #[test]
    fn test_rerun_is_byte_identical() -> Result<()> {
        let dir = TempDir::new()?;
        let input = b"Annotation,n\nRT,1\n,2\nDG-sg,3\nzz,4\nRT,5\n,6\nACB,7\n";
        let options = SortOptions {
            secondary: SecondaryOrder::Alphabetical,
            ..SortOptions::default()
        };
        let (_, out) = run(&dir, input, &options)?;
        let first = fs::read(&out)?;
        let (_, out) = run(&dir, input, &options)?;
        assert_eq!(fs::read(&out)?, first);

        assert_eq!(
            output_text(&out),
            "Annotation,n\nDG-sg,3\nACB,7\nRT,1\nRT,5\n,2\n,6\nzz,4\n"
        );
        Ok(())
    }

    #[test]
    fn test_tiny_partition_cap_gives_same_output() -> Result<()> {
        let dir = TempDir::new()?;
        let mut input = String::from("id,AnnotationName\n");
        let labels = ["VISp", "CA3", "LGd", "zz", "BLA", "PVH", "CP", "MOs"];
        for i in 0..200 {
            input.push_str(&format!("{},{}\n", i, labels[(i * 7) % labels.len()]));
        }

        let (_, out) = run(&dir, input.as_bytes(), &SortOptions::default())?;
        let wide = fs::read(&out)?;
        let narrow = SortOptions {
            max_open_partitions: 1,
            ..SortOptions::default()
        };
        let (outcome, out) = run(&dir, input.as_bytes(), &narrow)?;
        assert_eq!(fs::read(&out)?, wide);

        let FileOutcome::Completed(report) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(report.rows, 200);
        assert!(report
            .groups
            .windows(2)
            .all(|w| w[0].category <= w[1].category));
        Ok(())
    }

    #[test]
    fn test_gbk_input() -> Result<()> {
        let dir = TempDir::new()?;
        // "名称,AnnotationName\n脑,CA1\n" in GBK
        let input = b"\xC3\xFB\xB3\xC6,AnnotationName\n\xC4\xD4,CA1\n";
        let options = SortOptions {
            encoding: InputEncoding::from_label("gbk")?,
            ..SortOptions::default()
        };
        let (_, out) = run(&dir, input, &options)?;
        assert_eq!(output_text(&out), "名称,AnnotationName\n脑,CA1\n");
        Ok(())
    }

    #[test]
    fn test_decode_failure_leaves_nothing_behind() -> Result<()> {
        let dir = TempDir::new()?;
        let spill = TempDir::new()?;
        let options = SortOptions {
            spill_dir: Some(spill.path().to_path_buf()),
            ..SortOptions::default()
        };
        let input = b"AnnotationName,v\nCA1,1\nVIS,\xFF\n";
        let err = run(&dir, input, &options).unwrap_err();
        assert!(matches!(err, AnnoSortError::Csv { .. }));

        assert!(!dir.path().join("in_sorted.csv").exists());
        assert_eq!(fs::read_dir(spill.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_ragged_row_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let input = b"AnnotationName,v\nCA1,1\nVIS\n";
        let err = run(&dir, input, &SortOptions::default()).unwrap_err();
        assert!(matches!(err, AnnoSortError::Csv { .. }));
        assert_eq!(err.exit_code(), 5);
        Ok(())
    }

    #[test]
    fn test_missing_input() {
        let err = process_file(
            Path::new("/definitely/not/here.csv"),
            Path::new("/tmp/out.csv"),
            &SortOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnnoSortError::InputNotFound { .. }));
    }
}
