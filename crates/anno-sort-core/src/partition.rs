//! On-disk spill partitions
//!
//! One CSV partition file per group, kept in a private temporary directory.
//! The directory and everything in it is removed when the [`PartitionSet`]
//! is dropped, on success and error paths alike.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use csv::{StringRecord, Terminator, WriterBuilder};
use tempfile::TempDir;

const SPILL_DIR_PREFIX: &str = "grp_ann_";
const PARTITION_EXT: &str = "csvpart";

/// Default cap on simultaneously open partition writers
pub const DEFAULT_MAX_OPEN_PARTITIONS: usize = 256;

/// Handle to one partition inside a [`PartitionSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionId(usize);

struct Partition {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    last_used: u64,
    rows: usize,
}

/// Spill files for one input file's groups
pub struct PartitionSet {
    // Declared before `dir` so writers are closed before the directory goes.
    partitions: Vec<Partition>,
    open: usize,
    max_open: usize,
    tick: u64,
    dir: TempDir,
}

fn partition_writer(file: File) -> csv::Writer<File> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file)
}

impl PartitionSet {
    /// Create an empty set backed by a fresh temporary directory, under
    /// `spill_dir` if given, otherwise under the system temp directory.
    pub fn new(spill_dir: Option<&Path>, max_open: usize) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SPILL_DIR_PREFIX);
        let dir = match spill_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        log::debug!("created spill directory {}", dir.path().display());

        Ok(Self {
            partitions: Vec::new(),
            open: 0,
            max_open: max_open.max(1),
            tick: 0,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Number of partitions currently holding an open writer
    pub fn open_count(&self) -> usize {
        self.open
    }

    /// Data rows written to a partition (header excluded)
    pub fn rows(&self, id: PartitionId) -> usize {
        self.partitions[id.0].rows
    }

    /// Start a new partition seeded with `header` and its first data row.
    pub fn create(
        &mut self,
        header: &StringRecord,
        first: &StringRecord,
    ) -> csv::Result<PartitionId> {
        self.make_room()?;

        let index = self.partitions.len();
        let path = self
            .dir
            .path()
            .join(format!("group_{:06}.{}", index, PARTITION_EXT));
        let mut writer = partition_writer(File::create(&path)?);
        writer.write_record(header)?;
        writer.write_record(first)?;

        self.tick += 1;
        self.open += 1;
        self.partitions.push(Partition {
            path,
            writer: Some(writer),
            last_used: self.tick,
            rows: 1,
        });
        Ok(PartitionId(index))
    }

    /// Append one data row, reopening the partition if it was evicted.
    pub fn append(&mut self, id: PartitionId, row: &StringRecord) -> csv::Result<()> {
        if self.partitions[id.0].writer.is_none() {
            self.make_room()?;
            let file = OpenOptions::new()
                .append(true)
                .open(&self.partitions[id.0].path)?;
            self.partitions[id.0].writer = Some(partition_writer(file));
            self.open += 1;
        }

        self.tick += 1;
        let partition = &mut self.partitions[id.0];
        partition.last_used = self.tick;
        partition.rows += 1;
        if let Some(writer) = partition.writer.as_mut() {
            writer.write_record(row)?;
        }
        Ok(())
    }

    /// Flush and close every open writer. Must be called before reading.
    pub fn finish(&mut self) -> io::Result<()> {
        for partition in &mut self.partitions {
            if let Some(mut writer) = partition.writer.take() {
                writer.flush()?;
            }
        }
        self.open = 0;
        Ok(())
    }

    /// Open a partition for reading; the seeded header is consumed as the
    /// reader's header row.
    pub fn reader(&self, id: PartitionId) -> csv::Result<csv::Reader<File>> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&self.partitions[id.0].path)
    }

    /// Remove the spill directory, reporting any failure.
    pub fn close(mut self) -> io::Result<()> {
        self.partitions.clear();
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        log::debug!("removed spill directory {}", path.display());
        Ok(())
    }

    /// Close the least recently written partition if the cap is reached.
    fn make_room(&mut self) -> io::Result<()> {
        if self.open < self.max_open {
            return Ok(());
        }
        let victim = self
            .partitions
            .iter_mut()
            .filter(|p| p.writer.is_some())
            .min_by_key(|p| p.last_used);
        if let Some(partition) = victim {
            if let Some(mut writer) = partition.writer.take() {
                writer.flush()?;
            }
            self.open -= 1;
            log::debug!("evicted partition {}", partition.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn read_rows(set: &PartitionSet, id: PartitionId) -> Vec<Vec<String>> {
        set.reader(id)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_create_append_read() {
        let header = record(&["id", "AnnotationName"]);
        let mut set = PartitionSet::new(None, 8).unwrap();

        let a = set.create(&header, &record(&["1", "VIS"])).unwrap();
        let b = set.create(&header, &record(&["2", "CA1"])).unwrap();
        set.append(a, &record(&["3", "VIS"])).unwrap();
        set.finish().unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.rows(a), 2);
        assert_eq!(set.rows(b), 1);
        assert_eq!(read_rows(&set, a), vec![vec!["1", "VIS"], vec!["3", "VIS"]]);
        assert_eq!(set.reader(b).unwrap().headers().unwrap(), &header);
    }

    #[test]
    fn test_eviction_keeps_rows_in_order() {
        let header = record(&["n", "label"]);
        let mut set = PartitionSet::new(None, 1).unwrap();

        let a = set.create(&header, &record(&["1", "a"])).unwrap();
        let b = set.create(&header, &record(&["2", "b"])).unwrap();
        assert_eq!(set.open_count(), 1);
        set.append(a, &record(&["3", "a"])).unwrap();
        set.append(b, &record(&["4", "b"])).unwrap();
        set.append(a, &record(&["5", "a"])).unwrap();
        assert_eq!(set.open_count(), 1);
        set.finish().unwrap();

        let a_rows: Vec<String> = read_rows(&set, a).into_iter().map(|r| r[0].clone()).collect();
        assert_eq!(a_rows, vec!["1", "3", "5"]);
        let b_rows: Vec<String> = read_rows(&set, b).into_iter().map(|r| r[0].clone()).collect();
        assert_eq!(b_rows, vec!["2", "4"]);
    }

    #[test]
    fn test_spill_dir_removed_on_drop_and_close() {
        let parent = TempDir::new().unwrap();
        let header = record(&["label"]);

        let mut set = PartitionSet::new(Some(parent.path()), 4).unwrap();
        set.create(&header, &record(&["x"])).unwrap();
        let dir = set.dir().to_path_buf();
        assert!(dir.exists());
        drop(set);
        assert!(!dir.exists());

        let set = PartitionSet::new(Some(parent.path()), 4).unwrap();
        let dir = set.dir().to_path_buf();
        set.close().unwrap();
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let header = record(&["label"]);
        let mut set = PartitionSet::new(None, 0).unwrap();
        let a = set.create(&header, &record(&["x"])).unwrap();
        set.append(a, &record(&["x"])).unwrap();
        assert_eq!(set.rows(a), 2);
    }
}
