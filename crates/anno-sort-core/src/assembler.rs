//! Output assembly
//!
//! Concatenates the group partitions into the final CSV: UTF-8 BOM, header
//! once, then every group's rows in resolved order, `\n` line endings.

use std::io::Write;

use csv::{ByteRecord, Terminator, WriterBuilder};

use crate::error::{AnnoSortError, Result};
use crate::grouper::{Group, GroupedRows};

/// Byte-order mark written at the start of every output file
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write the assembled CSV to `out`, returning the number of data rows.
pub fn assemble<W: Write>(mut out: W, grouped: &GroupedRows, order: &[&Group]) -> Result<usize> {
    out.write_all(UTF8_BOM)?;

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);
    writer
        .write_record(&grouped.header)
        .map_err(AnnoSortError::Output)?;

    let mut written = 0;
    let mut record = ByteRecord::new();
    for group in order {
        let partition_err = |source| AnnoSortError::Partition {
            label: group.label.clone(),
            source,
        };
        let mut reader = grouped
            .partitions
            .reader(group.partition)
            .map_err(partition_err)?;
        while reader.read_byte_record(&mut record).map_err(partition_err)? {
            writer
                .write_byte_record(&record)
                .map_err(AnnoSortError::Output)?;
            written += 1;
        }
        log::debug!(
            "emitted group '{}' ({}), {} rows so far",
            group.label,
            group.category,
            written
        );
    }

    writer.flush()?;
    Ok(written)
}
