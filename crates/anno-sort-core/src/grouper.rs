//! Streaming grouper
//!
//! Routes each row to the partition of its label as rows arrive. Nothing but
//! the header and per-group metadata is held in memory.

use std::collections::HashMap;

use csv::StringRecord;

use crate::category::{category_of, Category};
use crate::column::LabelColumn;
use crate::error::{AnnoSortError, Result};
use crate::partition::{PartitionId, PartitionSet};

/// Rows sharing one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub label: String,
    pub category: Category,
    /// Order in which the label was first seen, starting at 0
    pub first_seen: usize,
    pub partition: PartitionId,
}

/// Result of one grouping pass
pub struct GroupedRows {
    pub header: StringRecord,
    pub label_column: LabelColumn,
    /// Groups in first-seen order
    pub groups: Vec<Group>,
    pub partitions: PartitionSet,
    pub rows_read: usize,
}

impl GroupedRows {
    pub fn rows_in(&self, group: &Group) -> usize {
        self.partitions.rows(group.partition)
    }
}

pub struct Grouper {
    header: StringRecord,
    label_column: LabelColumn,
    index: HashMap<String, usize>,
    groups: Vec<Group>,
    partitions: PartitionSet,
    rows_read: usize,
}

/// Label of a row: the trimmed label field, or `""` if the row is short.
pub fn row_label<'r>(row: &'r StringRecord, column: &LabelColumn) -> &'r str {
    row.get(column.index).unwrap_or("").trim()
}

impl Grouper {
    pub fn new(header: StringRecord, label_column: LabelColumn, partitions: PartitionSet) -> Self {
        Self {
            header,
            label_column,
            index: HashMap::new(),
            groups: Vec::new(),
            partitions,
            rows_read: 0,
        }
    }

    /// Route one row to its group, creating the group on first sight.
    pub fn push(&mut self, row: &StringRecord) -> Result<()> {
        let label = row_label(row, &self.label_column);
        self.rows_read += 1;

        if let Some(&i) = self.index.get(label) {
            let group = &self.groups[i];
            return self
                .partitions
                .append(group.partition, row)
                .map_err(|source| AnnoSortError::Partition {
                    label: group.label.clone(),
                    source,
                });
        }

        let partition = self
            .partitions
            .create(&self.header, row)
            .map_err(|source| AnnoSortError::Partition {
                label: label.to_string(),
                source,
            })?;
        let first_seen = self.groups.len();
        let category = category_of(label);
        log::debug!("new group '{label}' ({category}) at index {first_seen}");

        self.index.insert(label.to_string(), first_seen);
        self.groups.push(Group {
            label: label.to_string(),
            category,
            first_seen,
            partition,
        });
        Ok(())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Close all partition writers and hand the groups over.
    pub fn finish(mut self) -> Result<GroupedRows> {
        self.partitions.finish()?;
        Ok(GroupedRows {
            header: self.header,
            label_column: self.label_column,
            groups: self.groups,
            partitions: self.partitions,
            rows_read: self.rows_read,
        })
    }
}
