pub mod assembler;
pub mod batch;
pub mod category;
pub mod column;
pub mod config;
pub mod encoding;
pub mod error;
pub mod grouper;
pub mod order;
pub mod partition;
pub mod pipeline;

pub use assembler::{assemble, UTF8_BOM};
pub use batch::{
    discover_csv_files, output_path_for, run_batch, BatchEntry, BatchReport, FileCallback,
    DEFAULT_OUTPUT_SUFFIX,
};
pub use column::{detect_label_column, LabelColumn, LABEL_COLUMN_NAMES};
pub use config::{Config, SortConfig};
pub use encoding::{DecodingReader, InputEncoding, DEFAULT_INPUT_ENCODING};
pub use error::{AnnoSortError, Result};
pub use grouper::{Group, GroupedRows, Grouper};
pub use order::{resolve_order, SecondaryOrder};
pub use partition::{PartitionId, PartitionSet, DEFAULT_MAX_OPEN_PARTITIONS};
pub use pipeline::{process_file, FileOutcome, FileReport, GroupSummary, SkipReason, SortOptions};

// Category system
pub use category::{category_of, classify, Category, Classification, RuleMatch};
