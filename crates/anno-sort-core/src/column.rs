//! Label column detection

use std::collections::HashMap;

/// Accepted label column names (lowercase), in preference order
pub const LABEL_COLUMN_NAMES: &[&str] = &["annotationname", "annotation"];

/// The detected label column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelColumn {
    /// Header spelled as found in the file
    pub name: String,
    /// Position in the header row
    pub index: usize,
}

/// Find the annotation column in a header row, ignoring case.
///
/// When two headers differ only by case the later one wins.
/// Returns `None` if no accepted name is present.
pub fn detect_label_column<'a, I>(headers: I) -> Option<LabelColumn>
where
    I: IntoIterator<Item = &'a str>,
{
    let lower: HashMap<String, (usize, &str)> = headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase(), (i, h)))
        .collect();

    LABEL_COLUMN_NAMES.iter().find_map(|key| {
        lower.get(*key).map(|(index, name)| LabelColumn {
            name: name.to_string(),
            index: *index,
        })
    })
}
