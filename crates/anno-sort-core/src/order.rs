//! Group ordering

use std::cmp::Ordering;

use crate::grouper::Group;

/// Tiebreak between groups of the same category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondaryOrder {
    /// Order in which labels first appear in the input
    #[default]
    FirstSeen,
    /// Label string ascending
    Alphabetical,
}

impl SecondaryOrder {
    pub fn from_alpha_flag(alpha_sort_within_category: bool) -> Self {
        if alpha_sort_within_category {
            Self::Alphabetical
        } else {
            Self::FirstSeen
        }
    }

    pub fn is_alphabetical(self) -> bool {
        matches!(self, Self::Alphabetical)
    }

    fn compare(self, a: &Group, b: &Group) -> Ordering {
        let tiebreak = match self {
            Self::FirstSeen => a.first_seen.cmp(&b.first_seen),
            Self::Alphabetical => a.label.cmp(&b.label),
        };
        a.category.cmp(&b.category).then(tiebreak)
    }
}

/// Emission order of `groups`, by category then `secondary`.
pub fn resolve_order<'g>(groups: &'g [Group], secondary: SecondaryOrder) -> Vec<&'g Group> {
    let mut ordered: Vec<&Group> = groups.iter().collect();
    ordered.sort_by(|a, b| secondary.compare(a, b));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::category_of;
    use crate::partition::PartitionSet;
    use csv::StringRecord;

    // Real partition ids are needed to build `Group`s.
    fn groups(labels: &[&str]) -> (PartitionSet, Vec<Group>) {
        let mut set = PartitionSet::new(None, 64).unwrap();
        let header = StringRecord::from(vec!["label"]);
        let groups = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Group {
                label: label.to_string(),
                category: category_of(label),
                first_seen: i,
                partition: set
                    .create(&header, &StringRecord::from(vec![*label]))
                    .unwrap(),
            })
            .collect();
        (set, groups)
    }

    fn labels(ordered: &[&Group]) -> Vec<String> {
        ordered.iter().map(|g| g.label.clone()).collect()
    }

    #[test]
    fn test_first_seen_within_category() {
        let (_set, gs) = groups(&["VIS", "CA1", "Other1"]);
        let order = resolve_order(&gs, SecondaryOrder::FirstSeen);
        assert_eq!(labels(&order), vec!["VIS", "CA1", "Other1"]);
    }

    #[test]
    fn test_category_is_primary_key() {
        let (_set, gs) = groups(&["zzz", "PVH", "RT", "CP", "BLA", "DG", "AUDp"]);
        let order = resolve_order(&gs, SecondaryOrder::FirstSeen);
        assert_eq!(
            labels(&order),
            vec!["AUDp", "DG", "BLA", "CP", "RT", "PVH", "zzz"]
        );
    }

    #[test]
    fn test_alphabetical_within_category() {
        let (_set, gs) = groups(&["VISp", "MOs", "AUDd", "Zeta", "Alpha", ""]);

        let order = resolve_order(&gs, SecondaryOrder::FirstSeen);
        assert_eq!(labels(&order), vec!["VISp", "MOs", "AUDd", "Zeta", "Alpha", ""]);

        let order = resolve_order(&gs, SecondaryOrder::Alphabetical);
        assert_eq!(labels(&order), vec!["AUDd", "MOs", "VISp", "", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_order_is_non_decreasing_by_category() {
        let (_set, gs) = groups(&["x", "SCN", "CA2", "VISC", "x2", "ACB", "LGv", "LA"]);
        for secondary in [SecondaryOrder::FirstSeen, SecondaryOrder::Alphabetical] {
            let order = resolve_order(&gs, secondary);
            assert_eq!(order.len(), gs.len());
            assert!(order.windows(2).all(|w| w[0].category <= w[1].category));
            assert_eq!(resolve_order(&gs, secondary), order);
        }
    }

    #[test]
    fn test_flag_mapping() {
        assert_eq!(SecondaryOrder::from_alpha_flag(true), SecondaryOrder::Alphabetical);
        assert_eq!(SecondaryOrder::from_alpha_flag(false), SecondaryOrder::FirstSeen);
        assert_eq!(SecondaryOrder::default(), SecondaryOrder::FirstSeen);
    }
}
