//! Category Classifier
//!
//! Maps an annotation label onto its [`Category`] using the builtin rules.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::builtin::{BuiltinRule, Category, BUILTIN_RULES};

/// Builtin rules with the exact-name lists turned into sets
#[derive(Debug)]
pub struct CategoryRule {
    pub category: Category,
    exact: HashSet<&'static str>,
    prefixes: &'static [&'static str],
}

impl CategoryRule {
    fn from_builtin(builtin: &BuiltinRule) -> Self {
        Self {
            category: builtin.category,
            exact: builtin.exact.iter().copied().collect(),
            prefixes: builtin.prefixes,
        }
    }

    /// Exact names, sorted for display
    pub fn exact_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.exact.iter().copied().collect();
        names.sort_unstable();
        names
    }

    /// Prefixes in table order
    pub fn prefixes(&self) -> &'static [&'static str] {
        self.prefixes
    }

    /// Return how `label` matches this rule, if it does. `label` must
    /// already be trimmed.
    fn match_trimmed(&self, label: &str) -> Option<RuleMatch> {
        if self.exact.contains(label) {
            return Some(RuleMatch::Exact);
        }
        self.prefixes
            .iter()
            .copied()
            .find(|p| label.starts_with(*p))
            .map(RuleMatch::Prefix)
    }

    pub fn matches(&self, label: &str) -> bool {
        self.match_trimmed(label.trim()).is_some()
    }
}

static RULES: Lazy<Vec<CategoryRule>> =
    Lazy::new(|| BUILTIN_RULES.iter().map(CategoryRule::from_builtin).collect());

/// Which part of a rule table matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    Exact,
    Prefix(&'static str),
}

/// Classification result with the reason, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// `None` when the label fell through to `Category::Other`
    pub matched: Option<RuleMatch>,
}

/// Rule tables in check order
pub fn rules() -> &'static [CategoryRule] {
    &RULES
}

/// Rule table for one category (`None` for `Category::Other`)
pub fn rules_for(category: Category) -> Option<&'static CategoryRule> {
    RULES.iter().find(|r| r.category == category)
}

/// Classify a label, reporting which rule decided it.
pub fn classify(label: &str) -> Classification {
    let trimmed = label.trim();
    for rule in RULES.iter() {
        if let Some(matched) = rule.match_trimmed(trimmed) {
            return Classification {
                category: rule.category,
                matched: Some(matched),
            };
        }
    }
    Classification {
        category: Category::Other,
        matched: None,
    }
}

/// Category of a label. Case-sensitive; only surrounding whitespace is
/// ignored.
pub fn category_of(label: &str) -> Category {
    classify(label).category
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix_matches() {
        assert_eq!(category_of("VIS"), Category::Isocortex);
        assert_eq!(category_of("VISp5"), Category::Isocortex);
        assert_eq!(category_of("OLF"), Category::Isocortex);
        assert_eq!(category_of("SSp-bfd"), Category::Isocortex);
        assert_eq!(category_of("MOp"), Category::Isocortex);
        assert_eq!(category_of("CA1"), Category::Hippocampus);
        assert_eq!(category_of("BLAa"), Category::Amygdala);
        assert_eq!(category_of("CPu"), Category::Striatum);
        assert_eq!(category_of("LGd-sh"), Category::Thalamus);
        assert_eq!(category_of("PVH"), Category::Hypothalamus);
    }

    #[test]
    fn test_dg_prefix_is_hippocampus() {
        let c = classify("DG-sg");
        assert_eq!(c.category, Category::Hippocampus);
        assert_eq!(c.category.index(), 1);

        let c = classify("DG-xyz");
        assert_eq!(c.matched, Some(RuleMatch::Prefix("DG-")));
    }

    #[test]
    fn test_rt_is_thalamus_by_exact_name() {
        let c = classify("RT");
        assert_eq!(c.category, Category::Thalamus);
        assert_eq!(c.matched, Some(RuleMatch::Exact));
    }

    #[test]
    fn test_empty_and_unknown_are_other() {
        assert_eq!(category_of(""), Category::Other);
        assert_eq!(category_of("   "), Category::Other);
        assert_eq!(category_of("Other1"), Category::Other);
        assert_eq!(classify("").matched, None);
    }

    #[test]
    fn test_trim_but_no_case_folding() {
        assert_eq!(category_of("  CA1\t"), Category::Hippocampus);
        assert_eq!(category_of("ca1"), Category::Other);
        assert_eq!(category_of("vis"), Category::Other);
    }

    #[test]
    fn test_earliest_category_wins() {
        // amygdala exact name, caught first by the isocortex prefix "PL"
        assert_eq!(category_of("PLCO"), Category::Isocortex);
        // hypothalamus exact name, caught first by the thalamus prefix "VM"
        assert_eq!(category_of("VMH"), Category::Thalamus);
        // amygdala prefix "AMY" beats the later thalamus prefix "AM"
        assert_eq!(category_of("AMY"), Category::Amygdala);
        // thalamus prefix "LHb" beats the later hypothalamus prefix "LH"
        assert_eq!(category_of("LHb"), Category::Thalamus);
    }

    #[test]
    fn test_category_is_deterministic() {
        for label in ["VIS", "CA3", "x", "", "DMH", "ACB"] {
            let first = category_of(label);
            for _ in 0..3 {
                assert_eq!(category_of(label), first);
            }
            assert!(first.index() <= 6);
        }
    }

    #[test]
    fn test_rules_for() {
        assert!(rules_for(Category::Other).is_none());
        let tha = rules_for(Category::Thalamus).unwrap();
        assert_eq!(tha.exact_names(), vec!["RT"]);
        assert!(tha.matches(" POm "));
        assert_eq!(rules().len(), 6);
    }
}
