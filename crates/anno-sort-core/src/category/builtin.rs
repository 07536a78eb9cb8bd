//! Builtin Category Definitions
//!
//! Brain-region categories and the label rules that map onto them.
//! Tables are listed in check order; the first matching category wins.

use std::fmt;

/// Anatomical priority class of an annotation label.
///
/// The discriminant is the sort priority: lower values are emitted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    Isocortex = 0,
    Hippocampus = 1,
    Amygdala = 2,
    Striatum = 3,
    Thalamus = 4,
    Hypothalamus = 5,
    Other = 6,
}

impl Category {
    /// All categories in priority order.
    pub const ALL: [Category; 7] = [
        Category::Isocortex,
        Category::Hippocampus,
        Category::Amygdala,
        Category::Striatum,
        Category::Thalamus,
        Category::Hypothalamus,
        Category::Other,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Isocortex => "Isocortex",
            Self::Hippocampus => "Hippocampus",
            Self::Amygdala => "Amygdala",
            Self::Striatum => "Striatum",
            Self::Thalamus => "Thalamus",
            Self::Hypothalamus => "Hypothalamus",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Static rule table for one category
#[derive(Debug, Clone)]
pub struct BuiltinRule {
    /// Category assigned on match
    pub category: Category,
    /// Labels that match only when equal after trimming
    pub exact: &'static [&'static str],
    /// Labels that match when they start with any of these
    pub prefixes: &'static [&'static str],
}

/// Rule tables in check order. `Category::Other` has no entry: it is the
/// fallback when nothing here matches.
pub const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        category: Category::Isocortex,
        exact: &["VISC", "OLF"],
        prefixes: &[
            "RSP", "VIS", "SSp", "SS", "AUD", "ORB", "AI", "MO", "FR", "ACC", "PL", "ILA", "PTLp",
            "TEa", "ECT", "PERI",
        ],
    },
    BuiltinRule {
        category: Category::Hippocampus,
        exact: &["CA1", "CA2", "CA3", "DG", "DG-po", "DG-sg", "DG-mo"],
        prefixes: &["DG-"],
    },
    BuiltinRule {
        category: Category::Amygdala,
        exact: &[
            "CeA", "CEA", "LA", "BLA", "BMA", "MEA", "COA", "NLOT", "PMCO", "PLCO",
        ],
        prefixes: &[
            "AMY", "BLA", "BMA", "LA", "CeA", "CEA", "MEA", "COA", "NLOT", "PMCO", "PLCO",
        ],
    },
    BuiltinRule {
        category: Category::Striatum,
        exact: &["STR", "STRd", "STRv", "CP", "CPu", "ACB", "OT"],
        prefixes: &["STR", "CP", "ACB", "OT"],
    },
    BuiltinRule {
        category: Category::Thalamus,
        exact: &["RT"],
        prefixes: &[
            "TH", "MD", "LP", "PO", "POm", "VL", "VM", "VP", "VPL", "VPM", "LD", "LG", "LGd",
            "LGv", "MG", "AV", "AM", "AD", "RE", "CM", "PF", "RT", "Hb", "HB", "LHb", "MHb", "PVT",
            "POL",
        ],
    },
    BuiltinRule {
        category: Category::Hypothalamus,
        exact: &[
            "ARC", "ARH", "DMH", "LH", "PVN", "PVH", "VMH", "SON", "SCN", "MPO", "MPN",
        ],
        prefixes: &[
            "HY", "ARC", "ARH", "DMH", "DM", "LH", "LHA", "PVN", "PVH", "VMH", "VMN", "SON", "SO",
            "SCN", "MPO", "MPN", "PMv", "PMd", "AP",
        ],
    },
];
