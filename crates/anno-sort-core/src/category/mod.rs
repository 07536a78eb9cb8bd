//! # Category Module
//!
//! Assigns each annotation label one of seven brain-region priority classes.
//!
//! ## Check order
//!
//! 1. **Isocortex**
//! 2. **Hippocampus**
//! 3. **Amygdala**
//! 4. **Striatum**
//! 5. **Thalamus**
//! 6. **Hypothalamus**
//! 7. **Other** (fallback)
//!
//! A label matching several tables belongs to the first one in this order.
//!
//! ## Usage
//!
//! ```rust
//! use anno_sort_core::category::{category_of, Category};
//!
//! assert_eq!(category_of("DG-sg"), Category::Hippocampus);
//! assert_eq!(category_of("RT").index(), 4);
//! assert_eq!(category_of(""), Category::Other);
//! ```

mod builtin;
mod classifier;

pub use builtin::{BuiltinRule, Category, BUILTIN_RULES};
pub use classifier::{
    category_of, classify, rules, rules_for, CategoryRule, Classification, RuleMatch,
};
