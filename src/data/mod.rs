//! Static data: tag vocabulary, language policies, built-in rules, and
//! title keyword maps

pub mod policies;
pub mod rules_builtin;
pub mod tags;
pub mod title_maps;

// Re-export commonly used items
pub use policies::{LangPolicy, PolicyRegistry, SpanReuse};
pub use rules_builtin::builtin_rules;
pub use tags::{markers, TagCategory, TagVocab};
