//! Rule engine: matching, compilation, and the on-disk rule file format.

pub mod engine;
pub mod file;

pub use engine::{test_pattern, PatternError, RuleEngine, RuleSummary, DEFAULT_RULE_NAME};
pub use file::{load_rule_file, parse_rule_file, RuleFileError};
