//! Rule list engine: compiles filter sources into one matcher and swaps it in
//! atomically on refresh.

pub mod compiler;
pub mod engine;
pub mod rule_index;
pub mod source;
pub mod suffix_trie;

pub use compiler::{parse_list_line, ParsedLine, ParsedRule, RuleKind};
pub use engine::{RuleListEngine, DEFAULT_SOURCE_TIMEOUT};
pub use rule_index::CompiledRules;
