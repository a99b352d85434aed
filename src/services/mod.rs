pub mod answer_normalizer;
pub mod deduplicator;
pub mod enricher;
pub mod prompt_builder;
pub mod text_cleaner;

pub use answer_normalizer::{normalize_answer, normalize_question};
pub use deduplicator::{deduplicate, fingerprint, DedupStats, Deduplicator, MatchRule, Verdict};
pub use enricher::ContextEnricher;
pub use text_cleaner::clean;
