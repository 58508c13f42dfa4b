pub mod placement;
pub mod scoring;
pub mod summary_enricher;

pub use placement::AlternativePlacement;
pub use scoring::{QuestionReview, ScoringEngine};
pub use summary_enricher::{SummaryEnricher, SummaryUpdate};
