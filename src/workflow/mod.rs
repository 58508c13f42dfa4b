pub mod quiz_controller;
pub mod summary_merge;

pub use quiz_controller::QuizController;
pub use summary_merge::SummaryMerge;
