pub mod summary_client;
pub mod trivia_client;

pub use summary_client::{SummaryProvider, WikipediaClient};
pub use trivia_client::{BatchRequest, OpenTdbClient, QuestionProvider};
