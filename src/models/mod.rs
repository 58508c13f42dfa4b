pub mod category;
pub mod question;
pub mod session;

pub use category::Category;
pub use question::{PlacedQuestion, Question, RawQuestion, ALTERNATIVE_COUNT, INCORRECT_ANSWER_COUNT};
pub use session::{Generation, QuizSession, SessionStatus};
