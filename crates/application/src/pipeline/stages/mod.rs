pub mod answer_filter;
pub mod blocking;
pub mod client_info;
pub mod question_filter;
pub mod upstream;

pub use answer_filter::AnswerFilterStage;
pub use blocking::{blocked_response, BLOCKED_TTL};
pub use client_info::ClientInfoStage;
pub use question_filter::QuestionFilterStage;
pub use upstream::UpstreamStage;
