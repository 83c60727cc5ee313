pub mod answer;
pub mod snapshot;
pub mod trace;

pub use answer::{ComputedAnswer, QuestionKind};
pub use snapshot::PageSnapshot;
pub use trace::{SessionState, SessionTrace, StepRecord, SubmissionResult};
