pub mod classifier;
pub mod dispatcher;
pub mod endpoint_resolver;
pub mod extractor;
pub mod file_solver;
pub mod math_solver;
pub mod text_solver;

pub use classifier::classify;
pub use dispatcher::AnswerDispatcher;
pub use endpoint_resolver::resolve_submit_url;
pub use extractor::ContentExtractor;
pub use file_solver::FileSolver;
