pub mod session_ctx;
pub mod step_flow;

pub use session_ctx::SessionCtx;
pub use step_flow::StepFlow;
