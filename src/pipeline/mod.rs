//! Pipeline components: planning, the worker pool, shared run context, error handling.

pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod planner;
pub mod scheduler;

pub use context::RunContext;
pub use error_handler::check_for_first_error_or_interrupt;
pub use orchestrator::{ClassRunCounts, run_classes};
pub use planner::{PropertyRule, RULES, TaskPlan, plan_tasks};
pub use scheduler::run_with_concurrency;
