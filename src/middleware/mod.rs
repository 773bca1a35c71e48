mod error_handler;
mod guard;
mod submit_guard;

pub use error_handler::report_error;
pub use guard::{GuardOutcome, guard, guard_route};
pub use submit_guard::{SubmitGuard, SubmitPermit};
