//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `TaskState`: lifecycle of a single page task
//! - `PageTask`: one catalog page with its attempt counter and last error
//! - `ScrapeSession`: aggregate counts for the whole run

mod session;
mod task;
mod task_state;

// Re-export main types
pub use session::ScrapeSession;
pub use task::PageTask;
pub use task_state::TaskState;
