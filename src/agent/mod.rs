//! Agent module - the core autonomous agent logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt and user task
//! 2. Call the model with the tool catalog
//! 3. If the model requests function calls, execute them and feed results back
//! 4. Repeat until the model answers in plain text or the iteration budget runs out

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, TaskOutcome};
pub use prompt::build_system_prompt;
