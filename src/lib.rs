//! # Sandpiper
//!
//! An AI coding agent confined to a sandboxed working directory.
//!
//! This library provides:
//! - A path sandbox that keeps every tool inside one directory tree
//! - A closed registry of filesystem and Python-execution tools
//! - A Gemini-backed conversation driver for autonomous task solving
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Send the user prompt to the model along with the tool catalog
//! 2. Execute any requested function calls inside the sandbox
//! 3. Feed results back to the model, repeat until it answers in plain text
//!
//! ## Example
//!
//! ```rust,ignore
//! use sandpiper::{agent::Agent, Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(config)?;
//! let (outcome, usage) = agent.run_task("List the files in the project").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod sandbox;
pub mod tools;

pub use config::Config;
