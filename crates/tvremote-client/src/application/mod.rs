//! Application layer: the use cases a front-end calls.
//!
//! - `command_channel` – keys, text, and the installed-app list.
//! - `app_directory`   – name → launch id resolution.
//! - `launch`          – the two-phase launch orchestrator.

pub mod app_directory;
pub mod command_channel;
pub mod launch;

pub use app_directory::{AppDirectory, Resolution};
pub use command_channel::CommandChannel;
pub use launch::LaunchOrchestrator;
