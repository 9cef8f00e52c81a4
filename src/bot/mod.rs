//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `command_handler`: Handles recognised slash commands
//! - `message_handler`: Handles incoming text and audio messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Stores dialogue states and runs their effects

pub mod callback_handler;
pub mod command_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use command_handler::command_handler;
pub use message_handler::message_handler;

// Re-export utility functions that might be used elsewhere
pub use dialogue_manager::{failure_message, run_transition};
pub use message_handler::download_file;
pub use ui_builder::{create_songs_keyboard, format_song_details, CallbackData};
