//! # Songbook Telegram Bot
//!
//! A Telegram bot that keeps an archive of folk songs in Postgres. Songs are
//! added through a step-by-step dialogue, found by title, text, category or
//! recording place, and edited or deleted by administrators.

pub mod bot;
pub mod commands;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod region;
