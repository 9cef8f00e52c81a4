//! Command Handler module: entry point for recognised bot commands

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::commands::Command;
use crate::config::BotConfig;
use crate::dialogue::{begin, SongDialogue, SongDialogueState};
use crate::localization::t_lang;

use super::dialogue_manager::run_transition;
use super::message_handler::message_language;

/// Whether the user counts as an administrator
pub fn is_admin_user(user_id: Option<u64>, config: &BotConfig) -> bool {
    match user_id {
        Some(user_id) => config.is_admin(user_id),
        None => config.admin_user_ids.is_empty(),
    }
}

/// Whether the message author may run the command
pub fn is_authorized(command: &Command, user_id: Option<u64>, config: &BotConfig) -> bool {
    !command.requires_admin() || is_admin_user(user_id, config)
}

/// Whether the user may answer the step the chat is currently in.
///
/// Dialogue state is shared by everyone in a chat, so an edit or delete
/// started by an admin must not be finished by somebody else.
pub fn may_answer(state: &SongDialogueState, user_id: Option<u64>, config: &BotConfig) -> bool {
    !state.requires_admin() || is_admin_user(user_id, config)
}

/// Refuse input from a non-admin, leaving the dialogue as it is
pub async fn refuse_input(
    bot: &Bot,
    chat_id: ChatId,
    user_id: Option<u64>,
    state: &SongDialogueState,
    language_code: Option<&str>,
) -> Result<()> {
    warn!(user_id = ?user_id, chat_id = %chat_id, state = ?state, "Non-admin input to admin step refused");
    bot.send_message(chat_id, t_lang("forbidden", language_code))
        .await?;
    Ok(())
}

/// Handle a parsed command. A command always replaces the current wizard.
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    pool: Arc<PgPool>,
    config: Arc<BotConfig>,
    dialogue: SongDialogue,
) -> Result<()> {
    let language_code = message_language(&msg);
    let user_id = msg.from.as_ref().map(|user| user.id.0);
    debug!(user_id = %msg.chat.id, command = ?cmd, "Received command from user");

    if !is_authorized(&cmd, user_id, &config) {
        warn!(user_id = ?user_id, command = ?cmd, "Admin command refused");
        dialogue.exit().await?;
        bot.send_message(msg.chat.id, t_lang("forbidden", language_code))
            .await?;
        return Ok(());
    }

    run_transition(&bot, msg.chat.id, &dialogue, &pool, begin(&cmd), language_code).await
}
