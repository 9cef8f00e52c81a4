//! Message Handler module for processing incoming Telegram messages

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, error, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import configuration
use crate::config::BotConfig;

// Import dialogue types
use crate::dialogue::{advance, Input, SongDialogue};

// Import dialogue manager functions
use super::command_handler::{may_answer, refuse_input};
use super::dialogue_manager::run_transition;

/// Download a file through the Bot API file endpoint
pub async fn download_file(bot: &Bot, file_id: FileId, max_bytes: u32) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url)
        .await
        .context("Failed to request file")?
        .error_for_status()
        .context("File endpoint returned an error")?;
    let bytes = response.bytes().await.context("Failed to read file body")?;

    if bytes.len() as u64 > u64::from(max_bytes) {
        bail!("Downloaded file is {} bytes, limit is {max_bytes}", bytes.len());
    }

    Ok(bytes.to_vec())
}

/// Audio attachment of a message: audio file, voice note or audio document
fn audio_attachment(msg: &Message) -> Option<(FileId, u32)> {
    if let Some(audio) = msg.audio() {
        return Some((audio.file.id.clone(), audio.file.size));
    }
    if let Some(voice) = msg.voice() {
        return Some((voice.file.id.clone(), voice.file.size));
    }
    msg.document()
        .filter(|doc| {
            doc.mime_type
                .as_ref()
                .is_some_and(|mime| mime.to_string().starts_with("audio/"))
        })
        .map(|doc| (doc.file.id.clone(), doc.file.size))
}

fn author_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|user| user.id.0)
}

/// Language code of the message author
pub fn message_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    dialogue: SongDialogue,
    pool: Arc<PgPool>,
    config: &BotConfig,
    text: &str,
) -> Result<()> {
    let language_code = message_language(msg);
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    // Unknown commands never feed a wizard step
    if text.starts_with('/') {
        bot.send_message(msg.chat.id, t_lang("use-commands", language_code))
            .await?;
        return Ok(());
    }

    let state = dialogue.get().await?.unwrap_or_default();
    if !may_answer(&state, author_id(msg), config) {
        return refuse_input(bot, msg.chat.id, author_id(msg), &state, language_code).await;
    }

    let transition = advance(state, Input::Text(text));
    run_transition(bot, msg.chat.id, &dialogue, &pool, transition, language_code).await
}

async fn handle_audio_message(
    bot: &Bot,
    msg: &Message,
    dialogue: SongDialogue,
    pool: Arc<PgPool>,
    config: &BotConfig,
    file_id: FileId,
    size: u32,
) -> Result<()> {
    let language_code = message_language(msg);
    debug!(user_id = %msg.chat.id, size, "Received audio message from user");

    let state = dialogue.get().await?.unwrap_or_default();
    if !may_answer(&state, author_id(msg), config) {
        return refuse_input(bot, msg.chat.id, author_id(msg), &state, language_code).await;
    }

    if !state.expects_audio() {
        // Nothing to download, the dialogue answers with a hint
        let transition = advance(state, Input::Audio(Vec::new()));
        return run_transition(bot, msg.chat.id, &dialogue, &pool, transition, language_code).await;
    }

    if size > config.max_audio_bytes {
        warn!(user_id = %msg.chat.id, size, limit = config.max_audio_bytes, "Audio file rejected as too large");
        bot.send_message(
            msg.chat.id,
            t_args_lang(
                "audio-too-large",
                &[("limit", &config.max_audio_bytes.to_string())],
                language_code,
            ),
        )
        .await?;
        return Ok(());
    }

    let bytes = match download_file(bot, file_id, config.max_audio_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to download audio for user");
            bot.send_message(msg.chat.id, t_lang("audio-download-failed", language_code))
                .await?;
            return Ok(());
        }
    };

    let transition = advance(state, Input::Audio(bytes));
    run_transition(bot, msg.chat.id, &dialogue, &pool, transition, language_code).await
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");

    bot.send_message(msg.chat.id, t_lang("unsupported-message", message_language(msg)))
        .await?;
    Ok(())
}

/// Entry point for messages that are not known commands
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: Arc<PgPool>,
    config: Arc<BotConfig>,
    dialogue: SongDialogue,
) -> Result<()> {
    if let Some(text) = msg.text() {
        handle_text_message(&bot, &msg, dialogue, pool, &config, text).await?;
    } else if let Some((file_id, size)) = audio_attachment(&msg) {
        handle_audio_message(&bot, &msg, dialogue, pool, &config, file_id, size).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}
