//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, error, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import configuration
use crate::config::BotConfig;

// Import dialogue types
use crate::dialogue::{choose, Effect, SongDialogue};

// Import database functions
use crate::db::read_song;

// Import dialogue manager and UI builder functions
use super::command_handler::{may_answer, refuse_input};
use super::dialogue_manager::run_transition;
use super::ui_builder::{format_song_details, split_message, CallbackData, MAX_MESSAGE_UNITS};

/// Send the details view of a song, followed by its audio when stored
pub async fn show_song_details(
    bot: &Bot,
    chat_id: ChatId,
    pool: &PgPool,
    song_id: i64,
    language_code: Option<&str>,
) -> Result<()> {
    let song = match read_song(pool, song_id).await {
        Ok(Some(song)) => song,
        Ok(None) => {
            bot.send_message(
                chat_id,
                t_args_lang("song-not-found", &[("id", &song_id.to_string())], language_code),
            )
            .await?;
            return Ok(());
        }
        Err(e) => {
            error!(user_id = %chat_id, song_id, error = %e, "Failed to load song details");
            bot.send_message(chat_id, t_lang("error-generic", language_code))
                .await?;
            return Ok(());
        }
    };

    // Long song texts do not fit in one message
    for chunk in split_message(&format_song_details(&song, language_code), MAX_MESSAGE_UNITS) {
        bot.send_message(chat_id, chunk).await?;
    }

    if let Some(audio) = song.audio.filter(|bytes| !bytes.is_empty()) {
        let file_name = format!("song-{}.mp3", song.id);
        if let Err(e) = bot
            .send_audio(chat_id, InputFile::memory(audio.clone()).file_name(file_name.clone()))
            .title(song.title.clone())
            .await
        {
            // Voice notes and other containers are refused as audio
            warn!(user_id = %chat_id, song_id, error = %e, "Sending as audio failed, retrying as document");
            bot.send_document(chat_id, InputFile::memory(audio).file_name(file_name))
                .await?;
        }
    }

    Ok(())
}

async fn handle_callback_data(
    bot: &Bot,
    q: &CallbackQuery,
    pool: &PgPool,
    config: &BotConfig,
    dialogue: &SongDialogue,
) -> Result<()> {
    let language_code = q.from.language_code.as_deref();
    let data = q.data.as_deref().and_then(CallbackData::parse);

    let (data, msg) = match (data, &q.message) {
        (Some(data), Some(msg)) => (data, msg),
        _ => {
            debug!(user_id = %q.from.id, "Ignoring callback query without usable data");
            return Ok(());
        }
    };
    let chat_id = msg.chat().id;

    let choice = match data.choice() {
        Some(choice) => choice,
        None => {
            if let CallbackData::Song(song_id) = data {
                show_song_details(bot, chat_id, pool, song_id, language_code).await?;
            }
            return Ok(());
        }
    };

    let state = dialogue.get().await?.unwrap_or_default();
    let user_id = Some(q.from.id.0);
    if !may_answer(&state, user_id, config) {
        return refuse_input(bot, chat_id, user_id, &state, language_code).await;
    }

    let transition = choose(state, choice);
    if transition.effect != Effect::Ignore {
        // The choice is spent, drop the buttons
        if let Err(e) = bot.edit_message_reply_markup(chat_id, msg.id()).await {
            debug!(user_id = %chat_id, error = %e, "Failed to remove inline keyboard");
        }
    }

    run_transition(bot, chat_id, dialogue, pool, transition, language_code).await
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    pool: Arc<PgPool>,
    config: Arc<BotConfig>,
    dialogue: SongDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let result = handle_callback_data(&bot, &q, &pool, &config, &dialogue).await;

    // Answer the callback query to remove the loading state, even on failure
    if let Err(e) = bot.answer_callback_query(q.id).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    result
}
