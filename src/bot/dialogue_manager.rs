//! Dialogue Manager module: stores wizard states and runs their effects

use anyhow::Result;
use sqlx::postgres::PgPool;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::{on_song_loaded, Effect, SongDialogue, SongDialogueState, Transition};

// Import database functions
use crate::db::{create_song, delete_song, list_songs, read_song, search_songs, update_song, SongSummary};
use crate::errors::StoreError;

// Import UI builder functions
use super::ui_builder::{
    create_delete_confirm_keyboard, create_edit_fields_keyboard, create_songs_keyboard,
    format_results_header, RESULTS_PER_MESSAGE,
};

/// Store the next state and carry out the effect of a transition.
///
/// A `LoadSong` effect produces a follow-up transition which is applied in
/// turn. When an effect fails the dialogue is cleared and the user is told
/// why; store failures other than a missing song are logged.
pub async fn run_transition(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &SongDialogue,
    pool: &PgPool,
    transition: Transition,
    language_code: Option<&str>,
) -> Result<()> {
    let mut transition = transition;

    loop {
        store_state(dialogue, &transition.next).await?;

        match execute_effect(bot, chat_id, pool, transition.effect, language_code).await {
            Ok(Some(follow_up)) => transition = follow_up,
            Ok(None) => return Ok(()),
            Err(e) => {
                // A failed effect always ends the wizard
                dialogue.exit().await?;
                report_failure(bot, chat_id, &e, language_code).await?;
                return Ok(());
            }
        }
    }
}

async fn store_state(dialogue: &SongDialogue, next: &SongDialogueState) -> Result<()> {
    if next.is_idle() {
        dialogue.exit().await?;
    } else {
        dialogue.update(next.clone()).await?;
    }
    Ok(())
}

/// User-facing reply for a failed effect: "not found" for a missing song,
/// a generic message for everything else
pub fn failure_message(e: &anyhow::Error, language_code: Option<&str>) -> String {
    match e.downcast_ref::<StoreError>() {
        Some(StoreError::NotFound(song_id)) => {
            t_args_lang("song-not-found", &[("id", &song_id.to_string())], language_code)
        }
        _ => t_lang("error-generic", language_code),
    }
}

async fn report_failure(
    bot: &Bot,
    chat_id: ChatId,
    e: &anyhow::Error,
    language_code: Option<&str>,
) -> Result<()> {
    match e.downcast_ref::<StoreError>() {
        Some(err) if err.is_not_found() => {
            debug!(user_id = %chat_id, error = %err, "Requested song does not exist");
        }
        _ => error!(user_id = %chat_id, error = %e, "Failed to complete song operation"),
    }

    bot.send_message(chat_id, failure_message(e, language_code))
        .await?;
    Ok(())
}

/// Run one effect, returning the follow-up transition if there is one
async fn execute_effect(
    bot: &Bot,
    chat_id: ChatId,
    pool: &PgPool,
    effect: Effect,
    language_code: Option<&str>,
) -> Result<Option<Transition>> {
    match effect {
        Effect::Say(key) => {
            bot.send_message(chat_id, t_lang(key, language_code)).await?;
        }
        Effect::Abort(key) => {
            debug!(user_id = %chat_id, reason = key, "Wizard aborted on invalid input");
            bot.send_message(chat_id, t_lang(key, language_code)).await?;
        }
        Effect::SaveSong(song) => {
            let song_id = create_song(pool, &song).await?;
            info!(user_id = %chat_id, song_id, "Song added to the archive");
            bot.send_message(
                chat_id,
                t_args_lang("song-added", &[("id", &song_id.to_string())], language_code),
            )
            .await?;
        }
        Effect::Search { field, query } => {
            let songs = search_songs(pool, field, &query).await?;
            if songs.is_empty() {
                bot.send_message(
                    chat_id,
                    t_args_lang("results-none", &[("query", &query)], language_code),
                )
                .await?;
            } else {
                send_song_list(bot, chat_id, &songs, language_code).await?;
            }
        }
        Effect::ListAll => {
            let songs = list_songs(pool).await?;
            if songs.is_empty() {
                bot.send_message(chat_id, t_lang("archive-empty", language_code))
                    .await?;
            } else {
                send_song_list(bot, chat_id, &songs, language_code).await?;
            }
        }
        Effect::LoadSong { song_id, purpose } => {
            let song = read_song(pool, song_id)
                .await?
                .ok_or(StoreError::NotFound(song_id))?;
            return Ok(Some(on_song_loaded(purpose, &song)));
        }
        Effect::OfferEditFields { song_id, title } => {
            bot.send_message(
                chat_id,
                t_args_lang(
                    "edit-offer",
                    &[("id", &song_id.to_string()), ("title", &title)],
                    language_code,
                ),
            )
            .reply_markup(create_edit_fields_keyboard(language_code))
            .await?;
        }
        Effect::ConfirmDelete { song_id, title } => {
            bot.send_message(
                chat_id,
                t_args_lang(
                    "delete-confirm",
                    &[("id", &song_id.to_string()), ("title", &title)],
                    language_code,
                ),
            )
            .reply_markup(create_delete_confirm_keyboard(language_code))
            .await?;
        }
        Effect::UpdateSong { song_id, update } => {
            if update.is_empty() {
                warn!(user_id = %chat_id, song_id, "Empty song update skipped");
                bot.send_message(chat_id, t_lang("edit-unchanged", language_code))
                    .await?;
            } else {
                update_song(pool, song_id, &update).await?;
                bot.send_message(
                    chat_id,
                    t_args_lang("song-updated", &[("id", &song_id.to_string())], language_code),
                )
                .await?;
            }
        }
        Effect::DeleteSong { song_id } => {
            delete_song(pool, song_id).await?;
            bot.send_message(
                chat_id,
                t_args_lang("song-deleted", &[("id", &song_id.to_string())], language_code),
            )
            .await?;
        }
        Effect::Ignore => {
            debug!(user_id = %chat_id, "Ignoring input that does not fit the dialogue state");
        }
    }

    Ok(None)
}

/// Send search results as buttons, split over several messages when long
pub async fn send_song_list(
    bot: &Bot,
    chat_id: ChatId,
    songs: &[SongSummary],
    language_code: Option<&str>,
) -> Result<()> {
    for (index, chunk) in songs.chunks(RESULTS_PER_MESSAGE).enumerate() {
        bot.send_message(chat_id, format_results_header(songs.len(), index, language_code))
            .reply_markup(create_songs_keyboard(chunk))
            .await?;
    }

    debug!(user_id = %chat_id, results = songs.len(), "Song list sent");
    Ok(())
}
