use chrono::Utc;
use songbook::bot::command_handler::may_answer;
use songbook::bot::failure_message;
use songbook::bot::ui_builder::{
    create_delete_confirm_keyboard, create_edit_fields_keyboard, create_songs_keyboard,
    format_results_header, format_song_details, song_button_label, split_message, CallbackData,
    MAX_MESSAGE_UNITS,
};
use songbook::commands::Command;
use songbook::config::BotConfig;
use songbook::db::{Song, SongSummary};
use songbook::dialogue::{advance, begin, choose, Choice, EditField, Input, SongDialogueState};
use songbook::errors::StoreError;
use songbook::localization::{init_localization, t_args_lang, t_lang};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardButtonKind};

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() {
        // Initialize localization if not already done
        let _ = init_localization();
    }

    fn callback_of(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("Unexpected button kind: {other:?}"),
        }
    }

    fn song(text: Option<&str>, region: &str) -> Song {
        Song {
            id: 17,
            title: "Калинка".to_string(),
            text: text.map(str::to_string),
            region: region.to_string(),
            audio: None,
            created_at: Utc::now(),
        }
    }

    /// Test callback data parsing for every button the bot sends
    #[test]
    fn test_callback_data_parsing() {
        assert_eq!(CallbackData::parse("song_42"), Some(CallbackData::Song(42)));
        assert_eq!(
            CallbackData::parse("edit_title"),
            Some(CallbackData::EditField(EditField::Title))
        );
        assert_eq!(
            CallbackData::parse("edit_audio"),
            Some(CallbackData::EditField(EditField::Audio))
        );
        assert_eq!(CallbackData::parse("cancel_edit"), Some(CallbackData::CancelEdit));
        assert_eq!(CallbackData::parse("delete_confirm"), Some(CallbackData::DeleteConfirm));
        assert_eq!(CallbackData::parse("delete_cancel"), Some(CallbackData::DeleteCancel));

        // Malformed or foreign data is ignored
        assert_eq!(CallbackData::parse("song_"), None);
        assert_eq!(CallbackData::parse("song_abc"), None);
        assert_eq!(CallbackData::parse("song_-1"), None);
        assert_eq!(CallbackData::parse("edit_region"), None);
        assert_eq!(CallbackData::parse(""), None);
    }

    #[test]
    fn test_callback_choices() {
        assert_eq!(CallbackData::Song(1).choice(), None);
        assert_eq!(
            CallbackData::EditField(EditField::Place).choice(),
            Some(Choice::EditField(EditField::Place))
        );
        assert_eq!(CallbackData::CancelEdit.choice(), Some(Choice::Cancel));
        assert_eq!(CallbackData::DeleteCancel.choice(), Some(Choice::Cancel));
        assert_eq!(CallbackData::DeleteConfirm.choice(), Some(Choice::ConfirmDelete));
    }

    /// Result buttons read "title (place)" and carry the song id
    #[test]
    fn test_songs_keyboard_creation() {
        let songs = vec![
            SongSummary {
                id: 3,
                title: "Песня о рябине".to_string(),
                region: "Лирические|Ярославль".to_string(),
            },
            SongSummary {
                id: 9,
                title: "Калинка".to_string(),
                region: "Плясовые".to_string(),
            },
        ];

        let keyboard = create_songs_keyboard(&songs).inline_keyboard;
        assert_eq!(keyboard.len(), 2);
        assert_eq!(keyboard[0][0].text, "Песня о рябине (Ярославль)");
        assert_eq!(callback_of(&keyboard[0][0]), "song_3");
        assert_eq!(keyboard[1][0].text, "Калинка");
        assert_eq!(callback_of(&keyboard[1][0]), "song_9");
    }

    #[test]
    fn test_legacy_dot_place_is_hidden() {
        let summary = SongSummary {
            id: 1,
            title: "Калинка".to_string(),
            region: "Плясовые|.".to_string(),
        };
        assert_eq!(song_button_label(&summary), "Калинка");
    }

    #[test]
    fn test_edit_fields_keyboard() {
        setup_localization();

        let keyboard = create_edit_fields_keyboard(Some("ru")).inline_keyboard;
        let data: Vec<&str> = keyboard.iter().map(|row| callback_of(&row[0])).collect();
        assert_eq!(
            data,
            vec![
                "edit_title",
                "edit_category",
                "edit_place",
                "edit_text",
                "edit_audio",
                "cancel_edit"
            ]
        );
        assert_eq!(keyboard[0][0].text, "Название");
    }

    #[test]
    fn test_delete_confirm_keyboard() {
        setup_localization();

        let keyboard = create_delete_confirm_keyboard(Some("en")).inline_keyboard;
        assert_eq!(keyboard.len(), 1);
        assert_eq!(callback_of(&keyboard[0][0]), "delete_confirm");
        assert_eq!(callback_of(&keyboard[0][1]), "delete_cancel");
        assert!(keyboard[0][0].text.contains("Yes, delete"));
    }

    #[test]
    fn test_song_details_formatting() {
        setup_localization();

        let details = format_song_details(&song(Some("Калинка моя"), "Плясовые|Село Вятское"), Some("ru"));
        assert!(details.contains("Название: Калинка"));
        assert!(details.contains("Категория: Плясовые"));
        assert!(details.contains("Место записи: Село Вятское"));
        assert!(details.contains("ID: 17"));
        assert!(details.ends_with("Калинка моя"));
    }

    #[test]
    fn test_song_details_without_place_or_text() {
        setup_localization();

        let details = format_song_details(&song(None, "Плясовые"), Some("en"));
        assert!(details.contains("Category: Плясовые"));
        assert!(!details.contains("Recording place"));
        assert!(details.contains("(no text)"));
    }

    #[test]
    fn test_results_header() {
        setup_localization();

        assert!(format_results_header(120, 0, Some("en")).contains("120"));
        assert_eq!(format_results_header(120, 1, Some("en")), "🔍 More results:");
    }

    /// A song text of a full Telegram message still reaches the user
    #[test]
    fn test_song_details_with_maximum_text_are_split() {
        setup_localization();

        let text = "а".repeat(4096);
        let details = format_song_details(&song(Some(&text), "Лирические|Село Вятское"), Some("ru"));
        assert!(details.chars().count() > MAX_MESSAGE_UNITS);

        let chunks = split_message(&details, MAX_MESSAGE_UNITS);
        assert_eq!(chunks.len(), 2);
        assert!(chunks
            .iter()
            .all(|chunk| chunk.encode_utf16().count() <= MAX_MESSAGE_UNITS));
        assert!(chunks[0].contains("Место записи: Село Вятское"));
        assert_eq!(chunks.concat(), details);
    }

    /// In a shared chat only admins may finish an edit or delete
    #[test]
    fn test_non_admin_cannot_finish_admin_wizard() {
        let config = BotConfig {
            admin_user_ids: vec![100],
            ..Default::default()
        };
        let admin = Some(100);
        let member = Some(200);

        // The admin starts a delete in the group
        let state = begin(&Command::Delete).next;
        assert!(!may_answer(&state, member, &config));
        assert!(may_answer(&state, admin, &config));

        // The admin reaches the confirmation step
        let confirming = SongDialogueState::ConfirmingDelete {
            song_id: 5,
            title: "Калинка".to_string(),
        };
        assert!(!may_answer(&confirming, member, &config));
        assert!(!may_answer(&confirming, None, &config));
        assert!(choose(confirming.clone(), Choice::ConfirmDelete).writes_store());

        // Editing is guarded the same way
        let editing = SongDialogueState::AwaitingEditValue {
            song_id: 5,
            field: EditField::Text,
            region: "Лирические".to_string(),
        };
        assert!(!may_answer(&editing, member, &config));
        assert!(advance(editing, Input::Text("Новый текст")).writes_store());

        // Searching and adding stay open to everyone
        assert!(may_answer(&SongDialogueState::AwaitingTitle, member, &config));
        assert!(may_answer(&begin(&Command::SearchTitle).next, member, &config));
    }

    #[test]
    fn test_failure_message_for_missing_song() {
        setup_localization();

        let error = anyhow::Error::from(StoreError::NotFound(42));
        let message = failure_message(&error, Some("en"));
        assert_eq!(message, t_args_lang("song-not-found", &[("id", "42")], Some("en")));
        assert!(message.contains("42"));

        // Context added on the way up does not hide the store error
        let error = anyhow::Error::from(StoreError::NotFound(7)).context("loading song for edit");
        assert!(failure_message(&error, Some("ru")).contains("7"));
    }

    #[test]
    fn test_failure_message_for_store_errors_is_generic() {
        setup_localization();

        let error = anyhow::Error::from(StoreError::from(sqlx::Error::PoolTimedOut));
        assert_eq!(failure_message(&error, Some("en")), t_lang("error-generic", Some("en")));

        let error = anyhow::anyhow!("telegram request failed");
        assert_eq!(failure_message(&error, Some("ru")), t_lang("error-generic", Some("ru")));
    }
}
