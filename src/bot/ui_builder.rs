//! UI Builder module for creating keyboards, callback data and song texts

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import song types
use crate::db::{Song, SongSummary};
use crate::dialogue::{Choice, EditField};

/// Telegram rejects oversized reply markups, long lists are split
pub const RESULTS_PER_MESSAGE: usize = 50;

const MAX_BUTTON_LABEL_CHARS: usize = 60;

/// Telegram message limit, counted in UTF-16 code units
pub const MAX_MESSAGE_UNITS: usize = 4096;

/// Payload carried by an inline keyboard button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackData {
    /// Show one song from a result list
    Song(i64),
    EditField(EditField),
    CancelEdit,
    DeleteConfirm,
    DeleteCancel,
}

impl CallbackData {
    /// Parse the `data` string of a callback query
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(id) = data.strip_prefix("song_") {
            return match id.parse::<i64>() {
                Ok(id) if id > 0 => Some(CallbackData::Song(id)),
                _ => None,
            };
        }

        match data {
            "edit_title" => Some(CallbackData::EditField(EditField::Title)),
            "edit_category" => Some(CallbackData::EditField(EditField::Category)),
            "edit_place" => Some(CallbackData::EditField(EditField::Place)),
            "edit_text" => Some(CallbackData::EditField(EditField::Text)),
            "edit_audio" => Some(CallbackData::EditField(EditField::Audio)),
            "cancel_edit" => Some(CallbackData::CancelEdit),
            "delete_confirm" => Some(CallbackData::DeleteConfirm),
            "delete_cancel" => Some(CallbackData::DeleteCancel),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            CallbackData::Song(id) => format!("song_{id}"),
            CallbackData::EditField(field) => format!("edit_{}", field_slug(*field)),
            CallbackData::CancelEdit => "cancel_edit".to_string(),
            CallbackData::DeleteConfirm => "delete_confirm".to_string(),
            CallbackData::DeleteCancel => "delete_cancel".to_string(),
        }
    }

    /// The wizard choice behind the button, `None` for result list buttons
    pub fn choice(&self) -> Option<Choice> {
        match self {
            CallbackData::Song(_) => None,
            CallbackData::EditField(field) => Some(Choice::EditField(*field)),
            CallbackData::CancelEdit | CallbackData::DeleteCancel => Some(Choice::Cancel),
            CallbackData::DeleteConfirm => Some(Choice::ConfirmDelete),
        }
    }
}

fn field_slug(field: EditField) -> &'static str {
    match field {
        EditField::Title => "title",
        EditField::Category => "category",
        EditField::Place => "place",
        EditField::Text => "text",
        EditField::Audio => "audio",
    }
}

fn field_label_key(field: EditField) -> &'static str {
    match field {
        EditField::Title => "field-title",
        EditField::Category => "field-category",
        EditField::Place => "field-place",
        EditField::Text => "field-text",
        EditField::Audio => "field-audio",
    }
}

/// Button label of a search result: `title (place)`
pub fn song_button_label(song: &SongSummary) -> String {
    let label = match song.region().place {
        Some(place) => format!("{} ({})", song.title, place),
        None => song.title.clone(),
    };

    // Truncate if too long for button
    if label.chars().count() > MAX_BUTTON_LABEL_CHARS {
        let truncated: String = label.chars().take(MAX_BUTTON_LABEL_CHARS - 3).collect();
        format!("{truncated}...")
    } else {
        label
    }
}

/// One button per song, one song per row
pub fn create_songs_keyboard(songs: &[SongSummary]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = songs
        .iter()
        .map(|song| {
            vec![InlineKeyboardButton::callback(
                song_button_label(song),
                CallbackData::Song(song.id).encode(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Field buttons shown after `/edit` found the song
pub fn create_edit_fields_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let fields = [
        EditField::Title,
        EditField::Category,
        EditField::Place,
        EditField::Text,
        EditField::Audio,
    ];

    let mut buttons: Vec<Vec<InlineKeyboardButton>> = fields
        .iter()
        .map(|field| {
            vec![InlineKeyboardButton::callback(
                t_lang(field_label_key(*field), language_code),
                CallbackData::EditField(*field).encode(),
            )]
        })
        .collect();

    buttons.push(vec![InlineKeyboardButton::callback(
        format!("❌ {}", t_lang("button-cancel", language_code)),
        CallbackData::CancelEdit.encode(),
    )]);

    InlineKeyboardMarkup::new(buttons)
}

pub fn create_delete_confirm_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            format!("🗑️ {}", t_lang("button-delete-yes", language_code)),
            CallbackData::DeleteConfirm.encode(),
        ),
        InlineKeyboardButton::callback(
            t_lang("button-delete-no", language_code),
            CallbackData::DeleteCancel.encode(),
        ),
    ]])
}

/// Plain-text details view of a song
pub fn format_song_details(song: &Song, language_code: Option<&str>) -> String {
    let region = song.region();
    let mut result = format!(
        "{}\n\n{}: {}\n{}: {}\n{}: {}\n",
        t_lang("details-title", language_code),
        t_lang("label-id", language_code),
        song.id,
        t_lang("label-title", language_code),
        song.title,
        t_lang("label-category", language_code),
        region.category,
    );

    if let Some(place) = &region.place {
        result.push_str(&format!("{}: {}\n", t_lang("label-place", language_code), place));
    }

    let text = match song.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => t_lang("no-text", language_code),
    };
    result.push_str(&format!("\n{}:\n{}", t_lang("label-text", language_code), text));

    result
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Split text into messages of at most `limit` UTF-16 units.
///
/// Cuts go between lines; a single line longer than the limit is cut
/// inside. Whitespace-only pieces are dropped.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    fn flush(chunks: &mut Vec<String>, current: &mut String, current_len: &mut usize) {
        let chunk = std::mem::take(current);
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        *current_len = 0;
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);
        if current_len + line_len > limit {
            flush(&mut chunks, &mut current, &mut current_len);
        }

        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        for c in line.chars() {
            if current_len + c.len_utf16() > limit {
                flush(&mut chunks, &mut current, &mut current_len);
            }
            current.push(c);
            current_len += c.len_utf16();
        }
    }
    flush(&mut chunks, &mut current, &mut current_len);

    chunks
}

/// Header of a result list chunk
pub fn format_results_header(total: usize, chunk_index: usize, language_code: Option<&str>) -> String {
    if chunk_index == 0 {
        t_args_lang("results-found", &[("count", &total.to_string())], language_code)
    } else {
        t_lang("results-continued", language_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, title: &str, region: &str) -> SongSummary {
        SongSummary {
            id,
            title: title.to_string(),
            region: region.to_string(),
        }
    }

    #[test]
    fn test_button_label_with_and_without_place() {
        assert_eq!(
            song_button_label(&summary(1, "Калинка", "Лирические|Село Вятское")),
            "Калинка (Село Вятское)"
        );
        assert_eq!(song_button_label(&summary(2, "Калинка", "Лирические")), "Калинка");
    }

    #[test]
    fn test_button_label_truncation_counts_chars() {
        let label = song_button_label(&summary(1, &"я".repeat(100), "Лирические"));
        assert_eq!(label.chars().count(), MAX_BUTTON_LABEL_CHARS);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_songs_keyboard_layout() {
        let keyboard = create_songs_keyboard(&[
            summary(3, "Первая", "А"),
            summary(7, "Вторая", "Б|Место"),
        ]);
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert!(keyboard.inline_keyboard.iter().all(|row| row.len() == 1));
    }

    #[test]
    fn test_split_message_prefers_line_breaks() {
        let chunks = split_message("first line\nsecond line\nthird", 24);
        assert_eq!(chunks, vec!["first line\nsecond line\n", "third"]);
    }

    #[test]
    fn test_split_message_counts_utf16_units() {
        // Each emoji takes two code units
        let chunks = split_message(&"🎵".repeat(5), 4);
        assert_eq!(chunks, vec!["🎵🎵", "🎵🎵", "🎵"]);
    }

    #[test]
    fn test_split_message_short_text_is_untouched() {
        assert_eq!(split_message("Калинка", MAX_MESSAGE_UNITS), vec!["Калинка"]);
        assert!(split_message("\n\n", MAX_MESSAGE_UNITS).is_empty());
    }

    #[test]
    fn test_field_slugs_round_trip_through_parse() {
        for field in [
            EditField::Title,
            EditField::Category,
            EditField::Place,
            EditField::Text,
            EditField::Audio,
        ] {
            let data = CallbackData::EditField(field);
            assert_eq!(CallbackData::parse(&data.encode()), Some(data));
        }
    }
}
