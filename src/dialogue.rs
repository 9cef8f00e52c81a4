//! Song dialogue module: per-chat wizard state and its transitions.
//!
//! The transition functions here are pure. Bot handlers load the current
//! state from the dialogue storage, call [`begin`], [`advance`], [`choose`]
//! or [`on_song_loaded`], store `Transition::next` and then carry out
//! `Transition::effect` against the song store.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::commands::Command;
use crate::db::{NewSong, SearchField, Song, SongUpdate};
use crate::region::{contains_separator, Region};

pub const MAX_TITLE_LENGTH: usize = 255;

/// Input meaning "leave blank" while adding and "keep as is" while editing
pub const SKIP_MARKER: &str = ".";

/// Song field picked in the edit wizard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditField {
    Title,
    Category,
    Place,
    Text,
    Audio,
}

/// Conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SongDialogueState {
    #[default]
    Idle,
    AwaitingTitle,
    AwaitingCategory {
        title: String,
    },
    AwaitingPlace {
        title: String,
        category: String,
    },
    AwaitingText {
        title: String,
        category: String,
        place: Option<String>,
    },
    AwaitingSearchQuery {
        field: SearchField,
    },
    AwaitingEditId,
    ChoosingEditField {
        song_id: i64,
        region: String,
    },
    AwaitingEditValue {
        song_id: i64,
        field: EditField,
        region: String,
    },
    AwaitingDeleteId,
    ConfirmingDelete {
        song_id: i64,
        title: String,
    },
}

impl SongDialogueState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SongDialogueState::Idle)
    }

    /// Whether the next message should carry an audio file
    pub fn expects_audio(&self) -> bool {
        matches!(
            self,
            SongDialogueState::AwaitingEditValue {
                field: EditField::Audio,
                ..
            }
        )
    }

    /// Edit and delete steps; only administrators may answer them
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            SongDialogueState::AwaitingEditId
                | SongDialogueState::ChoosingEditField { .. }
                | SongDialogueState::AwaitingEditValue { .. }
                | SongDialogueState::AwaitingDeleteId
                | SongDialogueState::ConfirmingDelete { .. }
        )
    }
}

/// Type alias for the song dialogue
pub type SongDialogue = Dialogue<SongDialogueState, InMemStorage<SongDialogueState>>;

/// User input fed to [`advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum Input<'a> {
    Text(&'a str),
    Audio(Vec<u8>),
}

/// Inline keyboard choice fed to [`choose`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    EditField(EditField),
    ConfirmDelete,
    Cancel,
}

/// Why a song is being looked up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadPurpose {
    Edit,
    Delete,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a localized message
    Say(&'static str),
    /// Report an input error; the flow is over
    Abort(&'static str),
    SaveSong(NewSong),
    Search { field: SearchField, query: String },
    ListAll,
    /// Fetch the song, then continue with [`on_song_loaded`]
    LoadSong { song_id: i64, purpose: LoadPurpose },
    OfferEditFields { song_id: i64, title: String },
    ConfirmDelete { song_id: i64, title: String },
    UpdateSong { song_id: i64, update: SongUpdate },
    DeleteSong { song_id: i64 },
    /// Stale or irrelevant input
    Ignore,
}

/// Result of one step: the state to store and the effect to run
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: SongDialogueState,
    pub effect: Effect,
}

impl Transition {
    fn to(next: SongDialogueState, effect: Effect) -> Self {
        Self { next, effect }
    }

    fn finish(effect: Effect) -> Self {
        Self::to(SongDialogueState::Idle, effect)
    }

    /// Whether running the effect writes to the store
    pub fn writes_store(&self) -> bool {
        matches!(
            self.effect,
            Effect::SaveSong(_) | Effect::UpdateSong { .. } | Effect::DeleteSong { .. }
        )
    }
}

/// Start a command. Any wizard in progress is discarded.
pub fn begin(command: &Command) -> Transition {
    use SongDialogueState as S;

    let search = |field: SearchField, prompt: &'static str| {
        Transition::to(S::AwaitingSearchQuery { field }, Effect::Say(prompt))
    };

    match command {
        Command::Start => Transition::finish(Effect::Say("menu")),
        Command::Help => Transition::finish(Effect::Say("help")),
        Command::Add => Transition::to(S::AwaitingTitle, Effect::Say("prompt-title")),
        Command::SearchTitle => search(SearchField::Title, "prompt-search-title"),
        Command::SearchText => search(SearchField::Text, "prompt-search-text"),
        Command::SearchPlace => search(SearchField::Place, "prompt-search-place"),
        Command::SearchCategory => search(SearchField::Category, "prompt-search-category"),
        Command::SearchRegion => search(SearchField::Region, "prompt-search-region"),
        Command::All => Transition::finish(Effect::ListAll),
        Command::Edit => Transition::to(S::AwaitingEditId, Effect::Say("prompt-edit-id")),
        Command::Delete => Transition::to(S::AwaitingDeleteId, Effect::Say("prompt-delete-id")),
        Command::Cancel => Transition::finish(Effect::Say("cancelled")),
    }
}

/// Interpret user input in the given state
pub fn advance(state: SongDialogueState, input: Input<'_>) -> Transition {
    use SongDialogueState as S;

    let text = match input {
        Input::Text(text) => text,
        Input::Audio(bytes) => return advance_audio(state, bytes),
    };

    match state {
        S::Idle => Transition::to(S::Idle, Effect::Say("use-commands")),

        S::AwaitingTitle => match validate_title(text) {
            Ok(title) => Transition::to(S::AwaitingCategory { title }, Effect::Say("prompt-category")),
            Err(key) => Transition::to(S::AwaitingTitle, Effect::Say(key)),
        },

        S::AwaitingCategory { title } => {
            let category = text.trim();
            if category.is_empty() || category == SKIP_MARKER {
                return Transition::to(S::AwaitingCategory { title }, Effect::Say("category-empty"));
            }
            if contains_separator(category) {
                return Transition::finish(Effect::Abort("region-malformed"));
            }
            Transition::to(
                S::AwaitingPlace {
                    title,
                    category: category.to_string(),
                },
                Effect::Say("prompt-place"),
            )
        }

        S::AwaitingPlace { title, category } => {
            let place = optional_value(text);
            if place.as_deref().is_some_and(contains_separator) {
                return Transition::finish(Effect::Abort("region-malformed"));
            }
            Transition::to(
                S::AwaitingText {
                    title,
                    category,
                    place,
                },
                Effect::Say("prompt-text"),
            )
        }

        S::AwaitingText {
            title,
            category,
            place,
        } => Transition::finish(Effect::SaveSong(NewSong {
            title,
            text: optional_value(text),
            region: Region::new(category, place.as_deref()).encode(),
            audio: None,
        })),

        S::AwaitingSearchQuery { field } => {
            let query = text.trim();
            if query.is_empty() {
                return Transition::to(S::AwaitingSearchQuery { field }, Effect::Say("search-empty"));
            }
            Transition::finish(Effect::Search {
                field,
                query: query.to_string(),
            })
        }

        S::AwaitingEditId => match parse_song_id(text) {
            Ok(song_id) => Transition::finish(Effect::LoadSong {
                song_id,
                purpose: LoadPurpose::Edit,
            }),
            Err(key) => Transition::finish(Effect::Abort(key)),
        },

        S::AwaitingDeleteId => match parse_song_id(text) {
            Ok(song_id) => Transition::finish(Effect::LoadSong {
                song_id,
                purpose: LoadPurpose::Delete,
            }),
            Err(key) => Transition::finish(Effect::Abort(key)),
        },

        S::ChoosingEditField { song_id, region } => {
            if is_negative_answer(text) {
                Transition::finish(Effect::Say("edit-cancelled"))
            } else {
                Transition::to(S::ChoosingEditField { song_id, region }, Effect::Say("edit-choose-field"))
            }
        }

        S::AwaitingEditValue {
            song_id,
            field,
            region,
        } => advance_edit_value(song_id, field, region, text),

        S::ConfirmingDelete { song_id, title } => {
            if is_positive_answer(text) {
                Transition::finish(Effect::DeleteSong { song_id })
            } else if is_negative_answer(text) {
                Transition::finish(Effect::Say("delete-cancelled"))
            } else {
                Transition::to(S::ConfirmingDelete { song_id, title }, Effect::Say("delete-confirm-help"))
            }
        }
    }
}

fn advance_audio(state: SongDialogueState, bytes: Vec<u8>) -> Transition {
    match state {
        SongDialogueState::AwaitingEditValue {
            song_id,
            field: EditField::Audio,
            ..
        } if !bytes.is_empty() => Transition::finish(Effect::UpdateSong {
            song_id,
            update: SongUpdate {
                audio: Some(bytes),
                ..Default::default()
            },
        }),
        other => Transition::to(other, Effect::Say("audio-unexpected")),
    }
}

fn advance_edit_value(song_id: i64, field: EditField, region: String, text: &str) -> Transition {
    if is_skip_input(text) {
        return Transition::finish(Effect::Say("edit-unchanged"));
    }

    let value = text.trim();
    let update = match field {
        EditField::Title => match validate_title(value) {
            Ok(title) => SongUpdate {
                title: Some(title),
                ..Default::default()
            },
            Err(key) => {
                return Transition::to(
                    SongDialogueState::AwaitingEditValue {
                        song_id,
                        field,
                        region,
                    },
                    Effect::Say(key),
                )
            }
        },
        EditField::Category | EditField::Place if contains_separator(value) => {
            return Transition::finish(Effect::Abort("region-malformed"));
        }
        EditField::Category => SongUpdate {
            region: Some(Region::parse(&region).with_category(value).encode()),
            ..Default::default()
        },
        EditField::Place => SongUpdate {
            region: Some(Region::parse(&region).with_place(Some(value)).encode()),
            ..Default::default()
        },
        EditField::Text => SongUpdate {
            text: Some(value.to_string()),
            ..Default::default()
        },
        EditField::Audio => {
            return Transition::to(
                SongDialogueState::AwaitingEditValue {
                    song_id,
                    field,
                    region,
                },
                Effect::Say("edit-audio-expected"),
            )
        }
    };

    Transition::finish(Effect::UpdateSong { song_id, update })
}

/// Apply an inline keyboard choice
pub fn choose(state: SongDialogueState, choice: Choice) -> Transition {
    use SongDialogueState as S;

    match (state, choice) {
        (S::ChoosingEditField { song_id, region }, Choice::EditField(field)) => Transition::to(
            S::AwaitingEditValue {
                song_id,
                field,
                region,
            },
            Effect::Say(edit_prompt_key(field)),
        ),
        (S::ChoosingEditField { .. }, Choice::Cancel) => Transition::finish(Effect::Say("edit-cancelled")),
        (S::ConfirmingDelete { song_id, .. }, Choice::ConfirmDelete) => {
            Transition::finish(Effect::DeleteSong { song_id })
        }
        (S::ConfirmingDelete { .. }, Choice::Cancel) => Transition::finish(Effect::Say("delete-cancelled")),
        (state, _) => Transition::to(state, Effect::Ignore),
    }
}

/// Continue an edit or delete once the target song has been fetched
pub fn on_song_loaded(purpose: LoadPurpose, song: &Song) -> Transition {
    match purpose {
        LoadPurpose::Edit => Transition::to(
            SongDialogueState::ChoosingEditField {
                song_id: song.id,
                region: song.region.clone(),
            },
            Effect::OfferEditFields {
                song_id: song.id,
                title: song.title.clone(),
            },
        ),
        LoadPurpose::Delete => Transition::to(
            SongDialogueState::ConfirmingDelete {
                song_id: song.id,
                title: song.title.clone(),
            },
            Effect::ConfirmDelete {
                song_id: song.id,
                title: song.title.clone(),
            },
        ),
    }
}

/// Localization key of the prompt asking for a new field value
pub fn edit_prompt_key(field: EditField) -> &'static str {
    match field {
        EditField::Title => "edit-prompt-title",
        EditField::Category => "edit-prompt-category",
        EditField::Place => "edit-prompt-place",
        EditField::Text => "edit-prompt-text",
        EditField::Audio => "edit-prompt-audio",
    }
}

/// Validates a song title input
pub fn validate_title(title: &str) -> Result<String, &'static str> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err("title-empty");
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err("title-too-long");
    }

    Ok(trimmed.to_string())
}

/// Parse a song id typed by the user
pub fn parse_song_id(input: &str) -> Result<i64, &'static str> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    match digits.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err("invalid-id"),
    }
}

/// True for the "leave blank / unchanged" marker
pub fn is_skip_input(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.is_empty() || trimmed == SKIP_MARKER
}

fn optional_value(input: &str) -> Option<String> {
    if is_skip_input(input) {
        None
    } else {
        Some(input.trim().to_string())
    }
}

fn is_positive_answer(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "yes" | "y" | "да" | "д")
}

fn is_negative_answer(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "no" | "n" | "нет" | "н" | "cancel" | "отмена"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_validation() {
        assert!(validate_title("Во поле берёза стояла").is_ok());
        assert!(validate_title("  Калинка  ").is_ok());

        assert_eq!(validate_title(""), Err("title-empty"));
        assert_eq!(validate_title("   "), Err("title-empty"));
        assert_eq!(validate_title(&"а".repeat(256)), Err("title-too-long"));
        assert!(validate_title(&"а".repeat(255)).is_ok());
    }

    #[test]
    fn test_title_trimming() {
        assert_eq!(validate_title("  Калинка  ").unwrap(), "Калинка");
    }

    #[test]
    fn test_parse_song_id() {
        assert_eq!(parse_song_id("42"), Ok(42));
        assert_eq!(parse_song_id(" #7 "), Ok(7));
        assert_eq!(parse_song_id("abc"), Err("invalid-id"));
        assert_eq!(parse_song_id("0"), Err("invalid-id"));
        assert_eq!(parse_song_id("-3"), Err("invalid-id"));
        assert_eq!(parse_song_id("1.5"), Err("invalid-id"));
    }

    #[test]
    fn test_skip_marker() {
        assert!(is_skip_input("."));
        assert!(is_skip_input(" . "));
        assert!(is_skip_input(""));
        assert!(!is_skip_input(".."));
        assert!(!is_skip_input("Село"));
    }

    #[test]
    fn test_answers() {
        assert!(is_positive_answer("Да"));
        assert!(is_positive_answer("yes"));
        assert!(is_negative_answer("НЕТ"));
        assert!(is_negative_answer("cancel"));
        assert!(!is_positive_answer("maybe"));
    }

    #[test]
    fn test_expects_audio() {
        let state = SongDialogueState::AwaitingEditValue {
            song_id: 1,
            field: EditField::Audio,
            region: "A".to_string(),
        };
        assert!(state.expects_audio());
        assert!(!SongDialogueState::AwaitingTitle.expects_audio());
        assert!(SongDialogueState::default().is_idle());
    }

    #[test]
    fn test_admin_states() {
        assert!(SongDialogueState::AwaitingDeleteId.requires_admin());
        assert!(SongDialogueState::ConfirmingDelete {
            song_id: 1,
            title: "Калинка".to_string()
        }
        .requires_admin());
        assert!(!SongDialogueState::AwaitingTitle.requires_admin());
        assert!(!SongDialogueState::AwaitingSearchQuery {
            field: SearchField::Title
        }
        .requires_admin());
        assert!(!SongDialogueState::Idle.requires_admin());
    }
}
