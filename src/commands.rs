//! Bot commands understood by the song archive.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Folk song archive commands:")]
pub enum Command {
    #[command(description = "main menu")]
    Start,
    #[command(description = "help and instructions")]
    Help,
    #[command(description = "add a new song to the archive")]
    Add,
    #[command(description = "search by title")]
    SearchTitle,
    #[command(description = "search by song text")]
    SearchText,
    #[command(description = "search by recording place")]
    SearchPlace,
    #[command(description = "search by category")]
    SearchCategory,
    #[command(description = "search by region")]
    SearchRegion,
    #[command(description = "list all songs")]
    All,
    #[command(description = "edit a song by id")]
    Edit,
    #[command(description = "delete a song by id")]
    Delete,
    #[command(description = "cancel the current action")]
    Cancel,
}

impl Command {
    /// Commands limited to administrators when an admin list is configured
    pub fn requires_admin(&self) -> bool {
        matches!(self, Command::Edit | Command::Delete)
    }
}
