mod chat;
mod cli;
mod color;
mod config;
mod conversation;
mod mascot;
mod mood;
mod providers;
mod store;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cli::{chat::chat_cmd, list::list_cmd, mood::mood_cmd, ColorMode};
use mood::Mood;

#[derive(
    Parser, Default, Clone, Copy, ValueEnum, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum RequestedColorMode {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Parser)]
#[command(name = "buddy")]
#[command(about = "A chat companion with moods", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(long, default_value_t = RequestedColorMode::default())]
    color: RequestedColorMode,
    /// Read the configuration from this file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with Buddy
    Chat(ChatArgs),
    /// List available models
    List(ListArgs),
    /// Show the mood Buddy would infer from a reply
    Mood(MoodArgs),
}

#[derive(Parser, Default)]
pub(crate) struct ChatArgs {
    /// Specifies the model to be used during the chat
    #[arg(short, long)]
    model: Option<String>,
    /// Enter interactive mode
    #[arg(short, long)]
    interactive: bool,
    /// Neither load nor save the conversation history
    #[arg(long)]
    no_history: bool,
    /// Specify the initial prompt
    prompt: Option<String>,
}

/// Possible listings
#[derive(Subcommand)]
pub(crate) enum ListObject {
    /// Text models offered by the API
    Models,
}

/// Output formats
#[derive(
    Parser, ValueEnum, Default, Clone, Copy, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ListingFormat {
    /// Format the output as a table
    #[default]
    Table,
    /// Format the output as JSON
    Json,
    /// Format the output as a table without a header
    HeaderlessTable,
}

#[derive(Parser)]
pub(crate) struct ListArgs {
    /// Output the listing with the specified format
    #[arg(short, long, default_value_t = ListingFormat::default())]
    format: ListingFormat,
    /// List the specified object
    #[command(subcommand)]
    object: ListObject,
}

#[derive(Parser)]
pub(crate) struct MoodArgs {
    /// The mood shown before the reply arrived
    #[arg(short, long, default_value_t = Mood::Idle)]
    current: Mood,
    /// Output the scores with the specified format
    #[arg(short, long, default_value_t = ListingFormat::default())]
    format: ListingFormat,
    /// The reply text; read from standard input when omitted
    text: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    color::configure_color(ColorMode::resolve_auto(cli.color));

    utils::logging::init();

    let config = config::read_config(cli.config.clone());

    match &cli.command {
        Some(Commands::Chat(args)) => chat_cmd(&config, args).await,
        Some(Commands::List(args)) => list_cmd(&config, args).await,
        Some(Commands::Mood(args)) => mood_cmd(args),
        None => chat_cmd(&config, &ChatArgs::default()).await,
    }
}
