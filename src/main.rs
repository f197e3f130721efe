use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use tunebridge::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert a playlist to another platform
    Convert(ConvertOptions),

    /// Show which platform a playlist URL belongs to
    Detect(DetectOptions),

    /// List your playlists on a platform
    Playlists(PlaylistsOptions),

    /// Run the HTTP conversion service
    Serve,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertOptions {
    /// Source playlist URL
    url: String,

    /// Target platform (spotify, youtube, apple)
    #[clap(long)]
    to: String,

    /// Create the converted playlist on the target platform
    #[clap(long)]
    create: bool,

    /// User whose stored credentials are used for playlist creation
    #[clap(long)]
    user: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DetectOptions {
    url: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistsOptions {
    /// Platform to list (spotify, youtube)
    provider: String,

    /// User whose stored credentials are used
    #[clap(long)]
    user: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    match cli.command {
        Command::Convert(opt) => {
            cli::convert(&config, opt.url, opt.to, opt.create, opt.user).await
        }
        Command::Detect(opt) => cli::detect(&opt.url),
        Command::Playlists(opt) => cli::playlists(&config, opt.provider, opt.user).await,
        Command::Serve => cli::serve(&config).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
