use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Natural-language tool resolution engine with feed-based discovery
#[derive(Parser, Debug)]
#[command(
    name = "toolcast",
    about = "Natural-language tool resolution engine with feed-based discovery",
    version,
    author,
    long_about = "toolcast classifies free-form requests into tool actions (install, \
                  execute, search, ...) and discovers tools by scanning a social feed \
                  for tool mentions. An LLM classifier backend is optional; without \
                  one, deterministic rules handle classification.\n\n\
                  Examples:\n  \
                  toolcast resolve \"install giphy\" --feed feed.json\n  \
                  toolcast resolve \"show me a gif of cats\"\n  \
                  toolcast scan --feed feed.json --force\n  \
                  toolcast search weather --feed feed.json"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (debug-level logging)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Resolve a request and execute the resulting action",
        long_about = "Classifies one piece of text into a tool action and executes it.\n\n\
                      Examples:\n  \
                      toolcast resolve \"install giphy\" --feed feed.json\n  \
                      toolcast resolve \"show me a gif of cats\"\n  \
                      toolcast resolve \"weather in Tokyo\" --installed tools.weather"
    )]
    Resolve(ResolveArgs),

    #[command(about = "Search the registry and feed for tools")]
    Search(SearchArgs),

    #[command(about = "Scan the feed for tool mentions")]
    Scan(ScanArgs),

    #[command(about = "List a user's installed tools")]
    Installed(InstalledArgs),

    #[command(about = "Show registry statistics")]
    Stats(StatsArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(value_name = "TEXT", help = "The request to resolve")]
    pub text: String,

    #[arg(
        short = 'u',
        long,
        default_value = "local",
        help = "User id owning the session"
    )]
    pub user: String,

    #[arg(long, value_name = "FILE", help = "JSON feed file used for discovery")]
    pub feed: Option<PathBuf>,

    #[arg(
        long,
        value_name = "IDS",
        value_delimiter = ',',
        help = "Pre-installed tool ids for this invocation (comma-separated)"
    )]
    pub installed: Vec<String>,

    #[arg(long, help = "Skip the classifier backend and use rules only")]
    pub rules_only: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", help = "Search query")]
    pub query: String,

    #[arg(long, value_name = "FILE", help = "JSON feed file used for discovery")]
    pub feed: Option<PathBuf>,

    #[arg(short = 'n', long, default_value = "5", help = "Maximum results")]
    pub limit: usize,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(long, value_name = "FILE", help = "JSON feed file to scan")]
    pub feed: Option<PathBuf>,

    #[arg(long, help = "Scan even if the registry is still fresh")]
    pub force: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct InstalledArgs {
    #[arg(
        short = 'u',
        long,
        default_value = "local",
        help = "User id owning the session"
    )]
    pub user: String,

    #[arg(
        long,
        value_name = "IDS",
        value_delimiter = ',',
        help = "Pre-installed tool ids for this invocation (comma-separated)"
    )]
    pub installed: Vec<String>,

    #[arg(long, value_name = "FILE", help = "JSON feed file used for discovery")]
    pub feed: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, value_name = "FILE", help = "JSON feed file to scan first")]
    pub feed: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}
