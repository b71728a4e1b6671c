pub mod commands;
pub mod handlers;

pub use commands::{
    CliArgs, Commands, InstalledArgs, OutputFormatArg, ResolveArgs, ScanArgs, SearchArgs, StatsArgs,
};
