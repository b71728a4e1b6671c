use toolcast::cli::commands::{CliArgs, Commands};
use toolcast::cli::handlers::{
    handle_installed, handle_resolve, handle_scan, handle_search, handle_stats,
};
use toolcast::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("toolcast v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Resolve(resolve_args) => handle_resolve(resolve_args, args.quiet).await,
        Commands::Search(search_args) => handle_search(search_args).await,
        Commands::Scan(scan_args) => handle_scan(scan_args).await,
        Commands::Installed(installed_args) => handle_installed(installed_args).await,
        Commands::Stats(stats_args) => handle_stats(stats_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if let Some(level_str) = &args.log_level {
            toolcast::util::logging::parse_level(level_str)
        } else if args.verbose {
            Level::DEBUG
        } else if args.quiet {
            Level::ERROR
        } else {
            let level_str = env::var("TOOLCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            toolcast::util::logging::parse_level(&level_str)
        };

        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("toolcast={}", level).parse().unwrap())
                .add_directive("h2=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap());
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}
