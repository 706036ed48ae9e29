use std::process;

use clap::Parser;
use colored::*;
use danmaku_cli::{
    AppConfig, CommandExecutor, EpisodeArgs, Result,
    cli::{Args, Commands, OutputFormat},
};
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let json_output = matches!(
        &args.command,
        Commands::Fetch {
            output: OutputFormat::Json,
            ..
        }
    );

    if let Err(e) = run(args).await {
        if json_output {
            let error_json = serde_json::json!({
                "status": "error",
                "message": e.to_string(),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {}", e);
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    init_logging(args.verbose, args.quiet, config.log_filter.as_deref());

    if let Some(timeout_ms) = args.timeout_ms {
        config.fetch.provider_timeout_ms = timeout_ms;
    }
    debug!(?config, "Loaded configuration");

    let executor = CommandExecutor::new(config);

    match args.command {
        Commands::Fetch {
            subject_id,
            subject_name,
            episode_id,
            episode_sort,
            episode_name,
            filename,
            file_size,
            output,
        } => {
            let episode = EpisodeArgs {
                subject_id,
                subject_name,
                episode_id,
                episode_sort,
                episode_name,
                filename,
                file_size,
            };
            let rendered = executor.fetch(&episode, output).await?;
            print!("{rendered}");
            if output == OutputFormat::Json {
                println!();
            }
        }

        Commands::Providers => {
            print!("{}", executor.list_providers());
        }

        Commands::Config { show } => {
            if show {
                print!("{}", executor.show_config()?);
            } else {
                match AppConfig::default_path() {
                    Some(path) => println!("Config file: {}", path.display()),
                    None => println!("No config directory on this platform"),
                }
                println!("Use --show to display the current configuration");
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool, configured: Option<&str>) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| match configured {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::default().add_directive(Level::INFO.into()),
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
