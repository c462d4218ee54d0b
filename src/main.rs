use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use dropsync_shift::cli::{Cli, Commands, RunArgs};
use dropsync_shift::colors;
use dropsync_shift::config::Config;
use dropsync_shift::notify::SilentNotifier;
use dropsync_shift::pipeline::Pipeline;
use dropsync_shift::summary::RunOutcome;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Disable colors if requested
    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match cli.command {
        Commands::Run(args) => handle_run(load_config(&config_path)?, &args),
        Commands::Plan => handle_plan(load_config(&config_path)?),
        Commands::Config => handle_config(&config_path),
        Commands::Init => handle_init(&config_path),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,dropsync_shift=debug"
    } else {
        "warn,dropsync_shift=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn handle_run(config: Config, args: &RunArgs) -> Result<()> {
    Cli::print_banner();
    println!(
        "{} {} {} {}",
        "🚚".cyan(),
        config.source_root.display().to_string().color(colors::PATH),
        "→".dimmed(),
        config.destination.display().to_string().color(colors::PATH)
    );

    let mut pipeline = Pipeline::new(config);
    if args.quiet_notify {
        pipeline = pipeline.with_notifier(SilentNotifier);
    }

    let summary = pipeline.run(!args.no_snapshot)?;

    println!();
    match summary.outcome() {
        RunOutcome::Success => println!(
            "{} {} file(s) moved, {} source(s) empty",
            "✅".green(),
            summary.files_moved().to_string().bold().color(colors::SUCCESS),
            summary.empty_sources().len()
        ),
        RunOutcome::Aborted => println!("{} Nothing to do, every source is empty", "💤".yellow()),
    }

    Ok(())
}

fn handle_plan(config: Config) -> Result<()> {
    let pipeline = Pipeline::new(config);
    let plans = pipeline.plan()?;

    println!("{}", "📋 RENAME PLAN (dry run)".bold().color(colors::HEADER));
    let mut total = 0;
    for source in &plans {
        println!();
        println!(
            "{} {} {}",
            "▶".color(colors::HEADER),
            source.label.bold(),
            source.folder.display().to_string().color(colors::PATH).dimmed()
        );
        if source.plans.is_empty() {
            println!("  {}", "(no files)".dimmed());
            continue;
        }
        for plan in &source.plans {
            let from = file_name(&plan.original);
            match &plan.new_name {
                Some(name) => println!("  {} {} {}", from, "→".cyan(), name.color(colors::SUCCESS)),
                None => println!("  {} {}", from, "(already renamed)".dimmed()),
            }
        }
        total += source.plans.len();
    }

    println!();
    println!("{} {} file(s) would be processed", "•".cyan(), total);
    Ok(())
}

fn handle_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{} {}", "Config file:".dimmed(), config_path.display());
    println!();
    config.display();
    Ok(())
}

fn handle_init(config_path: &Path) -> Result<()> {
    let current = Config::load(config_path).unwrap_or_default();
    let config = Config::run_init_wizard(&current)?;
    config.save(config_path).context("Failed to save configuration")?;

    println!();
    println!("{} Setup complete! Saved to {}", "✅".green(), config_path.display());
    println!("{} Try: {}", "💡".cyan(), "dropsync-shift plan".bold());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
