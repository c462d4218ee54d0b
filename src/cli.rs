use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dropsync-shift",
    about = "Rename, convert and move media synced from phone apps",
    version,
    long_about = "dropsync-shift drains the folders a phone-to-desktop sync app\n\
                  fills (WhatsApp, Telegram, Snapchat, downloaders) into a single\n\
                  destination folder.\n\n\
                  Every file is renamed to <YYYY-MM-DD_HH-MM-SS>_<label>.<ext>\n\
                  from its capture time, audio is transcoded, stickers become\n\
                  png, and junk folders are emptied."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.dropsync-shift.json)
    #[arg(long, global = true, env = "DROPSYNC_SHIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename, convert and move every configured source once
    Run(RunArgs),

    /// Show the renames a run would make, without touching any file
    Plan,

    /// Show configuration
    Config,

    /// Interactive setup, writes the config file
    Init,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Skip the safety copy of the source folder
    #[arg(long)]
    pub no_snapshot: bool,

    /// Do not post desktop notifications
    #[arg(long)]
    pub quiet_notify: bool,
}

impl Cli {
    /// Print version information
    pub fn print_banner() {
        println!(
            "{} {}",
            "📦 dropsync-shift".bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
        );
    }
}

impl Commands {
    /// Get the command name
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run(_) => "run",
            Commands::Plan => "plan",
            Commands::Config => "config",
            Commands::Init => "init",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_and_global_options_parse() {
        let cli = Cli::parse_from([
            "dropsync-shift",
            "run",
            "--no-snapshot",
            "--quiet-notify",
            "--config",
            "/tmp/shift.json",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/shift.json")));
        match cli.command {
            Commands::Run(args) => {
                assert!(args.no_snapshot);
                assert!(args.quiet_notify);
            }
            other => panic!("unexpected command {}", other.name()),
        }
    }

    #[test]
    fn plan_takes_no_arguments() {
        let cli = Cli::parse_from(["dropsync-shift", "--no-color", "plan"]);
        assert!(cli.no_color);
        assert_eq!(cli.command.name(), "plan");
    }
}
