use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tattler")]
#[command(about = "Alerts subreddit moderators when their posts reach trending feeds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install or upgrade: reschedule the feed check and migrate stored data
    Install,

    /// Run scheduled jobs until interrupted
    Serve,

    /// Check the trending feeds once, right now
    Run {
        /// Treat a random post of the subreddit as trending
        #[arg(long)]
        test_mode: bool,

        /// Dry run - show which posts would be alerted without acting or recording them
        #[arg(long)]
        dry_run: bool,
    },

    /// Queue a test-mode check that previews the configured actions
    Test {
        /// Skip the confirmation prompt for user-visible actions
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the effective settings and any problems with them
    Settings,

    /// List scheduled jobs
    Jobs,
}
