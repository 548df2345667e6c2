use std::io::{self, Write};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tattler::cli::{Cli, Commands};
use tattler::config::Config;
use tattler::domain::{ScheduledJob, CHECK_FEEDS_JOB};
use tattler::errors::{TattlerError, TattlerResult};
use tattler::platform::RedditClient;
use tattler::services::{
    CheckOptions, CheckService, CycleOutcome, CycleReport, InstallService, Scheduler,
    TestModeRequest, TestModeService, WebhookService, TEST_MODE_QUEUED_MESSAGE,
};
use tattler::settings::AppSettings;
use tattler::storage::{
    SqliteAlertRepository, SqliteJobRepository, SqliteMigrationRepository, SqliteStorage,
};

type Checker = CheckService<RedditClient, SqliteAlertRepository, WebhookService>;

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tattler=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> TattlerResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;

    match cli.command {
        Commands::Install => cmd_install(storage),
        Commands::Serve => cmd_serve(storage, &config),
        Commands::Run { test_mode, dry_run } => {
            cmd_run(storage, &config, CheckOptions { test_mode, dry_run })
        }
        Commands::Test { yes } => cmd_test(storage, &config, yes),
        Commands::Settings => cmd_settings(&config),
        Commands::Jobs => cmd_jobs(storage),
    }
}

fn build_checker(storage: SqliteStorage, config: &Config) -> TattlerResult<Checker> {
    let platform = Arc::new(RedditClient::new(config)?);
    Ok(CheckService::new(
        platform,
        SqliteAlertRepository::new(storage),
        WebhookService::new()?,
        &config.subreddit,
    ))
}

fn cmd_install(storage: SqliteStorage) -> TattlerResult<()> {
    let service = InstallService::new(
        SqliteJobRepository::new(storage.clone()),
        SqliteMigrationRepository::new(storage.clone()),
        SqliteAlertRepository::new(storage),
    );

    let report = service.on_install_or_upgrade()?;

    if report.cancelled_jobs > 0 {
        println!("Cancelled {} previously scheduled job(s).", report.cancelled_jobs);
    }
    println!("Scheduled {}", report.job.describe());
    if let Some(moved) = report.migrated_alerts {
        println!("Migrated {} legacy alert record(s).", moved);
    }

    Ok(())
}

/// Run one scheduled job by name
fn run_job(checker: &Checker, config: &Config, job: &ScheduledJob) -> TattlerResult<()> {
    if job.name != CHECK_FEEDS_JOB {
        return Err(TattlerError::Scheduler(format!("unknown job {}", job.name)));
    }

    let settings = AppSettings::load(&config.settings_path)?;
    let options = CheckOptions {
        test_mode: job.data.test_mode,
        dry_run: false,
    };
    checker.check_feeds(&settings, options, Utc::now())?;
    Ok(())
}

fn cmd_serve(storage: SqliteStorage, config: &Config) -> TattlerResult<()> {
    let scheduler = Scheduler::new(SqliteJobRepository::new(storage.clone()));

    if scheduler.jobs()?.is_empty() {
        println!("No jobs scheduled. Run `tattler install` first.");
        return Ok(());
    }

    let checker = build_checker(storage, config)?;
    println!("Watching trending feeds for /r/{}...", config.subreddit);

    scheduler.serve(|job| run_job(&checker, config, job))
}

fn cmd_run(storage: SqliteStorage, config: &Config, options: CheckOptions) -> TattlerResult<()> {
    let settings = AppSettings::load(&config.settings_path)?;
    let checker = build_checker(storage, config)?;

    println!("Checking feeds: {}\n", settings.feeds().join(", "));

    let report = checker.check_feeds(&settings, options, Utc::now())?;
    print_report(&report);

    Ok(())
}

fn print_report(report: &CycleReport) {
    match report.outcome {
        CycleOutcome::NoFeeds => println!("No feeds selected for monitoring."),
        CycleOutcome::NoActions => println!("No actions are set. Nothing to do."),
        CycleOutcome::NoMatches => println!("No posts found in trending feeds."),
        CycleOutcome::AlreadyAlerted => println!(
            "{} post(s) in trending feeds, all already handled.",
            report.matched
        ),
        CycleOutcome::DryRun | CycleOutcome::Dispatched => {
            for matched in &report.new_posts {
                let prefix = if report.outcome == CycleOutcome::DryRun {
                    "[DRY RUN] "
                } else {
                    ""
                };
                println!("  {}{} ({})", prefix, matched.post.title, matched.feed_list());
                println!("    {}", matched.post.url());
            }
            println!();

            if report.outcome == CycleOutcome::DryRun {
                println!(
                    "Dry run complete. Would alert {} post(s).",
                    report.new_posts.len()
                );
            } else {
                println!(
                    "Alerted {} post(s): {} action(s) done, {} skipped, {} failed.",
                    report.new_posts.len(),
                    report.dispatch.done,
                    report.dispatch.skipped,
                    report.dispatch.failed
                );
            }
        }
    }
}

fn confirm(prompt: &str) -> TattlerResult<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(input.eq_ignore_ascii_case("y") || input.eq_ignore_ascii_case("yes"))
}

fn cmd_test(storage: SqliteStorage, config: &Config, yes: bool) -> TattlerResult<()> {
    let settings = AppSettings::load(&config.settings_path)?;
    let platform = Arc::new(RedditClient::new(config)?);
    let service = TestModeService::new(platform, SqliteJobRepository::new(storage), &config.subreddit);

    let request = match service.request(&settings, yes, Utc::now())? {
        TestModeRequest::NeedsConfirmation { subscribers } => {
            println!(
                "/r/{} has {} subscribers. This will cause user-visible effects on your subreddit based on your configured options.",
                config.subreddit, subscribers
            );
            if !confirm("Continue?")? {
                println!("Cancelled.");
                return Ok(());
            }
            service.trigger(Utc::now())?
        }
        queued => queued,
    };

    if let TestModeRequest::Queued { job_id } = request {
        println!("{}", TEST_MODE_QUEUED_MESSAGE);
        println!("Queued job #{}; it runs on the next `tattler serve` tick.", job_id);
    }

    Ok(())
}

fn cmd_settings(config: &Config) -> TattlerResult<()> {
    let settings = match AppSettings::read(&config.settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            println!("Settings file {} could not be read: {}", config.settings_path, e);
            return Err(e);
        }
    };

    println!("Settings ({}):\n", config.settings_path);
    println!("  Subreddit: /r/{}", config.subreddit);
    println!("  Feeds: {}", settings.feeds().join(", "));
    println!("  Posts checked per feed: {}", settings.number_of_posts_to_check);
    println!("  Location: {} ({})", settings.location.label(), settings.location);
    println!("  Modmail: {}", settings.action_send_modmail);
    println!("  Report: {}", settings.action_report_post);
    println!("  Webhook: {}", settings.action_send_webhook);
    println!("  Flair: {:?}", settings.flair_mode);
    println!("  Sticky comment: {:?}", settings.sticky_comment_mode);
    println!();

    let problems = settings.problems();
    if problems.is_empty() {
        println!("Settings OK.");
    } else {
        println!("Problems:");
        for problem in &problems {
            println!("  ! {}", problem);
        }
    }

    Ok(())
}

fn cmd_jobs(storage: SqliteStorage) -> TattlerResult<()> {
    let scheduler = Scheduler::new(SqliteJobRepository::new(storage));
    let jobs = scheduler.jobs()?;

    if jobs.is_empty() {
        println!("No jobs scheduled.");
        return Ok(());
    }

    println!("Scheduled jobs:\n");
    for job in jobs {
        let id = job.id.map(|id| id.to_string()).unwrap_or_default();
        let last_run = job
            .last_run_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!("  #{} {}", id, job.describe());
        println!("    Last run: {}", last_run);
    }

    Ok(())
}
