use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{FeedResult, MatchedPost, TEST_MODE_FEED};
use crate::errors::TattlerResult;
use crate::platform::Platform;
use crate::services::alert_service::AlertService;
use crate::services::dispatch_service::{DispatchReport, DispatchService};
use crate::services::poll_service::PollService;
use crate::services::webhook_service::WebhookSender;
use crate::settings::AppSettings;
use crate::storage::traits::AlertRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Inject a random post of the community as if it were trending
    pub test_mode: bool,
    /// Match and filter only, no actions and no records
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NoFeeds,
    NoActions,
    NoMatches,
    AlreadyAlerted,
    DryRun,
    Dispatched,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub matched: usize,
    pub new_posts: Vec<MatchedPost>,
    pub dispatch: DispatchReport,
    pub recorded: usize,
}

impl CycleReport {
    fn early(outcome: CycleOutcome, matched: usize) -> Self {
        Self {
            outcome,
            matched,
            new_posts: Vec::new(),
            dispatch: DispatchReport::default(),
            recorded: 0,
        }
    }
}

/// One complete poll, filter and dispatch cycle
pub struct CheckService<P: Platform, A: AlertRepository, W: WebhookSender> {
    platform: Arc<P>,
    poller: PollService<P>,
    alerts: AlertService<A>,
    dispatcher: DispatchService<P, W>,
    subreddit: String,
}

impl<P: Platform, A: AlertRepository, W: WebhookSender> CheckService<P, A, W> {
    pub fn new(platform: Arc<P>, alert_repository: A, webhook: W, subreddit: &str) -> Self {
        Self {
            poller: PollService::new(platform.clone()),
            alerts: AlertService::new(alert_repository),
            dispatcher: DispatchService::new(platform.clone(), webhook, subreddit),
            platform,
            subreddit: subreddit.to_string(),
        }
    }

    pub fn check_feeds(
        &self,
        settings: &AppSettings,
        options: CheckOptions,
        now: DateTime<Utc>,
    ) -> TattlerResult<CycleReport> {
        let feeds = settings.feeds();
        if feeds.is_empty() {
            tracing::info!("No feeds selected for monitoring");
            return Ok(CycleReport::early(CycleOutcome::NoFeeds, 0));
        }

        if !settings.any_action_enabled() {
            tracing::info!("No actions are set, not checking for trending posts");
            return Ok(CycleReport::early(CycleOutcome::NoActions, 0));
        }

        self.alerts.purge(now)?;

        let own = self.platform.subreddit_info(&self.subreddit)?;
        let mut matches = self.poller.find_matches(
            &feeds,
            settings.number_of_posts_to_check,
            &settings.location,
            &own.id,
        )?;

        if options.test_mode {
            self.inject_test_post(&mut matches, &own.name);
        }

        if matches.is_empty() {
            tracing::info!("No posts found in trending feeds");
            return Ok(CycleReport::early(CycleOutcome::NoMatches, 0));
        }

        let matched = matches.len();
        let new_posts = self.alerts.filter_unalerted(matches, now)?;
        if new_posts.is_empty() {
            tracing::info!(matched, "Posts are in trending feeds but have already been handled");
            return Ok(CycleReport::early(CycleOutcome::AlreadyAlerted, matched));
        }

        tracing::info!(count = new_posts.len(), "Posts newly in trending feeds");

        if options.dry_run {
            return Ok(CycleReport {
                outcome: CycleOutcome::DryRun,
                matched,
                new_posts,
                dispatch: DispatchReport::default(),
                recorded: 0,
            });
        }

        let dispatch = self.dispatcher.dispatch(settings, &new_posts);
        let recorded = self.alerts.record(&new_posts, now)?;

        tracing::info!(
            done = dispatch.done,
            skipped = dispatch.skipped,
            failed = dispatch.failed,
            recorded,
            "Cycle complete"
        );

        Ok(CycleReport {
            outcome: CycleOutcome::Dispatched,
            matched,
            new_posts,
            dispatch,
            recorded,
        })
    }

    /// Treat a random community post as trending in the sentinel feed
    fn inject_test_post(&self, matches: &mut Vec<MatchedPost>, own_subreddit: &str) {
        match self.poller.random_own_post(own_subreddit) {
            Ok(Some(post)) => {
                tracing::info!(post_id = %post.id, "Test mode: treating post as trending");
                PollService::<P>::merge(matches, FeedResult::new(post, TEST_MODE_FEED));
            }
            Ok(None) => tracing::warn!("Test mode: the subreddit has no posts to use"),
            Err(e) => tracing::error!(error = %e, "Test mode: could not pick a post"),
        }
    }
}
