use std::sync::Arc;

use rayon::prelude::*;

use crate::domain::digest::{self, MODMAIL_SUBJECT};
use crate::domain::{FlairRequest, MatchedPost, WebhookDigest};
use crate::errors::TattlerResult;
use crate::platform::Platform;
use crate::services::webhook_service::WebhookSender;
use crate::settings::{AppSettings, FlairMode, StickyCommentMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Modmail,
    Webhook,
    Report,
    Flair,
    StickyComment,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Modmail => "modmail",
            ActionKind::Webhook => "webhook",
            ActionKind::Report => "report",
            ActionKind::Flair => "flair",
            ActionKind::StickyComment => "sticky_comment",
        }
    }
}

/// One unit of work in the dispatch wave
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Digest covering every post
    Modmail,
    /// Digest covering every post
    Webhook,
    Report(&'a MatchedPost),
    Flair(&'a MatchedPost),
    StickyComment(&'a MatchedPost),
}

impl Action<'_> {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Modmail => ActionKind::Modmail,
            Action::Webhook => ActionKind::Webhook,
            Action::Report(_) => ActionKind::Report,
            Action::Flair(_) => ActionKind::Flair,
            Action::StickyComment(_) => ActionKind::StickyComment,
        }
    }

    fn post_id(&self) -> Option<&str> {
        match self {
            Action::Modmail | Action::Webhook => None,
            Action::Report(m) | Action::Flair(m) | Action::StickyComment(m) => Some(&m.post.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    Skipped(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fires the configured actions for newly trending posts
pub struct DispatchService<P: Platform, W: WebhookSender> {
    platform: Arc<P>,
    webhook: W,
    /// The operator's community, target of the modmail digest
    subreddit: String,
}

impl<P: Platform, W: WebhookSender> DispatchService<P, W> {
    pub fn new(platform: Arc<P>, webhook: W, subreddit: &str) -> Self {
        Self {
            platform,
            webhook,
            subreddit: subreddit.to_string(),
        }
    }

    /// Every action the settings call for, digests first
    pub fn plan<'a>(settings: &AppSettings, posts: &'a [MatchedPost]) -> Vec<Action<'a>> {
        let mut actions = Vec::new();
        if posts.is_empty() {
            return actions;
        }

        if settings.action_send_modmail {
            actions.push(Action::Modmail);
        }
        if settings.action_send_webhook && settings.webhook_url().is_some() {
            actions.push(Action::Webhook);
        }

        for matched in posts {
            if settings.action_report_post {
                actions.push(Action::Report(matched));
            }
            if settings.flair_mode != FlairMode::None {
                actions.push(Action::Flair(matched));
            }
            if settings.sticky_comment_mode != StickyCommentMode::None {
                actions.push(Action::StickyComment(matched));
            }
        }

        actions
    }

    /// Run all actions concurrently. Failures are logged and counted, never raised.
    pub fn dispatch(&self, settings: &AppSettings, posts: &[MatchedPost]) -> DispatchReport {
        let actions = Self::plan(settings, posts);

        let outcomes: Vec<(Action<'_>, TattlerResult<ActionOutcome>)> = actions
            .par_iter()
            .map(|action| (*action, self.execute(settings, posts, action)))
            .collect();

        let mut report = DispatchReport::default();
        for (action, outcome) in outcomes {
            let kind = action.kind().as_str();
            let post_id = action.post_id().unwrap_or("-");
            match outcome {
                Ok(ActionOutcome::Done) => {
                    report.done += 1;
                    tracing::info!(action = kind, post_id, "action completed");
                }
                Ok(ActionOutcome::Skipped(reason)) => {
                    report.skipped += 1;
                    tracing::info!(action = kind, post_id, reason, "action skipped");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(action = kind, post_id, error = %e, "action failed");
                }
            }
        }

        report
    }

    pub fn execute(
        &self,
        settings: &AppSettings,
        posts: &[MatchedPost],
        action: &Action<'_>,
    ) -> TattlerResult<ActionOutcome> {
        match action {
            Action::Modmail => self.send_modmail(posts),
            Action::Webhook => self.send_webhook(settings, posts),
            Action::Report(matched) => self.report(matched),
            Action::Flair(matched) => self.set_flair(settings, matched),
            Action::StickyComment(matched) => self.add_sticky_comment(settings, matched),
        }
    }

    fn send_modmail(&self, posts: &[MatchedPost]) -> TattlerResult<ActionOutcome> {
        if posts.is_empty() {
            return Ok(ActionOutcome::Skipped("no posts"));
        }

        let username = self.platform.app_username()?;
        self.platform.send_modmail(
            &self.subreddit,
            &username,
            MODMAIL_SUBJECT,
            &digest::modmail_body(posts),
        )?;
        Ok(ActionOutcome::Done)
    }

    fn send_webhook(&self, settings: &AppSettings, posts: &[MatchedPost]) -> TattlerResult<ActionOutcome> {
        let Some(webhook_url) = settings.webhook_url() else {
            return Ok(ActionOutcome::Skipped("no webhook URL"));
        };
        if posts.is_empty() {
            return Ok(ActionOutcome::Skipped("no posts"));
        }

        let digest = WebhookDigest::new(webhook_url, settings.webhook_suppress_embeds, posts);
        self.webhook.send(webhook_url, &digest.payload())?;
        Ok(ActionOutcome::Done)
    }

    fn report(&self, matched: &MatchedPost) -> TattlerResult<ActionOutcome> {
        self.platform
            .report(&matched.post, &digest::report_reason(matched))?;
        Ok(ActionOutcome::Done)
    }

    fn set_flair(&self, settings: &AppSettings, matched: &MatchedPost) -> TattlerResult<ActionOutcome> {
        match settings.flair_mode {
            FlairMode::None => return Ok(ActionOutcome::Skipped("flair disabled")),
            FlairMode::Set if matched.post.has_flair_text() => {
                return Ok(ActionOutcome::Skipped("post already has flair"))
            }
            FlairMode::Set | FlairMode::Overwrite => {}
        }

        let template_id = match settings.flair_template_id() {
            Some(template_id) => {
                let templates = self.platform.flair_templates(&matched.post.subreddit_name)?;
                if templates.iter().any(|t| t.id == template_id) {
                    Some(template_id.to_string())
                } else {
                    tracing::warn!(template_id, "flair template not found on subreddit, ignoring it");
                    None
                }
            }
            None => None,
        };

        let request = FlairRequest {
            text: settings.flair_text().map(str::to_string),
            css_class: settings.flair_css_class().map(str::to_string),
            template_id,
        };
        if request.is_empty() {
            return Ok(ActionOutcome::Skipped("no flair text, class or template"));
        }

        self.platform.set_post_flair(&matched.post, &request)?;
        Ok(ActionOutcome::Done)
    }

    fn add_sticky_comment(
        &self,
        settings: &AppSettings,
        matched: &MatchedPost,
    ) -> TattlerResult<ActionOutcome> {
        match settings.sticky_comment_mode {
            StickyCommentMode::None => return Ok(ActionOutcome::Skipped("sticky comment disabled")),
            StickyCommentMode::AddIfNone | StickyCommentMode::AddAlways => {}
        }

        let Some(content) = settings.sticky_comment_text() else {
            return Ok(ActionOutcome::Skipped("no sticky comment text"));
        };

        if settings.sticky_comment_mode == StickyCommentMode::AddIfNone {
            let comments = self.platform.post_comments(&matched.post)?;
            if comments.iter().any(|c| c.stickied) {
                return Ok(ActionOutcome::Skipped("post already has a sticky comment"));
            }
        }

        let body = digest::sticky_comment_body(content, &matched.post);
        let comment = self.platform.add_comment(&matched.post, &body)?;
        self.platform.distinguish_comment(&comment, true)?;
        Ok(ActionOutcome::Done)
    }
}
