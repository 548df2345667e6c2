//! Per-cycle app settings, read from a TOML file at the start of every check.

mod location;

pub use location::HotPostLocation;

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{TattlerError, TattlerResult};

pub const MIN_POSTS_TO_CHECK: u32 = 1;
pub const MAX_POSTS_TO_CHECK: u32 = 200;

fn webhook_regex() -> &'static Regex {
    static WEBHOOK: OnceLock<Regex> = OnceLock::new();
    WEBHOOK.get_or_init(|| {
        Regex::new(r"^https://(?:discord\.com/api/webhooks/|hooks\.slack\.com/services)")
            .expect("webhook pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlairMode {
    #[default]
    None,
    /// Only flair posts that have no flair text yet
    Set,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickyCommentMode {
    #[default]
    None,
    AddIfNone,
    AddAlways,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub feeds_to_monitor: Vec<String>,
    pub number_of_posts_to_check: u32,
    pub location: HotPostLocation,

    pub action_send_modmail: bool,
    pub action_report_post: bool,

    pub action_send_webhook: bool,
    pub webhook_url: Option<String>,
    pub webhook_suppress_embeds: bool,

    pub flair_mode: FlairMode,
    pub flair_text: Option<String>,
    pub flair_css_class: Option<String>,
    pub flair_template_id: Option<String>,

    pub sticky_comment_mode: StickyCommentMode,
    pub sticky_comment_text: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            feeds_to_monitor: vec!["all".to_string()],
            number_of_posts_to_check: 100,
            location: HotPostLocation::global(),
            action_send_modmail: true,
            action_report_post: false,
            action_send_webhook: false,
            webhook_url: None,
            webhook_suppress_embeds: false,
            flair_mode: FlairMode::None,
            flair_text: None,
            flair_css_class: None,
            flair_template_id: None,
            sticky_comment_mode: StickyCommentMode::None,
            sticky_comment_text: None,
        }
    }
}

/// Treat empty and whitespace-only strings as "not provided"
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl AppSettings {
    /// Load and validate settings. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> TattlerResult<Self> {
        let settings = Self::read(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse the settings file without validating it
    pub fn read<P: AsRef<Path>>(path: P) -> TattlerResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> TattlerResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fail on the first problem that would make a cycle misbehave
    pub fn validate(&self) -> TattlerResult<()> {
        if !(MIN_POSTS_TO_CHECK..=MAX_POSTS_TO_CHECK).contains(&self.number_of_posts_to_check) {
            return Err(TattlerError::InvalidSettings(format!(
                "number_of_posts_to_check must be between {} and {}",
                MIN_POSTS_TO_CHECK, MAX_POSTS_TO_CHECK
            )));
        }

        if let Some(url) = self.webhook_url() {
            if !webhook_regex().is_match(url) {
                return Err(TattlerError::InvalidSettings(
                    "webhook_url must be a Discord or Slack webhook URL".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Every problem worth showing an operator, including soft ones
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.feeds().is_empty() {
            problems.push("You must select at least one feed to monitor".to_string());
        }
        if let Err(e) = self.validate() {
            problems.push(e.to_string());
        }
        if self.action_send_webhook && self.webhook_url().is_none() {
            problems.push("action_send_webhook is on but no webhook_url is set".to_string());
        }
        if self.sticky_comment_mode != StickyCommentMode::None
            && self.sticky_comment_text().is_none()
        {
            problems.push("sticky_comment_mode is on but sticky_comment_text is empty".to_string());
        }
        if !self.any_action_enabled() {
            problems.push("No actions are enabled".to_string());
        }

        problems
    }

    /// Monitored feed names with blanks and duplicates removed, order preserved
    pub fn feeds(&self) -> Vec<String> {
        let mut feeds: Vec<String> = Vec::new();
        for feed in &self.feeds_to_monitor {
            let feed = feed.trim().trim_start_matches("/r/").trim_start_matches("r/");
            if !feed.is_empty() && !feeds.iter().any(|f| f.eq_ignore_ascii_case(feed)) {
                feeds.push(feed.to_string());
            }
        }
        feeds
    }

    pub fn webhook_url(&self) -> Option<&str> {
        non_empty(&self.webhook_url)
    }

    pub fn flair_text(&self) -> Option<&str> {
        non_empty(&self.flair_text)
    }

    pub fn flair_css_class(&self) -> Option<&str> {
        non_empty(&self.flair_css_class)
    }

    pub fn flair_template_id(&self) -> Option<&str> {
        non_empty(&self.flair_template_id)
    }

    pub fn sticky_comment_text(&self) -> Option<&str> {
        non_empty(&self.sticky_comment_text)
    }

    pub fn any_action_enabled(&self) -> bool {
        self.action_send_modmail
            || self.action_send_webhook
            || self.action_report_post
            || self.flair_mode != FlairMode::None
            || self.sticky_comment_mode != StickyCommentMode::None
    }

    /// Actions whose effects ordinary users can see on the subreddit
    pub fn has_user_visible_actions(&self) -> bool {
        self.flair_mode != FlairMode::None || self.sticky_comment_mode != StickyCommentMode::None
    }
}
