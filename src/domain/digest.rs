use serde::Serialize;
use url::Url;

use super::{MatchedPost, Post};

pub const MODMAIL_SUBJECT: &str = "Notification of posts on trending feeds";

/// Single modmail listing every newly trending post
pub fn modmail_body(posts: &[MatchedPost]) -> String {
    let mut message = "Here are the posts that are newly showing in trending feeds:\n\n".to_string();

    for matched in posts {
        message.push_str(&format!(
            "* [{}]({}) ({})\n",
            matched.post.title,
            matched.post.permalink,
            matched.feed_list()
        ));
    }

    message
}

pub fn report_reason(matched: &MatchedPost) -> String {
    format!(
        "This post is trending! It is currently in these feeds: {}",
        matched.feed_list()
    )
}

/// Operator text plus the automated-action disclosure
pub fn sticky_comment_body(content: &str, post: &Post) -> String {
    format!(
        "{}\n\n*I am a bot, and this action was performed automatically. Please [contact the moderators of this subreddit](/message/compose/?to=/r/{}) if you have any questions or concerns.*",
        content.trim(),
        post.subreddit_name
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    /// Payload carries the message in `content`
    Discord,
    /// Payload carries the message in `text`
    Slack,
}

impl WebhookKind {
    pub fn from_url(webhook_url: &str) -> Self {
        let host = Url::parse(webhook_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()));

        match host {
            Some(host) if host == "discord.com" || host.ends_with(".discord.com") => {
                WebhookKind::Discord
            }
            Some(_) => WebhookKind::Slack,
            None if webhook_url.contains("discord.com") => WebhookKind::Discord,
            None => WebhookKind::Slack,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    Content { content: String },
    Text { text: String },
}

/// Digest message for a chat webhook
#[derive(Debug, Clone)]
pub struct WebhookDigest {
    pub kind: WebhookKind,
    pub message: String,
}

impl WebhookDigest {
    pub fn new(webhook_url: &str, suppress_embeds: bool, posts: &[MatchedPost]) -> Self {
        let kind = WebhookKind::from_url(webhook_url);
        let mut message = "There are posts newly showing in trending feeds!\n".to_string();

        for matched in posts {
            let url = matched.post.url();
            let line = match kind {
                WebhookKind::Slack => format!("* <{}|{}>", url, matched.post.title),
                // Angle brackets stop Discord from rendering a link preview
                WebhookKind::Discord if suppress_embeds => {
                    format!("* [{}](<{}>)", matched.post.title, url)
                }
                WebhookKind::Discord => format!("* [{}]({})", matched.post.title, url),
            };
            message.push_str(&format!("{} ({})\n", line, matched.feed_list()));
        }

        Self { kind, message }
    }

    pub fn payload(&self) -> WebhookPayload {
        match self.kind {
            WebhookKind::Discord => WebhookPayload::Content {
                content: self.message.clone(),
            },
            WebhookKind::Slack => WebhookPayload::Text {
                text: self.message.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched() -> MatchedPost {
        let mut matched = MatchedPost::new(Post::new("p1", "Big News", "mysub", "t5_x"), "all");
        matched.add_feed("popular");
        matched
    }

    #[test]
    fn test_modmail_body_lists_post_once_with_all_feeds() {
        let body = modmail_body(&[matched()]);
        assert_eq!(
            body,
            "Here are the posts that are newly showing in trending feeds:\n\n* [Big News](/r/mysub/comments/p1/) (/r/all, /r/popular)\n"
        );
    }

    #[test]
    fn test_report_reason_cites_feeds() {
        assert_eq!(
            report_reason(&matched()),
            "This post is trending! It is currently in these feeds: /r/all, /r/popular"
        );
    }

    #[test]
    fn test_sticky_comment_body_appends_disclosure() {
        let post = Post::new("p1", "Big News", "mysub", "t5_x");
        let body = sticky_comment_body("  Welcome, visitors!\n", &post);
        assert!(body.starts_with("Welcome, visitors!\n\n*I am a bot"));
        assert!(body.contains("/message/compose/?to=/r/mysub"));
    }

    #[test]
    fn test_webhook_kind_from_url() {
        assert_eq!(
            WebhookKind::from_url("https://discord.com/api/webhooks/1/abc"),
            WebhookKind::Discord
        );
        assert_eq!(
            WebhookKind::from_url("https://hooks.slack.com/services/T/B/X"),
            WebhookKind::Slack
        );
    }

    #[test]
    fn test_discord_payload_uses_content_field() {
        let digest = WebhookDigest::new("https://discord.com/api/webhooks/1/abc", false, &[matched()]);
        let json = serde_json::to_value(digest.payload()).unwrap();
        assert!(json.get("content").is_some());
        assert!(json.get("text").is_none());
        assert!(digest
            .message
            .contains("* [Big News](https://www.reddit.com/r/mysub/comments/p1/) (/r/all, /r/popular)"));
    }

    #[test]
    fn test_slack_payload_uses_text_field() {
        let digest = WebhookDigest::new("https://hooks.slack.com/services/T/B/X", true, &[matched()]);
        let json = serde_json::to_value(digest.payload()).unwrap();
        assert!(json.get("text").is_some());
        assert!(json.get("content").is_none());
        // Suppressing embeds only applies to Discord
        assert!(!digest.message.contains("(<"));
    }

    #[test]
    fn test_suppressed_embeds_wrap_links() {
        let digest = WebhookDigest::new("https://discord.com/api/webhooks/1/abc", true, &[matched()]);
        assert!(digest
            .message
            .contains("[Big News](<https://www.reddit.com/r/mysub/comments/p1/>)"));
    }
}
