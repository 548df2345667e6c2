use serde::{Deserialize, Serialize};

pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Base36 id without the `t3_` prefix
    pub id: String,
    pub title: String,
    /// Site-relative, e.g. `/r/rust/comments/abc123/title/`
    pub permalink: String,
    pub subreddit_id: String,
    pub subreddit_name: String,
    pub flair_text: Option<String>,
}

impl Post {
    pub fn new(id: &str, title: &str, subreddit_name: &str, subreddit_id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            permalink: format!("/r/{}/comments/{}/", subreddit_name, id),
            subreddit_id: subreddit_id.to_string(),
            subreddit_name: subreddit_name.to_string(),
            flair_text: None,
        }
    }

    pub fn with_flair_text(mut self, flair_text: Option<String>) -> Self {
        self.flair_text = flair_text;
        self
    }

    /// Fullname used by the API for things, e.g. `t3_abc123`
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }

    pub fn url(&self) -> String {
        format!("{}{}", REDDIT_BASE_URL, self.permalink)
    }

    pub fn has_flair_text(&self) -> bool {
        self.flair_text
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubredditInfo {
    /// Fullname, e.g. `t5_2qh1i`
    pub id: String,
    pub name: String,
    pub subscribers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlairTemplate {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Base36 id without the `t1_` prefix
    pub id: String,
    pub stickied: bool,
}

impl Comment {
    pub fn fullname(&self) -> String {
        format!("t1_{}", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlairRequest {
    pub text: Option<String>,
    pub css_class: Option<String>,
    pub template_id: Option<String>,
}

impl FlairRequest {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.css_class.is_none() && self.template_id.is_none()
    }
}
