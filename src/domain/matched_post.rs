use super::Post;

/// Feed name given to the synthetic match injected by test mode
pub const TEST_MODE_FEED: &str = "testing";

/// One post seen in one feed during a single poll
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResult {
    pub post: Post,
    pub feed: String,
}

impl FeedResult {
    pub fn new(post: Post, feed: &str) -> Self {
        Self {
            post,
            feed: feed.to_string(),
        }
    }
}

/// A post of the operator's community together with every feed it was found in
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPost {
    pub post: Post,
    feeds: Vec<String>,
}

impl MatchedPost {
    pub fn new(post: Post, feed: &str) -> Self {
        Self {
            post,
            feeds: vec![feed.to_string()],
        }
    }

    /// Feeds in first-seen order, without duplicates
    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    pub fn add_feed(&mut self, feed: &str) {
        if !self.feeds.iter().any(|f| f == feed) {
            self.feeds.push(feed.to_string());
        }
    }

    /// True unless the only reason this post matched is test mode
    pub fn is_genuine(&self) -> bool {
        self.feeds.iter().any(|f| f != TEST_MODE_FEED)
    }

    /// `/r/all, /r/popular`
    pub fn feed_list(&self) -> String {
        self.feeds
            .iter()
            .map(|f| format!("/r/{}", f))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
