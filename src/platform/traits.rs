use crate::domain::{Comment, FlairRequest, FlairTemplate, Post, SubredditInfo};
use crate::errors::TattlerResult;
use crate::settings::HotPostLocation;

/// The social platform the bot moderates on
#[cfg_attr(test, mockall::automock)]
pub trait Platform: Send + Sync {
    /// Up to `limit` posts from the feed's "hot" ranking
    fn hot_posts(
        &self,
        feed: &str,
        limit: u32,
        location: &HotPostLocation,
    ) -> TattlerResult<Vec<Post>>;

    fn subreddit_info(&self, name: &str) -> TattlerResult<SubredditInfo>;

    /// Username of the account the bot acts as
    fn app_username(&self) -> TattlerResult<String>;

    fn send_modmail(
        &self,
        subreddit: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> TattlerResult<()>;

    fn report(&self, post: &Post, reason: &str) -> TattlerResult<()>;

    fn flair_templates(&self, subreddit: &str) -> TattlerResult<Vec<FlairTemplate>>;

    fn set_post_flair(&self, post: &Post, flair: &FlairRequest) -> TattlerResult<()>;

    /// Top-level comments of a post
    fn post_comments(&self, post: &Post) -> TattlerResult<Vec<Comment>>;

    fn add_comment(&self, post: &Post, text: &str) -> TattlerResult<Comment>;

    /// Mark a comment as made by a moderator, optionally pinning it
    fn distinguish_comment(&self, comment: &Comment, sticky: bool) -> TattlerResult<()>;
}
