use std::sync::Arc;

use rand::seq::IndexedRandom;
use rayon::prelude::*;

use crate::domain::{FeedResult, MatchedPost, Post};
use crate::errors::{TattlerError, TattlerResult};
use crate::platform::Platform;
use crate::settings::HotPostLocation;

/// How many of the community's own hot posts test mode picks from
const TEST_MODE_SAMPLE_SIZE: u32 = 100;

/// Queries trending feeds and narrows them down to the operator's community
pub struct PollService<P: Platform> {
    platform: Arc<P>,
}

impl<P: Platform> PollService<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// Current top `limit` posts of one feed, each tagged with the feed name
    pub fn fetch_feed(
        &self,
        feed: &str,
        limit: u32,
        location: &HotPostLocation,
    ) -> TattlerResult<Vec<FeedResult>> {
        let posts = self
            .platform
            .hot_posts(feed, limit, location)
            .map_err(|e| TattlerError::FeedQuery {
                feed: feed.to_string(),
                source: Box::new(e),
            })?;

        Ok(posts
            .into_iter()
            .map(|post| FeedResult::new(post, feed))
            .collect())
    }

    /// Query every feed concurrently; results keep the order of `feeds`
    pub fn poll(
        &self,
        feeds: &[String],
        limit: u32,
        location: &HotPostLocation,
    ) -> Vec<(String, TattlerResult<Vec<FeedResult>>)> {
        feeds
            .par_iter()
            .map(|feed| (feed.clone(), self.fetch_feed(feed, limit, location)))
            .collect()
    }

    /// Poll and aggregate. Fails only when no feed could be read at all.
    pub fn find_matches(
        &self,
        feeds: &[String],
        limit: u32,
        location: &HotPostLocation,
        own_subreddit_id: &str,
    ) -> TattlerResult<Vec<MatchedPost>> {
        let mut all_results = Vec::new();
        let mut failures = 0;

        for (feed, result) in self.poll(feeds, limit, location) {
            match result {
                Ok(results) => {
                    tracing::debug!(feed = %feed, posts = results.len(), "feed loaded");
                    all_results.extend(results);
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(feed = %feed, error = %e, "failed to load feed");
                }
            }
        }

        if !feeds.is_empty() && failures == feeds.len() {
            return Err(TattlerError::AllFeedsFailed);
        }

        Ok(Self::aggregate(all_results, own_subreddit_id))
    }

    /// Keep only the community's posts, merging repeats into one match per post
    pub fn aggregate(results: Vec<FeedResult>, own_subreddit_id: &str) -> Vec<MatchedPost> {
        let mut matches: Vec<MatchedPost> = Vec::new();

        for result in results
            .into_iter()
            .filter(|r| r.post.subreddit_id == own_subreddit_id)
        {
            Self::merge(&mut matches, result);
        }

        matches
    }

    /// First sighting creates the match, later ones append their feed
    pub fn merge(matches: &mut Vec<MatchedPost>, result: FeedResult) {
        match matches.iter_mut().find(|m| m.post.id == result.post.id) {
            Some(existing) => existing.add_feed(&result.feed),
            None => matches.push(MatchedPost::new(result.post, &result.feed)),
        }
    }

    /// A random hot post of the community, used to preview actions
    pub fn random_own_post(&self, subreddit: &str) -> TattlerResult<Option<Post>> {
        let posts = self.platform.hot_posts(
            subreddit,
            TEST_MODE_SAMPLE_SIZE,
            &HotPostLocation::global(),
        )?;

        Ok(posts.choose(&mut rand::rng()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TEST_MODE_FEED;
    use crate::platform::MockPlatform;
    use mockall::predicate::eq;

    const OWN_ID: &str = "t5_own";

    fn own_post(id: &str) -> Post {
        Post::new(id, &format!("Post {}", id), "mysub", OWN_ID)
    }

    fn other_post(id: &str) -> Post {
        Post::new(id, &format!("Other {}", id), "elsewhere", "t5_other")
    }

    #[test]
    fn test_aggregate_merges_feeds_for_same_post() {
        let results = vec![
            FeedResult::new(own_post("p1"), "all"),
            FeedResult::new(other_post("x1"), "all"),
            FeedResult::new(own_post("p2"), "popular"),
            FeedResult::new(own_post("p1"), "popular"),
        ];

        let matches = PollService::<MockPlatform>::aggregate(results, OWN_ID);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].post.id, "p1");
        assert_eq!(matches[0].feeds(), &["all".to_string(), "popular".to_string()]);
        assert_eq!(matches[1].post.id, "p2");
        assert_eq!(matches[1].feeds(), &["popular".to_string()]);
    }

    #[test]
    fn test_aggregate_never_duplicates_feed_names() {
        let results = vec![
            FeedResult::new(own_post("p1"), "all"),
            FeedResult::new(own_post("p1"), "all"),
            FeedResult::new(own_post("p1"), "popular"),
            FeedResult::new(own_post("p1"), "all"),
        ];

        let matches = PollService::<MockPlatform>::aggregate(results, OWN_ID);
        assert_eq!(matches[0].feeds(), &["all".to_string(), "popular".to_string()]);
    }

    #[test]
    fn test_aggregate_discards_other_communities() {
        let results = vec![FeedResult::new(other_post("x1"), "all")];
        assert!(PollService::<MockPlatform>::aggregate(results, OWN_ID).is_empty());
    }

    #[test]
    fn test_merge_appends_test_feed_to_genuine_match() {
        let mut matches = vec![MatchedPost::new(own_post("p1"), "all")];
        PollService::<MockPlatform>::merge(&mut matches, FeedResult::new(own_post("p1"), TEST_MODE_FEED));

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].feeds(), &["all".to_string(), TEST_MODE_FEED.to_string()]);
    }

    #[test]
    fn test_find_matches_across_feeds() {
        let mut platform = MockPlatform::new();
        platform
            .expect_hot_posts()
            .with(eq("all"), eq(100), eq(HotPostLocation::global()))
            .returning(|_, _, _| Ok(vec![other_post("x1"), own_post("p1")]));
        platform
            .expect_hot_posts()
            .with(eq("popular"), eq(100), eq(HotPostLocation::global()))
            .returning(|_, _, _| Ok(vec![own_post("p1")]));

        let service = PollService::new(Arc::new(platform));
        let feeds = vec!["all".to_string(), "popular".to_string()];
        let matches = service
            .find_matches(&feeds, 100, &HotPostLocation::global(), OWN_ID)
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].feed_list(), "/r/all, /r/popular");
    }

    #[test]
    fn test_one_failing_feed_does_not_hide_the_others() {
        let mut platform = MockPlatform::new();
        platform
            .expect_hot_posts()
            .with(eq("all"), eq(25), eq(HotPostLocation::global()))
            .returning(|_, _, _| {
                Err(TattlerError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            });
        platform
            .expect_hot_posts()
            .with(eq("popular"), eq(25), eq(HotPostLocation::global()))
            .returning(|_, _, _| Ok(vec![own_post("p1")]));

        let service = PollService::new(Arc::new(platform));
        let feeds = vec!["all".to_string(), "popular".to_string()];

        let polled = service.poll(&feeds, 25, &HotPostLocation::global());
        assert!(matches!(
            &polled[0],
            (feed, Err(TattlerError::FeedQuery { .. })) if feed == "all"
        ));

        let matches = service
            .find_matches(&feeds, 25, &HotPostLocation::global(), OWN_ID)
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].feeds(), &["popular".to_string()]);
    }

    #[test]
    fn test_all_feeds_failing_is_an_error() {
        let mut platform = MockPlatform::new();
        platform.expect_hot_posts().returning(|_, _, _| {
            Err(TattlerError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let service = PollService::new(Arc::new(platform));
        let feeds = vec!["all".to_string(), "popular".to_string()];
        let result = service.find_matches(&feeds, 100, &HotPostLocation::global(), OWN_ID);

        assert!(matches!(result, Err(TattlerError::AllFeedsFailed)));
    }

    #[test]
    fn test_random_own_post() {
        let mut platform = MockPlatform::new();
        platform
            .expect_hot_posts()
            .with(eq("mysub"), eq(100), eq(HotPostLocation::global()))
            .returning(|_, _, _| Ok(vec![own_post("p1"), own_post("p2")]));

        let service = PollService::new(Arc::new(platform));
        let post = service.random_own_post("mysub").unwrap().unwrap();
        assert!(post.id == "p1" || post.id == "p2");
    }

    #[test]
    fn test_random_own_post_empty_subreddit() {
        let mut platform = MockPlatform::new();
        platform.expect_hot_posts().returning(|_, _, _| Ok(vec![]));

        let service = PollService::new(Arc::new(platform));
        assert!(service.random_own_post("mysub").unwrap().is_none());
    }
}
