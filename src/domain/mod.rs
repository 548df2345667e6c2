pub mod digest;
pub mod job;
pub mod matched_post;
pub mod post;

pub use digest::{WebhookDigest, WebhookKind, WebhookPayload};
pub use job::{JobData, JobSchedule, ScheduledJob, CHECK_FEEDS_JOB};
pub use matched_post::{FeedResult, MatchedPost, TEST_MODE_FEED};
pub use post::{Comment, FlairRequest, FlairTemplate, Post, SubredditInfo};
