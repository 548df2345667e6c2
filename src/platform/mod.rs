pub mod reddit;
pub mod traits;

pub use reddit::RedditClient;
pub use traits::Platform;

#[cfg(test)]
pub use traits::MockPlatform;
