use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::domain::{Comment, FlairRequest, FlairTemplate, Post, SubredditInfo};
use crate::errors::{TattlerError, TattlerResult};
use crate::platform::traits::Platform;
use crate::settings::HotPostLocation;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE_URL: &str = "https://oauth.reddit.com";

/// Listings return at most this many children per request
const MAX_PAGE_SIZE: u32 = 100;

/// Refresh the bearer token this long before it expires
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    after: Option<String>,
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    title: String,
    permalink: String,
    subreddit_id: String,
    subreddit: String,
    link_flair_text: Option<String>,
}

impl From<PostData> for Post {
    fn from(data: PostData) -> Self {
        Post {
            id: data.id,
            title: data.title,
            permalink: data.permalink,
            subreddit_id: data.subreddit_id,
            subreddit_name: data.subreddit,
            flair_text: data.link_flair_text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AboutData {
    name: String,
    display_name: String,
    #[serde(default)]
    subscribers: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MeData {
    name: String,
}

pub struct RedditClient {
    client: Client,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(config: &Config) -> TattlerResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: Mutex::new(None),
        })
    }

    /// Current bearer token, fetching a new one through the password grant when needed
    fn access_token(&self) -> TattlerResult<String> {
        let mut token = self
            .token
            .lock()
            .map_err(|_| TattlerError::Auth("token lock poisoned".to_string()))?;

        if let Some(current) = token.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        tracing::debug!(username = %self.username, "requesting access token");
        let response: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        let value = match (response.access_token, response.error) {
            (Some(value), _) => value,
            (None, Some(error)) => return Err(TattlerError::Auth(error)),
            (None, None) => return Err(TattlerError::Auth("no access token returned".to_string())),
        };

        let expires_in = Duration::from_secs(response.expires_in.unwrap_or(3600));
        *token = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + expires_in,
        });

        Ok(value)
    }

    fn check_status(response: Response) -> TattlerResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message: String = response
            .text()
            .unwrap_or_default()
            .chars()
            .take(300)
            .collect();

        Err(TattlerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> TattlerResult<T> {
        let token = self.access_token()?;
        let response = self
            .client
            .get(format!("{}{}", API_BASE_URL, path))
            .bearer_auth(token)
            .query(query)
            .send()?;

        Ok(Self::check_status(response)?.json()?)
    }

    fn post_form(&self, path: &str, form: &[(&str, String)]) -> TattlerResult<Value> {
        let token = self.access_token()?;
        let response = self
            .client
            .post(format!("{}{}", API_BASE_URL, path))
            .bearer_auth(token)
            .form(form)
            .send()?;

        let body: Value = Self::check_status(response)?.json()?;
        Self::check_api_errors(&body)?;
        Ok(body)
    }

    /// `api_type=json` endpoints report failures inside a 200 response
    fn check_api_errors(body: &Value) -> TattlerResult<()> {
        let errors = body
            .pointer("/json/errors")
            .and_then(Value::as_array)
            .filter(|errors| !errors.is_empty());

        match errors {
            Some(errors) => Err(TattlerError::Api {
                status: 200,
                message: Value::Array(errors.clone()).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Read up to `limit` posts, one page of at most `MAX_PAGE_SIZE` at a time,
    /// until the listing runs out
    fn paginate<F>(limit: u32, mut fetch_page: F) -> TattlerResult<Vec<Post>>
    where
        F: FnMut(u32, Option<&str>) -> TattlerResult<Listing<PostData>>,
    {
        let mut posts: Vec<Post> = Vec::new();
        let mut after: Option<String> = None;

        while (posts.len() as u32) < limit {
            let page_size = (limit - posts.len() as u32).min(MAX_PAGE_SIZE);
            let listing = fetch_page(page_size, after.as_deref())?;
            let (page, next) = Self::parse_posts(listing);
            if page.is_empty() {
                break;
            }
            posts.extend(page);

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        posts.truncate(limit as usize);
        Ok(posts)
    }

    fn parse_posts(listing: Listing<PostData>) -> (Vec<Post>, Option<String>) {
        let posts = listing
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .map(|thing| Post::from(thing.data))
            .collect();

        (posts, listing.data.after)
    }

    /// Top-level comments from the `[post listing, comment listing]` pair
    fn parse_comments(body: Vec<Listing<Value>>) -> Vec<Comment> {
        body.into_iter()
            .nth(1)
            .map(|listing| listing.data.children)
            .unwrap_or_default()
            .into_iter()
            .filter(|thing| thing.kind == "t1")
            .filter_map(|thing| {
                let id = thing.data.get("id")?.as_str()?.to_string();
                let stickied = thing
                    .data
                    .get("stickied")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Some(Comment { id, stickied })
            })
            .collect()
    }

    fn parse_new_comment(body: &Value) -> TattlerResult<Comment> {
        let id = body
            .pointer("/json/data/things/0/data/id")
            .and_then(Value::as_str)
            .ok_or_else(|| TattlerError::Api {
                status: 200,
                message: "comment response did not include the new comment".to_string(),
            })?;

        Ok(Comment {
            id: id.to_string(),
            stickied: false,
        })
    }
}

impl Platform for RedditClient {
    fn hot_posts(
        &self,
        feed: &str,
        limit: u32,
        location: &HotPostLocation,
    ) -> TattlerResult<Vec<Post>> {
        let path = format!("/r/{}/hot", feed);
        Self::paginate(limit, |page_size, after| {
            let mut query = vec![
                ("limit", page_size.to_string()),
                ("g", location.as_str().to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(cursor) = after {
                query.push(("after", cursor.to_string()));
            }
            self.get_json(&path, &query)
        })
    }

    fn subreddit_info(&self, name: &str) -> TattlerResult<SubredditInfo> {
        let about: Thing<AboutData> = self.get_json(&format!("/r/{}/about", name), &[])?;

        Ok(SubredditInfo {
            id: about.data.name,
            name: about.data.display_name,
            subscribers: about.data.subscribers.unwrap_or(0),
        })
    }

    fn app_username(&self) -> TattlerResult<String> {
        let me: MeData = self.get_json("/api/v1/me", &[])?;
        Ok(me.name)
    }

    fn send_modmail(
        &self,
        subreddit: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> TattlerResult<()> {
        self.post_form(
            "/api/mod/conversations",
            &[
                ("srName", subreddit.to_string()),
                ("to", to.to_string()),
                ("subject", subject.to_string()),
                ("body", body.to_string()),
                ("isAuthorHidden", "true".to_string()),
            ],
        )?;
        Ok(())
    }

    fn report(&self, post: &Post, reason: &str) -> TattlerResult<()> {
        self.post_form(
            "/api/report",
            &[
                ("api_type", "json".to_string()),
                ("thing_id", post.fullname()),
                ("reason", reason.to_string()),
            ],
        )?;
        Ok(())
    }

    fn flair_templates(&self, subreddit: &str) -> TattlerResult<Vec<FlairTemplate>> {
        self.get_json(&format!("/r/{}/api/link_flair_v2", subreddit), &[])
    }

    fn set_post_flair(&self, post: &Post, flair: &FlairRequest) -> TattlerResult<()> {
        let mut form = vec![("api_type", "json".to_string()), ("link", post.fullname())];
        if let Some(ref text) = flair.text {
            form.push(("text", text.clone()));
        }
        if let Some(ref css_class) = flair.css_class {
            form.push(("css_class", css_class.clone()));
        }

        let path = match flair.template_id {
            Some(ref template_id) => {
                form.push(("flair_template_id", template_id.clone()));
                format!("/r/{}/api/selectflair", post.subreddit_name)
            }
            None => format!("/r/{}/api/flair", post.subreddit_name),
        };

        self.post_form(&path, &form)?;
        Ok(())
    }

    fn post_comments(&self, post: &Post) -> TattlerResult<Vec<Comment>> {
        let body: Vec<Listing<Value>> = self.get_json(
            &format!("/comments/{}", post.id),
            &[
                ("depth", "1".to_string()),
                ("limit", "100".to_string()),
                ("raw_json", "1".to_string()),
            ],
        )?;
        Ok(Self::parse_comments(body))
    }

    fn add_comment(&self, post: &Post, text: &str) -> TattlerResult<Comment> {
        let body = self.post_form(
            "/api/comment",
            &[
                ("api_type", "json".to_string()),
                ("thing_id", post.fullname()),
                ("text", text.to_string()),
            ],
        )?;
        Self::parse_new_comment(&body)
    }

    fn distinguish_comment(&self, comment: &Comment, sticky: bool) -> TattlerResult<()> {
        self.post_form(
            "/api/distinguish",
            &[
                ("api_type", "json".to_string()),
                ("id", comment.fullname()),
                ("how", "yes".to_string()),
                ("sticky", sticky.to_string()),
            ],
        )?;
        Ok(())
    }
}
