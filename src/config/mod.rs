use crate::errors::{TattlerError, TattlerResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    /// The operator's own community; only its posts are ever matched.
    pub subreddit: String,
    pub user_agent: String,
    pub db_path: String,
    pub settings_path: String,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    fn required(name: &str) -> TattlerResult<String> {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| TattlerError::MissingEnvVar(name.to_string()))
    }

    /// Path to `file_name` beside the executable, or in the working directory
    fn beside_exe(exe_dir: &Option<std::path::PathBuf>, file_name: &str) -> String {
        exe_dir
            .as_ref()
            .map(|d| d.join(file_name).to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("./{}", file_name))
    }

    /// Bare community name from `name`, `r/name` or `/r/name/`
    fn subreddit_name(raw: &str) -> TattlerResult<String> {
        let name = raw
            .trim()
            .trim_start_matches("/r/")
            .trim_start_matches("r/")
            .trim_end_matches('/');

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TattlerError::Config(format!(
                "REDDIT_SUBREDDIT is not a valid subreddit name: {}",
                raw
            )));
        }

        Ok(name.to_string())
    }

    pub fn from_env() -> TattlerResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let client_id = Self::required("REDDIT_CLIENT_ID")?;
        let client_secret = Self::required("REDDIT_CLIENT_SECRET")?;
        let username = Self::required("REDDIT_USERNAME")?;
        let password = Self::required("REDDIT_PASSWORD")?;

        let subreddit = Self::subreddit_name(&Self::required("REDDIT_SUBREDDIT")?)?;

        let user_agent = std::env::var("REDDIT_USER_AGENT").unwrap_or_else(|_| {
            format!("tattler/{} (by /u/{})", env!("CARGO_PKG_VERSION"), username)
        });

        let db_path = std::env::var("TATTLER_DB_PATH")
            .unwrap_or_else(|_| Self::beside_exe(&exe_dir, "tattler.db"));

        let settings_path = std::env::var("TATTLER_SETTINGS_PATH")
            .unwrap_or_else(|_| Self::beside_exe(&exe_dir, "settings.toml"));

        Ok(Self {
            client_id,
            client_secret,
            username,
            password,
            subreddit,
            user_agent,
            db_path,
            settings_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subreddit_name_strips_prefixes() {
        assert_eq!(Config::subreddit_name("mysub").unwrap(), "mysub");
        assert_eq!(Config::subreddit_name("r/mysub").unwrap(), "mysub");
        assert_eq!(Config::subreddit_name(" /r/My_Sub/ ").unwrap(), "My_Sub");
    }

    #[test]
    fn test_subreddit_name_rejects_garbage() {
        assert!(matches!(
            Config::subreddit_name("/r/"),
            Err(TattlerError::Config(_))
        ));
        assert!(matches!(
            Config::subreddit_name("my sub"),
            Err(TattlerError::Config(_))
        ));
        assert!(matches!(
            Config::subreddit_name("r/pics/hot"),
            Err(TattlerError::Config(_))
        ));
    }
}
