use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub api_timeout_secs: u64,
    pub browse_page_size: u32,
    pub my_announcements_page_size: u32,
    pub favorites_page_size: u32,
    pub notifications_page_size: u32,
}

impl Config {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            api_base_url: required("API_BASE_URL")?,
            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),
            api_timeout_secs: env::var("API_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".into())
                .parse()?,
            browse_page_size: env::var("BROWSE_PAGE_SIZE")
                .unwrap_or_else(|_| "8".into())
                .parse()?,
            my_announcements_page_size: env::var("MY_ANNOUNCEMENTS_PAGE_SIZE")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            favorites_page_size: env::var("FAVORITES_PAGE_SIZE")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            notifications_page_size: env::var("NOTIFICATIONS_PAGE_SIZE")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
        })
    }

    /// Defaults for everything except the backend location.
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_token: None,
            api_timeout_secs: 15,
            browse_page_size: 8,
            my_announcements_page_size: 10,
            favorites_page_size: 20,
            notifications_page_size: 20,
        }
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
