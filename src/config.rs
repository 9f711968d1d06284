use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_POSTHOG_HOST: &str = "https://app.posthog.com";
pub const DEFAULT_SITE_URL: &str = "https://kailo.kr";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3001";

/// Everything the landing engine reads from the environment.
#[derive(Debug, Clone)]
pub struct LandingConfig {
    pub posthog_key: Option<String>,
    pub posthog_host: String,
    /// Form-intake endpoint. `None` is a normal state: lead capture reports "not ready".
    pub lead_webhook_url: Option<Url>,
    pub site_url: String,
    pub meta_pixel_id: Option<String>,
    pub default_step: usize,
    pub lead_timeout: Duration,
    /// Page sessions older than this are closed even if the browser never said goodbye.
    pub session_ttl: Duration,
    /// Live page sessions allowed at once. New sessions beyond this are refused.
    pub max_sessions: usize,
    pub frontend_url: String,
    pub port: u16,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            posthog_key: None,
            posthog_host: DEFAULT_POSTHOG_HOST.to_string(),
            lead_webhook_url: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            meta_pixel_id: None,
            default_step: crate::content::DEFAULT_STEP_INDEX,
            lead_timeout: Duration::from_secs(10),
            session_ttl: Duration::from_secs(120 * 60),
            max_sessions: 1000,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: 3000,
        }
    }
}

impl LandingConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first if a `.env` file should apply.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let lead_webhook_url = match get("LEAD_WEBHOOK_URL") {
            Some(raw) => match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("LEAD_WEBHOOK_URL is not a valid url ({}), lead capture disabled", e);
                    None
                }
            },
            None => None,
        };

        let default_step = match get("DEFAULT_STEP") {
            Some(raw) => raw.parse::<usize>().map_err(|_| ConfigError::Invalid {
                key: "DEFAULT_STEP",
                value: raw,
            })?,
            None => defaults.default_step,
        };

        let lead_timeout = match get("LEAD_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    key: "LEAD_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "LEAD_TIMEOUT_SECS",
                        value: raw,
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.lead_timeout,
        };

        let session_ttl = match get("SESSION_TTL_MINUTES") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .ok()
                    .and_then(|minutes| minutes.checked_mul(60))
                    .ok_or(ConfigError::Invalid {
                        key: "SESSION_TTL_MINUTES",
                        value: raw,
                    })?;
                Duration::from_secs(secs)
            }
            None => defaults.session_ttl,
        };

        let max_sessions = match get("MAX_SESSIONS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MAX_SESSIONS",
                        value: raw,
                    })
                }
            },
            None => defaults.max_sessions,
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        Ok(Self {
            posthog_key: get("POSTHOG_KEY"),
            posthog_host: get("POSTHOG_HOST").unwrap_or(defaults.posthog_host),
            lead_webhook_url,
            site_url: get("SITE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            meta_pixel_id: get("META_PIXEL_ID"),
            default_step,
            lead_timeout,
            session_ttl,
            max_sessions,
            frontend_url: get("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            port,
        })
    }

    pub fn og_image_url(&self) -> String {
        format!("{}{}", self.site_url, crate::content::OG_IMAGE_PATH)
    }
}
