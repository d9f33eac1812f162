use std::{env, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub store_backend: StoreBackend,
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,
    pub jwt_ttl_days: i64,
    pub cookie_secure: bool,

    pub alpha_vantage_api_key: String,
    pub news_api_key: String,
    pub openai_api_key: String,
    pub openai_model: String,

    // 0 disables the background sweep
    pub alert_sweep_secs: u64,
    pub provider_timeout_secs: u64,
    pub sweep_concurrency: usize,
}

impl Settings {
    /// Alpha Vantage keys shorter than this are treated as placeholders.
    pub fn has_alpha_vantage_key(&self) -> bool {
        self.alpha_vantage_api_key.trim().len() > 10
    }

    pub fn has_news_api_key(&self) -> bool {
        !self.news_api_key.trim().is_empty()
    }

    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.trim().starts_with("sk-")
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let store_backend = match env_or("STORE_BACKEND", "mongo").trim().to_ascii_lowercase().as_str() {
        "memory" | "mem" => StoreBackend::Memory,
        _ => StoreBackend::Mongo,
    };

    // Alpha Vantage accepts either spelling
    let alpha_vantage_api_key = env::var("ALPHA_VANTAGE_API_KEY")
        .or_else(|_| env::var("ALPHAVANTAGE_API_KEY"))
        .unwrap_or_default();

    let news_api_key = env::var("NEWS_API_KEY")
        .or_else(|_| env::var("NEWSAPI_KEY"))
        .unwrap_or_default();

    Settings {
        mongodb_uri: env_or("MONGODB_URI", "mongodb://localhost:27017"),
        mongodb_db: env_or("MONGODB_DB", "stocklens"),
        store_backend,
        host: env_or("HOST", "127.0.0.1"),
        port: env_parse("PORT", 3000),
        jwt_secret: env_or("JWT_SECRET", "change-me-dev-secret"),
        jwt_cookie_name: env_or("JWT_COOKIE_NAME", "auth"),
        jwt_ttl_days: env_parse("JWT_TTL_DAYS", 7),
        cookie_secure: env_flag("COOKIE_SECURE"),
        alpha_vantage_api_key,
        news_api_key,
        openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
        openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
        alert_sweep_secs: env_parse("ALERT_SWEEP_SECS", 60),
        provider_timeout_secs: env_parse("PROVIDER_TIMEOUT_SECS", 10),
        sweep_concurrency: env_parse("SWEEP_CONCURRENCY", 4usize).max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            mongodb_uri: String::new(),
            mongodb_db: String::new(),
            store_backend: StoreBackend::Memory,
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "secret".into(),
            jwt_cookie_name: "auth".into(),
            jwt_ttl_days: 7,
            cookie_secure: false,
            alpha_vantage_api_key: String::new(),
            news_api_key: String::new(),
            openai_api_key: String::new(),
            openai_model: "gpt-4o".into(),
            alert_sweep_secs: 0,
            provider_timeout_secs: 0,
            sweep_concurrency: 1,
        }
    }

    #[test]
    fn short_alpha_vantage_key_is_a_placeholder() {
        let mut s = settings();
        s.alpha_vantage_api_key = "demo".into();
        assert!(!s.has_alpha_vantage_key());
        s.alpha_vantage_api_key = "ABCDEFGHIJKL".into();
        assert!(s.has_alpha_vantage_key());
    }

    #[test]
    fn openai_key_needs_sk_prefix() {
        let mut s = settings();
        s.openai_api_key = "pk-123".into();
        assert!(!s.has_openai_key());
        s.openai_api_key = "sk-123".into();
        assert!(s.has_openai_key());
    }

    #[test]
    fn provider_timeout_never_zero() {
        assert_eq!(settings().provider_timeout(), Duration::from_secs(1));
    }
}
