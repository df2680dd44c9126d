use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub credits: CreditsConfig,
    pub rate_limit: RateLimitConfig,
    pub smtp: SmtpConfig,
    pub telegram: TelegramConfig,
    pub notify: NotifyConfig,
    pub ai: AiConfig,
    pub security: SecurityConfig,
    /// Base URL of the dashboard, used for apply links in notifications
    pub app_base_url: String,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Credit accounting configuration
#[derive(Debug, Clone)]
pub struct CreditsConfig {
    /// Credits restored to each FREE account at the daily reset
    pub daily_allotment: i32,
    /// When true, pitch generation is a Pro-only feature regardless of credits
    pub pitch_requires_pro: bool,
}

/// In-process rate limiter configuration (pitch generation)
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Window duration in seconds
    pub window_secs: u64,
    /// Max pitch generations per user per window
    pub max_per_window: u32,
    /// Grace period past window expiry before an entry is purged
    pub gc_grace_secs: u64,
    /// Interval between purge runs
    pub gc_interval_secs: u64,
}

/// SMTP transport configuration for email notifications
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    /// Operator inbox for single-recipient lead alerts
    pub admin_address: Option<String>,
}

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Operator chat for single-recipient lead alerts
    pub admin_chat_id: Option<String>,
    /// Bot API base, overridable so tests can point at a stub server
    pub api_base: String,
}

/// Notify endpoint configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Shared secret required by the notify endpoints
    pub shared_secret: Option<String>,
}

/// AI completion provider configuration (OpenAI-compatible)
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Security configuration for production deployments
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// True if server is behind a proxy that terminates SSL (nginx, Cloudflare, etc.)
    /// When true: cookie_secure=true is enabled
    pub ssl_proxy: bool,
    /// Session encryption key (64 hex chars). Required when ssl_proxy=true
    pub session_secret_key: Option<String>,
    /// HMAC secret for validating payment-gateway webhooks
    pub payment_webhook_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            credits: CreditsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            telegram: TelegramConfig::from_env(),
            notify: NotifyConfig::from_env(),
            ai: AiConfig::from_env(),
            security: SecurityConfig::from_env()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}

impl CreditsConfig {
    /// Load credit configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            daily_allotment: env::var("DAILY_CREDIT_ALLOTMENT")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            pitch_requires_pro: env::var("PITCH_REQUIRES_PRO")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl RateLimitConfig {
    /// Load rate limit configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            window_secs: env::var("PITCH_RATE_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            max_per_window: env::var("PITCH_RATE_MAX_PER_WINDOW")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            gc_grace_secs: env::var("PITCH_RATE_GC_GRACE_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            gc_interval_secs: env::var("PITCH_RATE_GC_INTERVAL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),
        }
    }
}

impl SmtpConfig {
    /// Load SMTP configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok(),
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            from_address: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "alerts@leadgate.local".to_string()),
            admin_address: env::var("ADMIN_EMAIL").ok(),
        }
    }
}

impl TelegramConfig {
    /// Load Telegram bot configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            admin_chat_id: env::var("TELEGRAM_ADMIN_CHAT_ID").ok(),
            api_base: env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
        }
    }
}

impl NotifyConfig {
    /// Load notify endpoint configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            shared_secret: env::var("NOTIFY_SHARED_SECRET").ok(),
        }
    }
}

impl AiConfig {
    /// Load AI provider configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("AI_API_KEY").ok(),
            base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            model: env::var("AI_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    MissingDatabaseUrl,
    MissingSessionSecret,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::MissingSessionSecret => {
                write!(
                    f,
                    "SESSION_SECRET_KEY is required when SSL_PROXY is enabled"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl SecurityConfig {
    /// Load security configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret_key = env::var("SESSION_SECRET_KEY").ok();

        let ssl_proxy = env::var("SSL_PROXY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        // When SSL_PROXY is enabled, SESSION_SECRET_KEY is required
        if ssl_proxy && session_secret_key.is_none() {
            return Err(ConfigError::MissingSessionSecret);
        }

        Ok(Self {
            ssl_proxy,
            session_secret_key,
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").ok(),
        })
    }
}
