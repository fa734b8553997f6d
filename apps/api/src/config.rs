use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Retries on 429/5xx. Zero means a failed completion is surfaced immediately.
    pub llm_max_retries: u32,
    pub max_upload_bytes: usize,
    /// Minimum resume/JD match percentage required to move on to the visa step.
    pub min_match_to_proceed: f64,
    /// Wizard sessions idle for longer than this are dropped.
    pub session_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 0)
                .context("LLM_MAX_RETRIES must be a non-negative integer")?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            min_match_to_proceed: parse_env("MIN_MATCH_TO_PROCEED", 50.0)
                .and_then(percentage)
                .context("MIN_MATCH_TO_PROCEED must be a number between 0 and 100")?,
            session_ttl_minutes: parse_env("SESSION_TTL_MINUTES", 60)
                .context("SESSION_TTL_MINUTES must be a whole number of minutes")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn percentage(value: f64) -> Result<f64> {
    anyhow::ensure!(
        (0.0..=100.0).contains(&value),
        "{value} is outside 0..=100"
    );
    Ok(value)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Config used by router tests; never reads the process environment.
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            llm_max_retries: 0,
            max_upload_bytes: 1024 * 1024,
            min_match_to_proceed: 50.0,
            session_ttl_minutes: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default_when_unset() {
        let value: u32 = parse_env("H1B_ASSESS_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_require_env_reports_missing_key() {
        let err = require_env("H1B_ASSESS_TEST_MISSING_KEY").unwrap_err();
        assert!(err.to_string().contains("H1B_ASSESS_TEST_MISSING_KEY"));
    }

    #[test]
    fn test_match_threshold_must_be_a_percentage() {
        assert_eq!(percentage(0.0).unwrap(), 0.0);
        assert_eq!(percentage(50.0).unwrap(), 50.0);
        assert_eq!(percentage(100.0).unwrap(), 100.0);
        assert!(percentage(150.0).is_err());
        assert!(percentage(-1.0).is_err());
        assert!(percentage(f64::NAN).is_err());
    }
}
