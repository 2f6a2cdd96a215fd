//! Application configuration loaded from environment variables.
//!
//! A `.env` file is read first when present. Without `BACKEND_URL` the
//! server runs against an in-memory table store.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Hosted backend base URL (e.g. `https://project.example.co`)
    pub backend_url: Option<String>,
    /// Expected `aud` claim on user tokens, if the auth service sets one
    pub jwt_audience: Option<String>,

    // --- Secrets ---
    /// Service key for the hosted backend's table API
    pub backend_api_key: Option<String>,
    /// Shared HS256 secret the auth service signs user tokens with (raw bytes)
    pub jwt_secret: Vec<u8>,
}

impl Config {
    /// Config for tests: in-memory store, fixed secret.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            backend_url: None,
            jwt_audience: None,
            backend_api_key: None,
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend_url = non_empty_var("BACKEND_URL");
        let backend_api_key = non_empty_var("BACKEND_API_KEY");
        if backend_url.is_some() && backend_api_key.is_none() {
            return Err(ConfigError::Missing("BACKEND_API_KEY"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            backend_url,
            jwt_audience: non_empty_var("JWT_AUDIENCE"),
            backend_api_key,
            jwt_secret: env::var("JWT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
