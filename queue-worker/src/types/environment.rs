//! Environment configuration for different deployment stages

use std::env;

use anyhow::Context;
use strum::{Display, EnumString};

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if `APP_ENV` contains an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        let env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let env = env.trim();

        env.parse()
            .with_context(|| format!("Invalid environment: {env}"))
    }

    /// Tag appended to every queue name
    #[must_use]
    pub fn queue_tag(&self) -> String {
        self.to_string()
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&'static str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// Returns the region to use when none is configured
    #[must_use]
    pub const fn default_region(&self) -> Option<&'static str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development => Some("us-east-1"),
        }
    }
}
