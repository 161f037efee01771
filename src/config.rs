//! Environment-based Configuration for the PoolForge Backend
//!
//! This module provides secure configuration loading from environment
//! variables. All sensitive values (API keys, wallet ids) MUST come from
//! environment variables, never from hardcoded values.
//!
//! # Environment Variables
//!
//! ## Network Configuration
//! - `POOLFORGE_ENV` - "production", "staging", or "development" (default: "development")
//! - `POOLFORGE_SIGNER_URL` - Signing service base URL
//! - `POOLFORGE_SIGNER_API_KEY` - Signing service API key
//!
//! ## Deployment Configuration
//! - `POOLFORGE_FACTORY_ADDRESS` - Pool factory contract address
//! - `POOLFORGE_DEFAULT_WALLET_ID` - Fallback deployment wallet
//! - `POOLFORGE_COLLATERAL_RATIO_WAD` - Collateralization ratio, 18-decimal fixed point
//! - `POOLFORGE_FEE_LEVEL` - "LOW", "MEDIUM", or "HIGH" (default: "MEDIUM")
//!
//! ## Optional Settings
//! - `POOLFORGE_API_PORT` - HTTP API port (default: 3000)
//! - `POOLFORGE_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::orchestrator::FeeLevel;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("environment mismatch: expected {0}, got {1}")]
    EnvironmentMismatch(String, String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" | "stage" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ConfigError::InvalidValue(
                "POOLFORGE_ENV".to_string(),
                format!("unknown environment: {}", s),
            )),
        }
    }
}

impl Environment {
    /// Get default signer base URL for this environment
    pub fn default_signer_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://signer.poolforge.io",
            Environment::Staging => "https://signer.staging.poolforge.io",
            Environment::Development => "http://localhost:8545",
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct PoolForgeConfig {
    /// Deployment environment
    pub environment: Environment,

    /// Signing service base URL
    pub signer_url: String,

    /// Signing service API key
    pub signer_api_key: String,

    /// Pool factory contract address
    pub factory_address: String,

    /// Fallback deployment wallet
    pub default_wallet_id: String,

    /// Collateralization ratio, 18-decimal fixed point
    pub collateral_ratio_wad: u128,

    /// Fee level for deployment submissions
    pub fee_level: FeeLevel,

    /// HTTP API port
    pub api_port: u16,

    /// Log level
    pub log_level: String,
}

impl PoolForgeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment: Environment = env::var("POOLFORGE_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        let signer_url = env::var("POOLFORGE_SIGNER_URL")
            .unwrap_or_else(|_| environment.default_signer_url().to_string());

        // API key required outside development
        let signer_api_key = match env::var("POOLFORGE_SIGNER_API_KEY") {
            Ok(key) => key,
            Err(_) if environment == Environment::Development => String::new(),
            Err(_) => {
                return Err(ConfigError::MissingEnvVar(
                    "POOLFORGE_SIGNER_API_KEY".to_string(),
                ))
            }
        };

        let factory_address = get_required_or_dev_default(
            "POOLFORGE_FACTORY_ADDRESS",
            "0x0000000000000000000000000000000000000f0f",
            environment,
        )?;

        let default_wallet_id = get_required_or_dev_default(
            "POOLFORGE_DEFAULT_WALLET_ID",
            "dev-deploy-wallet",
            environment,
        )?;

        // 1.5x collateralization by default
        let collateral_ratio_wad = match env::var("POOLFORGE_COLLATERAL_RATIO_WAD") {
            Ok(v) => v.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "POOLFORGE_COLLATERAL_RATIO_WAD".to_string(),
                    "must be an unsigned integer".to_string(),
                )
            })?,
            Err(_) => 1_500_000_000_000_000_000,
        };

        let fee_level = match env::var("POOLFORGE_FEE_LEVEL") {
            Ok(v) => v.parse().map_err(|e: String| {
                ConfigError::InvalidValue("POOLFORGE_FEE_LEVEL".to_string(), e)
            })?,
            Err(_) => FeeLevel::Medium,
        };

        let api_port = match env::var("POOLFORGE_API_PORT") {
            Ok(v) => v.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "POOLFORGE_API_PORT".to_string(),
                    "must be a port number".to_string(),
                )
            })?,
            Err(_) => 3000,
        };

        let log_level = env::var("POOLFORGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            signer_url,
            signer_api_key,
            factory_address,
            default_wallet_id,
            collateral_ratio_wad,
            fee_level,
            api_port,
            log_level,
        })
    }

    /// Validate configuration for production readiness
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Production {
            return Err(ConfigError::EnvironmentMismatch(
                "production".to_string(),
                format!("{:?}", self.environment),
            ));
        }

        if self.signer_api_key.is_empty() {
            return Err(ConfigError::MissingEnvVar(
                "POOLFORGE_SIGNER_API_KEY".to_string(),
            ));
        }

        Ok(())
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== PoolForge Configuration ===");
        println!("Environment: {:?}", self.environment);
        println!("Signer URL: {}", self.signer_url);
        println!("Factory: {}", self.factory_address);
        println!("Default Wallet: {}", self.default_wallet_id);
        println!("Collateral Ratio (wad): {}", self.collateral_ratio_wad);
        println!("Fee Level: {:?}", self.fee_level);
        println!("API Port: {}", self.api_port);
        println!("Log Level: {}", self.log_level);
        println!("===============================");
    }
}

/// Get required env var, or use default for development only
fn get_required_or_dev_default(
    var_name: &str,
    dev_default: &str,
    environment: Environment,
) -> Result<String, ConfigError> {
    match env::var(var_name) {
        Ok(value) => Ok(value),
        Err(_) => {
            if environment == Environment::Development {
                Ok(dev_default.to_string())
            } else {
                Err(ConfigError::MissingEnvVar(var_name.to_string()))
            }
        }
    }
}
