use std::{env, io::Write};

use checkout_tools::CheckoutConfig;
use chrono::Duration;
use food_order_common::{parse_boolean_flag, Secret};
use food_order_engine::{
    foe_api::flow_config::{DEFAULT_GROUP_ORDER_TTL, DEFAULT_PARTICIPANTS_PER_GROUP},
    OrderFlowConfig,
};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_FOS_HOST: &str = "127.0.0.1";
const DEFAULT_FOS_PORT: u16 = 7000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/food_orders.db";
const DEFAULT_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL of the customer-facing web app. Checkout redirects and shareable links point here.
    pub frontend_url: String,
    pub auth: AuthConfig,
    /// The number of people who split every group order.
    pub participants_per_group: i64,
    /// How long a group order accepts joins. `None` means group orders never expire.
    pub group_order_timeout: Option<Duration>,
    /// How often expired group orders are swept and marked as cancelled. The sweep only cancels records that expired
    /// more than a checkout session lifetime ago, so late payments for live sessions are still recorded. `None`
    /// disables the sweep. Expired orders refuse new joins regardless.
    pub expiry_sweep_interval: Option<std::time::Duration>,
    /// If false, webhook signatures are NOT checked. **DANGER**. Only ever do this in local development.
    pub webhook_signature_checks: bool,
    pub checkout: CheckoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FOS_HOST.to_string(),
            port: DEFAULT_FOS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            auth: AuthConfig::default(),
            participants_per_group: DEFAULT_PARTICIPANTS_PER_GROUP,
            group_order_timeout: Some(DEFAULT_GROUP_ORDER_TTL),
            expiry_sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
            webhook_signature_checks: true,
            checkout: CheckoutConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FOS_HOST").ok().unwrap_or_else(|| DEFAULT_FOS_HOST.into());
        let port = env::var("FOS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FOS_PORT. {e} Using the default, {DEFAULT_FOS_PORT}, instead."
                    );
                    DEFAULT_FOS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FOS_PORT);
        let database_url = env::var("FOS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ FOS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let frontend_url = env::var("FOS_FRONTEND_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ FOS_FRONTEND_URL is not set. Checkout redirects will point to {DEFAULT_FRONTEND_URL}");
            DEFAULT_FRONTEND_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let participants_per_group = configure_participants();
        let group_order_timeout = configure_group_order_timeout();
        let expiry_sweep_interval = configure_sweep_interval();
        let webhook_signature_checks = parse_boolean_flag(env::var("FOS_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Anyone can mark orders as paid. Never run like this in production.");
        }
        let checkout = CheckoutConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            frontend_url,
            auth,
            participants_per_group,
            group_order_timeout,
            expiry_sweep_interval,
            webhook_signature_checks,
            checkout,
        }
    }

    pub fn order_flow_config(&self) -> OrderFlowConfig {
        OrderFlowConfig {
            participants_per_group: self.participants_per_group,
            group_order_ttl: self.group_order_timeout,
            ..OrderFlowConfig::new(self.frontend_url.clone())
        }
    }
}

fn configure_participants() -> i64 {
    env::var("FOS_GROUP_ORDER_PARTICIPANTS")
        .map_err(|_| {
            info!("🪛️ FOS_GROUP_ORDER_PARTICIPANTS is not set. Group orders are split {DEFAULT_PARTICIPANTS_PER_GROUP} ways.")
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for FOS_GROUP_ORDER_PARTICIPANTS. {e}"))
                .and_then(|n| {
                    if n >= 1 {
                        Ok(n)
                    } else {
                        warn!("🪛️ FOS_GROUP_ORDER_PARTICIPANTS must be at least 1, not {n}");
                        Err(())
                    }
                })
        })
        .unwrap_or(DEFAULT_PARTICIPANTS_PER_GROUP)
}

fn configure_group_order_timeout() -> Option<Duration> {
    let hours = env::var("FOS_GROUP_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ FOS_GROUP_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_GROUP_ORDER_TTL.num_hours()
            )
        })
        .and_then(|s| s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for FOS_GROUP_ORDER_TIMEOUT. {e}")))
        .unwrap_or(DEFAULT_GROUP_ORDER_TTL.num_hours());
    if hours <= 0 {
        info!("🪛️ Group orders never expire.");
        None
    } else {
        Some(Duration::hours(hours))
    }
}

fn configure_sweep_interval() -> Option<std::time::Duration> {
    let secs = env::var("FOS_EXPIRY_SWEEP_INTERVAL")
        .map_err(|_| {
            info!(
                "🪛️ FOS_EXPIRY_SWEEP_INTERVAL is not set. Expired group orders are swept every {} s.",
                DEFAULT_SWEEP_INTERVAL.as_secs()
            )
        })
        .and_then(|s| s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for FOS_EXPIRY_SWEEP_INTERVAL. {e}")))
        .unwrap_or(DEFAULT_SWEEP_INTERVAL.as_secs());
    if secs == 0 {
        info!("🪛️ The expiry sweep is disabled. Expired group orders will still refuse new joins.");
        None
    } else {
        Some(std::time::Duration::from_secs(secs))
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify access tokens. Shared with the identity provider.
    pub jwt_secret: Secret<String>,
    /// How long tokens issued by this server are valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since no externally issued token will be accepted. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the FOS_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("FOS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [FOS_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "FOS_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(secret))
    }
}
