use std::env;

use log::*;
use mkt_common::helpers::parse_boolean_flag;

use crate::{
    mkt_api::order_objects::DeliveryEstimates,
    notifier::{EmailError, LogMailer},
};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;
const DEFAULT_EMAIL_FROM: &str = "noreply@marketplace.local";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketplaceConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Capacity of each event channel. Publishers wait when a channel is full.
    pub event_buffer_size: usize,
    pub email_enabled: bool,
    pub email_from: String,
    pub estimates: DeliveryEstimates,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            email_enabled: true,
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            estimates: DeliveryEstimates::default(),
        }
    }
}

impl MarketplaceConfig {
    /// Reads the `MKT_*` environment variables. Anything missing or invalid falls back to its default, with a log
    /// message explaining why.
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let database_url = lookup("MKT_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url.clone()
        });
        let db_max_connections = parse_or_default(&lookup, "MKT_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let event_buffer_size = parse_or_default(&lookup, "MKT_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let email_enabled = parse_boolean_flag(lookup("MKT_EMAIL_ENABLED"), defaults.email_enabled);
        if !email_enabled {
            info!("🪛️ Email is disabled. Notifications will still be stored, but no emails will be sent.");
        }
        let email_from = lookup("MKT_EMAIL_FROM").unwrap_or(defaults.email_from);
        let shipping = lookup("MKT_CONFIRMED_SHIPPING_ESTIMATE").unwrap_or(defaults.estimates.shipping);
        let delivery = lookup("MKT_SHIPPED_DELIVERY_ESTIMATE").unwrap_or(defaults.estimates.delivery);
        Self {
            database_url,
            db_max_connections,
            event_buffer_size,
            email_enabled,
            email_from,
            estimates: DeliveryEstimates { shipping, delivery },
        }
    }

    /// The default email sink, configured from these settings.
    pub fn mailer(&self) -> Result<LogMailer, EmailError> {
        LogMailer::new(self.email_from.as_str(), self.email_enabled)
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {key}. {e} Using the default, {default}, instead.");
            default
        }),
        None => default,
    }
}
