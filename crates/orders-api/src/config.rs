//! Service configuration from environment variables.

use crate::error::AppError;

/// Which event bus implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBusKind {
    /// Bounded in-process bus (the default).
    InMemory,
    /// External broker-backed bus. Not implemented; selecting it fails
    /// startup explicitly.
    Broker,
}

impl EventBusKind {
    /// Parses the `EVENT_BUS` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "memory" => Some(EventBusKind::InMemory),
            "broker" => Some(EventBusKind::Broker),
            _ => None,
        }
    }
}

/// Runtime configuration for the orders service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Selected event bus implementation.
    pub event_bus: EventBusKind,
}

impl AppConfig {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when a required variable is missing
    /// or a value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8082".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("PORT must be a valid u16: {err}")))?;
        let event_bus_value = std::env::var("EVENT_BUS").unwrap_or_else(|_| "memory".to_string());
        let event_bus = EventBusKind::parse(&event_bus_value).ok_or_else(|| {
            AppError::Config(format!(
                "EVENT_BUS must be 'memory' or 'broker', got '{event_bus_value}'"
            ))
        })?;

        Ok(Self {
            database_url,
            host,
            port,
            event_bus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_kind_parses_known_values() {
        assert_eq!(EventBusKind::parse("memory"), Some(EventBusKind::InMemory));
        assert_eq!(EventBusKind::parse("broker"), Some(EventBusKind::Broker));
        assert_eq!(EventBusKind::parse("kafka"), None);
        assert_eq!(EventBusKind::parse(""), None);
    }
}
