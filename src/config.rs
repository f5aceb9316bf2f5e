use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

use crate::utils::clock::LocalClock;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub clock: LocalClock,
    pub workers: usize,
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Parses `+HH:MM` or `-HH:MM`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, String> {
    let invalid = || format!("APP_UTC_OFFSET must look like +HH:MM, got {}", raw);
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let clock = match env::var("APP_UTC_OFFSET") {
            Ok(raw) => LocalClock::new(parse_utc_offset(&raw)?),
            Err(_) => LocalClock::host(),
        };

        Ok(AppConfig {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            clock,
            workers: parse_var("WORKERS", num_cpus::get())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_offsets() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-08:00").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_utc_offset("+00:00").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn rejects_malformed_offsets() {
        for raw in ["05:30", "+5", "+24:00", "+01:75", "UTC"] {
            assert!(parse_utc_offset(raw).is_err(), "{} should be rejected", raw);
        }
    }
}
