//! Build-time overrides of [`BadgeConfig`].

use log::warn;
use thermo_badge_core::BadgeConfig;

/// Apply `BADGE_*` values captured by the build script on top of the
/// defaults. Unparseable or inconsistent values are logged and ignored.
pub fn badge_config() -> BadgeConfig {
    let mut config = BadgeConfig::default();

    if let Some(group) = parse::<u8>("BADGE_RADIO_GROUP", option_env!("BADGE_RADIO_GROUP")) {
        config = config.with_radio_group(group);
    }

    let upper = parse::<i32>("BADGE_UPPER_LIMIT", option_env!("BADGE_UPPER_LIMIT"));
    let lower = parse::<i32>("BADGE_LOWER_LIMIT", option_env!("BADGE_LOWER_LIMIT"));
    if upper.is_some() || lower.is_some() {
        let lower = lower.unwrap_or(config.lower_limit);
        let upper = upper.unwrap_or(config.upper_limit);
        let candidate = config.clone().with_limits(lower, upper);
        match candidate.validate() {
            Ok(()) => config = candidate,
            Err(e) => warn!("Ignoring build-time limits: {}", e),
        }
    }

    config
}

fn parse<T: core::str::FromStr>(key: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}
