//! Connection configuration.

use std::str::FromStr;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

const DEFAULT_RESOLVE_CONCURRENCY: usize = 16;

/// Settings shared by every query chain created from one connection.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Time budget for every round trip to the engine, e.g. `30s`.
    /// Unlimited when unset.
    #[serde(with = "humantime_serde")]
    #[schemars(with = "Option<String>")]
    pub execute_timeout: Option<Duration>,

    /// Maximum number of object references resolved at the same time for a single chain.
    pub resolve_concurrency: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            execute_timeout: None,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }
}

#[buildstructor::buildstructor]
impl Configuration {
    /// Returns a builder for a [`Configuration`]; unset settings keep their defaults.
    #[builder(visibility = "pub")]
    fn new(execute_timeout: Option<Duration>, resolve_concurrency: Option<usize>) -> Self {
        Self {
            execute_timeout,
            resolve_concurrency: resolve_concurrency.unwrap_or(DEFAULT_RESOLVE_CONCURRENCY),
        }
    }

    pub(crate) fn resolve_limit(&self) -> usize {
        self.resolve_concurrency.max(1)
    }
}

impl FromStr for Configuration {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let configuration: Configuration = "execute_timeout: 1m 30s\nresolve_concurrency: 4"
            .parse()
            .unwrap();
        assert_eq!(
            configuration,
            Configuration::builder()
                .execute_timeout(Duration::from_secs(90))
                .resolve_concurrency(4)
                .build()
        );
    }

    #[test]
    fn test_defaults() {
        let configuration: Configuration = "{}".parse().unwrap();
        assert_eq!(configuration, Configuration::default());
        assert_eq!(configuration.execute_timeout, None);
        assert_eq!(configuration.resolve_limit(), DEFAULT_RESOLVE_CONCURRENCY);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!("timeout: 10s".parse::<Configuration>().is_err());
    }

    #[test]
    fn test_zero_concurrency_still_makes_progress() {
        let configuration = Configuration::builder().resolve_concurrency(0).build();
        assert_eq!(configuration.resolve_limit(), 1);
    }
}
