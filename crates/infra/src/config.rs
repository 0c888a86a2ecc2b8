//! Unit of work configuration.

/// Environment variable overriding [`UnitOfWorkConfig::max_race_attempts`].
pub const MAX_RACE_ATTEMPTS_ENV: &str = "CHRONICLE_MAX_RACE_ATTEMPTS";

const DEFAULT_MAX_RACE_ATTEMPTS: u32 = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UnitOfWorkConfig {
    /// Storage conflicts tolerated before a commit gives up. A commit makes
    /// at most `max_race_attempts + 1` appends.
    pub max_race_attempts: u32,
}

impl Default for UnitOfWorkConfig {
    fn default() -> Self {
        Self {
            max_race_attempts: DEFAULT_MAX_RACE_ATTEMPTS,
        }
    }
}

impl UnitOfWorkConfig {
    pub fn with_max_race_attempts(mut self, max_race_attempts: u32) -> Self {
        self.max_race_attempts = max_race_attempts;
        self
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_RACE_ATTEMPTS_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(value) => config.max_race_attempts = value,
                Err(err) => tracing::warn!(
                    variable = MAX_RACE_ATTEMPTS_ENV,
                    value = %raw,
                    error = %err,
                    default = DEFAULT_MAX_RACE_ATTEMPTS,
                    "invalid race attempt limit, using default"
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_three_races() {
        assert_eq!(UnitOfWorkConfig::default().max_race_attempts, 3);
        assert_eq!(
            UnitOfWorkConfig::default()
                .with_max_race_attempts(0)
                .max_race_attempts,
            0
        );
    }

    #[test]
    fn lookup_overrides_default() {
        let config = UnitOfWorkConfig::from_lookup(|key| {
            (key == MAX_RACE_ATTEMPTS_ENV).then(|| " 7 ".to_string())
        });
        assert_eq!(config.max_race_attempts, 7);
    }

    #[test]
    fn invalid_value_falls_back() {
        let config = UnitOfWorkConfig::from_lookup(|_| Some("many".to_string()));
        assert_eq!(config, UnitOfWorkConfig::default());

        let config = UnitOfWorkConfig::from_lookup(|_| None);
        assert_eq!(config, UnitOfWorkConfig::default());
    }
}
