use log::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Global level plus per-target overrides. `RUST_LOG`, when set, wins.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LevelFilter::Info)
    }
}

impl LogConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            targets: Vec::new(),
        }
    }

    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn level_for(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        let target = target.into();
        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, level));
        self
    }

    /// `EnvFilter` directive string, e.g. `info,seer_sdk::node=debug`.
    pub fn directives(&self) -> String {
        std::iter::once(level_name(self.level))
            .chain(
                self.targets
                    .iter()
                    .map(|(target, level)| format!("{target}={}", level_name(*level))),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn level_name(level: LevelFilter) -> String {
    level.to_string().to_ascii_lowercase()
}

/// Install the global subscriber. `log` records are bridged into it.
///
/// Returns `false` when a subscriber was already installed; calling this
/// more than once is harmless.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_list_overrides_after_global_level() {
        let config = LogConfig::new(LevelFilter::Warn)
            .level_for("seer_sdk::node", LevelFilter::Debug)
            .level_for("seer_lib", LevelFilter::Trace);
        assert_eq!(config.directives(), "warn,seer_sdk::node=debug,seer_lib=trace");
    }

    #[test]
    fn later_override_replaces_earlier_one() {
        let config = LogConfig::default()
            .level(LevelFilter::Error)
            .level_for("seer_sdk::wizard", LevelFilter::Debug)
            .level_for("seer_sdk::wizard", LevelFilter::Off);
        assert_eq!(config.directives(), "error,seer_sdk::wizard=off");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(&LogConfig::default());
        assert!(!init_logging(&LogConfig::default()));
    }
}
