//! Signal processor settings.

use std::env;
use tracing::warn;

/// Buffer size used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Environment variable naming an alternate signal processor.
const SIGNAL_CLASS_VAR: &str = "SIGNALS_SIGNAL_CLASS";

/// Environment variable holding the per-model buffer size.
const BUFFER_SIZE_VAR: &str = "SIGNALS_BUFFER_SIZE";

/// The `SIGNALS` settings group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSettings {
    /// Name of a registered alternate processor.
    pub signal_class: Option<String>,
    /// Number of saves per model buffered before the index is updated.
    pub buffer_size: Option<usize>,
}

impl SignalSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SIGNALS_SIGNAL_CLASS`: Name of an alternate processor (default: the buffered processor)
    /// - `SIGNALS_BUFFER_SIZE`: Buffer size per model (default: 100)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Blank values count as unset. An unparsable buffer size is logged and
    /// ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let signal_class = value(SIGNAL_CLASS_VAR);
        let buffer_size = value(BUFFER_SIZE_VAR).and_then(|raw| match raw.parse::<usize>() {
            Ok(size) => Some(size),
            Err(e) => {
                warn!(
                    value = %raw,
                    error = %e,
                    default = DEFAULT_BUFFER_SIZE,
                    "Invalid SIGNALS_BUFFER_SIZE, using default"
                );
                None
            }
        });

        Self {
            signal_class,
            buffer_size,
        }
    }

    /// Effective buffer size: the configured value, or 100. Never 0.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> SignalSettings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SignalSettings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_missing_buffer_size_defaults_to_100() {
        let settings = from_pairs(&[]);
        assert_eq!(settings.buffer_size, None);
        assert_eq!(settings.buffer_size(), 100);
        assert_eq!(settings.signal_class, None);
    }

    #[test]
    fn test_configured_values() {
        let settings = from_pairs(&[
            ("SIGNALS_SIGNAL_CLASS", "audit"),
            ("SIGNALS_BUFFER_SIZE", " 25 "),
        ]);
        assert_eq!(settings.signal_class.as_deref(), Some("audit"));
        assert_eq!(settings.buffer_size(), 25);
    }

    #[test]
    fn test_invalid_buffer_size_falls_back() {
        let settings = from_pairs(&[("SIGNALS_BUFFER_SIZE", "lots")]);
        assert_eq!(settings.buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_blank_signal_class_is_unset() {
        let settings = from_pairs(&[("SIGNALS_SIGNAL_CLASS", "  ")]);
        assert_eq!(settings.signal_class, None);
    }

    #[test]
    fn test_zero_buffer_size_is_clamped() {
        let settings = from_pairs(&[("SIGNALS_BUFFER_SIZE", "0")]);
        assert_eq!(settings.buffer_size(), 1);
    }
}
