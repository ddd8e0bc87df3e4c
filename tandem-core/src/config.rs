//! Pipeline configuration with `TANDEM_*` environment overrides.

use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;
use crate::fence::FENCE_TIMEOUT;
use crate::handoff::FencePolicy;
use crate::render_loop::LoopMode;
use crate::surface::DEFAULT_WAIT;

/// Settings shared by the producer, the consumer and the render loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
    /// Number of shared surfaces (3 = triple-buffering)
    pub pool_size: usize,
    /// Producer wait for a free surface
    pub checkout_timeout: Duration,
    /// Consumer wait for a finished frame
    pub consume_timeout: Duration,
    /// Bound on the GPU completion wait
    pub fence_timeout: Duration,
    /// What to do with a frame whose fence timed out
    pub fence_policy: FencePolicy,
    /// One render thread or one per scene
    pub mode: LoopMode,
    /// Producer background (`#AARRGGBB` or `transparent`)
    pub producer_background: String,
    /// Consumer background (`#AARRGGBB` or `transparent`)
    pub consumer_background: String,
    /// Consumer presents with vsync
    pub vsync: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            pool_size: 3,
            checkout_timeout: DEFAULT_WAIT,
            consume_timeout: DEFAULT_WAIT,
            fence_timeout: FENCE_TIMEOUT,
            fence_policy: FencePolicy::DropFrame,
            mode: LoopMode::Combined,
            producer_background: "#FF1E3A8A".to_string(),
            consumer_background: "transparent".to_string(),
            vsync: true,
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `TANDEM_*` variables from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, then validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("TANDEM_WIDTH") {
            config.width = parse_value("TANDEM_WIDTH", &v)?;
        }
        if let Some(v) = lookup("TANDEM_HEIGHT") {
            config.height = parse_value("TANDEM_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("TANDEM_POOL_SIZE") {
            config.pool_size = parse_value("TANDEM_POOL_SIZE", &v)?;
        }
        if let Some(v) = lookup("TANDEM_MODE") {
            config.mode = parse_value("TANDEM_MODE", &v)?;
        }
        if let Some(v) = lookup("TANDEM_FENCE_POLICY") {
            config.fence_policy = parse_value("TANDEM_FENCE_POLICY", &v)?;
        }
        if let Some(v) = lookup("TANDEM_PRODUCER_BG") {
            config.producer_background = v;
        }
        if let Some(v) = lookup("TANDEM_CONSUMER_BG") {
            config.consumer_background = v;
        }
        if let Some(v) = lookup("TANDEM_VSYNC") {
            config.vsync = match v.trim() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                other => {
                    return Err(CoreError::invalid_config(format!(
                        "TANDEM_VSYNC: expected 0 or 1, got {other:?}"
                    )))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::invalid_config(format!(
                "surface size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.pool_size == 0 {
            return Err(CoreError::EmptyPool);
        }
        Ok(())
    }

    /// Sync interval the consumer presents with.
    pub fn consumer_sync_interval(&self) -> u32 {
        u32::from(self.vsync)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| CoreError::invalid_config(format!("{key}: {e}")))
}

impl FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "combined" => Ok(LoopMode::Combined),
            "split" => Ok(LoopMode::Split),
            other => Err(format!("unknown loop mode {other:?}")),
        }
    }
}

impl FromStr for FencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(FencePolicy::DropFrame),
            "publish" => Ok(FencePolicy::PublishUnconfirmed),
            other => Err(format!("unknown fence policy {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_triple_buffered() {
        let c = PipelineConfig::default();
        assert_eq!(c.pool_size, 3);
        assert_eq!(c.fence_timeout, Duration::from_secs(1));
        assert_eq!(c.checkout_timeout, Duration::from_millis(100));
        assert_eq!(c.fence_policy, FencePolicy::DropFrame);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let c = PipelineConfig::from_lookup(lookup(&[
            ("TANDEM_WIDTH", "800"),
            ("TANDEM_POOL_SIZE", "2"),
            ("TANDEM_MODE", "Split"),
            ("TANDEM_FENCE_POLICY", "publish"),
            ("TANDEM_CONSUMER_BG", "#FF000000"),
            ("TANDEM_VSYNC", "0"),
        ]))
        .unwrap();
        assert_eq!(c.width, 800);
        assert_eq!(c.height, 360);
        assert_eq!(c.pool_size, 2);
        assert_eq!(c.mode, LoopMode::Split);
        assert_eq!(c.fence_policy, FencePolicy::PublishUnconfirmed);
        assert_eq!(c.consumer_background, "#FF000000");
        assert_eq!(c.consumer_sync_interval(), 0);
    }

    #[test]
    fn test_malformed_values_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("TANDEM_WIDTH", "wide")])).unwrap_err();
        assert!(err.to_string().contains("TANDEM_WIDTH"));
        assert!(PipelineConfig::from_lookup(lookup(&[("TANDEM_MODE", "turbo")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("TANDEM_VSYNC", "maybe")])).is_err());
    }

    #[test]
    fn test_zero_pool_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("TANDEM_POOL_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, CoreError::EmptyPool));
    }

    #[test]
    fn test_zero_size_rejected() {
        let c = PipelineConfig {
            height: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(CoreError::InvalidConfig(_))));
    }
}
