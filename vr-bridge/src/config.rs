use crate::message::FrameConversion;
use clap::{ArgAction, Parser};
use std::fmt;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::vr_manager::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenXr,
    Mock,
}

impl Default for Backend {
    // The runtime backend when it is compiled in.
    fn default() -> Backend {
        if cfg!(feature = "openxr") {
            Backend::OpenXr
        } else {
            Backend::Mock
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Backend, String> {
        match s {
            "openxr" => Ok(Backend::OpenXr),
            "mock" => Ok(Backend::Mock),
            other => Err(format!("unknown backend `{}`, expected openxr or mock", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Backend::OpenXr => "openxr",
            Backend::Mock => "mock",
        })
    }
}

impl FromStr for FrameConversion {
    type Err = String;

    fn from_str(s: &str) -> Result<FrameConversion, String> {
        match s {
            "stage" => Ok(FrameConversion::Stage),
            "z_up" | "z-up" => Ok(FrameConversion::ZUp),
            other => Err(format!("unknown frame `{}`, expected stage or z_up", other)),
        }
    }
}

/// Bridge settings, read from a TOML file. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub backend: Backend,
    /// Name the runtime shows for this application.
    pub application_name: String,
    pub local_addr: SocketAddr,
    /// Address of the teleoperation consumer.
    pub target_addr: SocketAddr,
    /// When false, states are only reported on the console.
    pub relay: bool,
    /// Upper bound on ticks per second; None follows the runtime frame rate.
    pub rate_hz: Option<f64>,
    pub frame: FrameConversion,
    /// Trigger travel that counts as a change worth reporting.
    pub trigger_threshold: f32,
    pub init_attempts: u32,
    pub init_retry_ms: u64,
    /// How long to wait for controllers after the session starts.
    pub warmup_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> BridgeConfig {
        BridgeConfig {
            backend: Backend::default(),
            application_name: "vr_bridge".into(),
            local_addr: SocketAddr::from(([0, 0, 0, 0], 11005)),
            target_addr: SocketAddr::from(([172, 28, 0, 5], 11005)),
            relay: true,
            rate_hz: None,
            frame: FrameConversion::Stage,
            trigger_threshold: 0.01,
            init_attempts: 10,
            init_retry_ms: 2000,
            warmup_ms: 5000,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<BridgeConfig, ConfigError> {
        let config = BridgeConfig::read(path)?;
        config.validate()?;
        Ok(config)
    }

    // Parses without validating, overrides may still fix the values.
    fn read(path: &Path) -> Result<BridgeConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: BridgeConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        Ok(config)
    }

    /// File settings (or defaults) with command line overrides applied.
    pub fn resolve(args: &CliArgs) -> Result<BridgeConfig, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => BridgeConfig::read(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(backend) = args.backend {
            config.backend = backend;
        }
        if let Some(local) = args.local {
            config.local_addr = local;
        }
        if let Some(target) = args.target {
            config.target_addr = target;
        }
        if args.no_relay {
            config.relay = false;
        }
        if let Some(rate) = args.rate {
            config.rate_hz = Some(rate);
        }
        if let Some(frame) = args.frame {
            config.frame = frame;
        }
        if let Some(attempts) = args.attempts {
            config.init_attempts = attempts;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rate) = self.rate_hz {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(ConfigError::Invalid(format!("rate_hz must be positive, got {}", rate)));
            }
            if Duration::try_from_secs_f64(1.0 / rate).is_err() {
                return Err(ConfigError::Invalid(format!("rate_hz {} is too low", rate)));
            }
        }
        if !(0.0..=1.0).contains(&self.trigger_threshold) {
            return Err(ConfigError::Invalid(format!(
                "trigger_threshold must be within [0, 1], got {}",
                self.trigger_threshold
            )));
        }
        if self.init_attempts == 0 {
            return Err(ConfigError::Invalid("init_attempts must be at least 1".into()));
        }
        if cfg!(not(feature = "openxr")) && self.backend == Backend::OpenXr {
            return Err(ConfigError::Invalid("built without the openxr backend".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.init_attempts,
            delay: Duration::from_millis(self.init_retry_ms),
        }
    }

    /// Minimum time between ticks. None without a usable rate limit.
    pub fn tick_period(&self) -> Option<Duration> {
        self.rate_hz
            .and_then(|rate| Duration::try_from_secs_f64(1.0 / rate).ok())
    }
}

#[derive(Debug, Parser)]
#[command(name = "run-vr-bridge", version, about = "Relay SteamVR controller poses to a teleoperation consumer over UDP")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(short, long, env = "VR_BRIDGE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// openxr or mock
    #[arg(long)]
    pub backend: Option<Backend>,

    /// Local address to bind the relay socket to
    #[arg(long, value_name = "ADDR")]
    pub local: Option<SocketAddr>,

    /// Address of the consumer
    #[arg(long, value_name = "ADDR")]
    pub target: Option<SocketAddr>,

    /// Only report controller states on the console
    #[arg(long)]
    pub no_relay: bool,

    /// Maximum ticks per second
    #[arg(long, value_name = "HZ")]
    pub rate: Option<f64>,

    /// Frame of the relayed poses: stage or z_up
    #[arg(long)]
    pub frame: Option<FrameConversion>,

    /// Initialization attempts before giving up
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Stop after this many seconds instead of running until the session exits
    #[arg(long, value_name = "SECS")]
    pub duration: Option<f64>,

    /// Increase log verbosity, repeatable
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// The `--duration` limit, if any.
    pub fn stop_after(&self) -> Result<Option<Duration>, ConfigError> {
        match self.duration {
            None => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs).map(Some).map_err(|_| {
                ConfigError::Invalid(format!("duration must be a non-negative number of seconds, got {}", secs))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_the_consumer_setup() {
        let config = BridgeConfig::default();
        assert_eq!(config.target_addr, "172.28.0.5:11005".parse().unwrap());
        assert_eq!(config.local_addr, "0.0.0.0:11005".parse().unwrap());
        assert!(config.relay);
        assert_eq!(config.tick_period(), None);
        config.validate().unwrap();
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            "backend = \"mock\"\ntarget_addr = \"127.0.0.1:9000\"\nrate_hz = 50.0\nframe = \"z_up\"\n",
        );
        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, Backend::Mock);
        assert_eq!(config.target_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.frame, FrameConversion::ZUp);
        assert_eq!(config.tick_period(), Some(Duration::from_millis(20)));
        assert_eq!(config.init_attempts, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("tagret_addr = \"127.0.0.1:9000\"\n");
        assert!(matches!(BridgeConfig::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = BridgeConfig::load(Path::new("/nonexistent/vr_bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn command_line_overrides_file() {
        let file = write_config("backend = \"mock\"\nrate_hz = 50.0\n");
        let path = file.path().to_str().unwrap().to_owned();
        let args = CliArgs::try_parse_from(&[
            "run-vr-bridge",
            "--config",
            path.as_str(),
            "--rate",
            "100",
            "--no-relay",
            "--frame",
            "z-up",
            "--target",
            "10.0.0.2:11005",
            "-vv",
        ])
        .unwrap();

        let config = BridgeConfig::resolve(&args).unwrap();
        assert_eq!(config.backend, Backend::Mock);
        assert_eq!(config.rate_hz, Some(100.0));
        assert!(!config.relay);
        assert_eq!(config.frame, FrameConversion::ZUp);
        assert_eq!(config.target_addr, "10.0.0.2:11005".parse().unwrap());
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = BridgeConfig::default();
        config.backend = Backend::Mock;
        config.rate_hz = Some(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.rate_hz = None;
        config.trigger_threshold = 1.5;
        assert!(config.validate().is_err());

        config.trigger_threshold = 0.1;
        config.init_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rate_too_low_for_a_tick_period_is_invalid() {
        let mut config = BridgeConfig::default();
        config.backend = Backend::Mock;
        config.rate_hz = Some(1e-30);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert_eq!(config.tick_period(), None);

        config.rate_hz = Some(0.5);
        config.validate().unwrap();
        assert_eq!(config.tick_period(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn duration_must_fit_a_time_span() {
        let args = CliArgs::try_parse_from(&["run-vr-bridge", "--duration", "1.5"]).unwrap();
        assert_eq!(args.stop_after().unwrap(), Some(Duration::from_millis(1500)));

        let args = CliArgs::try_parse_from(&["run-vr-bridge", "--duration", "1e30"]).unwrap();
        assert!(matches!(args.stop_after(), Err(ConfigError::Invalid(_))));

        let args = CliArgs::try_parse_from(&["run-vr-bridge", "--duration=-2"]).unwrap();
        assert!(args.stop_after().is_err());

        let args = CliArgs::try_parse_from(&["run-vr-bridge"]).unwrap();
        assert_eq!(args.stop_after().unwrap(), None);
    }

    #[test]
    fn unknown_backend_is_rejected_by_the_parser() {
        assert!(CliArgs::try_parse_from(&["run-vr-bridge", "--backend", "openvr"]).is_err());
    }
}
