use std::fmt;

/// Environment variable selecting where trace records go.
pub const SINK_ENV: &str = "THREADSCOPE_SINK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkTarget {
    #[default]
    Stdout,
    Stderr,
    Off,
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
            Self::Off => write!(f, "off"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceConfig {
    pub sink: SinkTarget,
}

impl TraceConfig {
    pub fn from_env() -> Self {
        let value = std::env::var(SINK_ENV).ok();
        Self::from_value(value.as_deref())
    }

    /// Parses a raw `THREADSCOPE_SINK` value. Unknown values fall back to stdout.
    pub fn from_value(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        let sink = match raw.to_ascii_lowercase().as_str() {
            "stdout" | "1" => SinkTarget::Stdout,
            "stderr" => SinkTarget::Stderr,
            "off" | "none" | "0" => SinkTarget::Off,
            _ => {
                tracing::warn!(
                    value = raw,
                    "unrecognized {SINK_ENV} value, tracing to stdout"
                );
                SinkTarget::Stdout
            }
        };
        Self { sink }
    }
}
