use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compile target, e.g. `opencl -device=adreno`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Target {
    kind: String,
    device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TargetError {
    pub message: String,
}

impl Target {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            device: None,
        }
    }

    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Registry lookup keys, most specific first.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(2);
        if let Some(device) = self.device.as_deref() {
            keys.push(device);
        }
        keys.push(self.kind.as_str());
        keys
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)?;
        if let Some(device) = &self.device {
            write!(f, " -device={device}")?;
        }
        Ok(())
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut tokens = text.split_whitespace();
        let kind = tokens
            .next()
            .filter(|kind| !kind.starts_with('-'))
            .ok_or_else(|| TargetError {
                message: format!("target '{text}' must start with a target kind"),
            })?;

        let mut target = Target::new(kind);
        for token in tokens {
            match token.strip_prefix("-device=") {
                Some(device) if !device.is_empty() => target.device = Some(device.to_string()),
                _ => {
                    return Err(TargetError {
                        message: format!("unsupported target option '{token}' in '{text}'"),
                    });
                }
            }
        }
        Ok(target)
    }
}

impl TryFrom<String> for Target {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}
