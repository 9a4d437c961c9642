//! Application version descriptors (`name:platform:version`).
//!
//! Every Cauldron record is keyed by a descriptor naming the native
//! application, the mobile platform and the application version.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Mobile platform of a native application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => bail!("unknown platform `{}`; expected `android` or `ios`", other),
        }
    }
}

/// Fully qualified application version: `name:platform:version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppDescriptor {
    name: String,
    platform: Platform,
    version: String,
}

impl AppDescriptor {
    pub fn new(name: impl Into<String>, platform: Platform, version: impl Into<String>) -> Self {
        AppDescriptor {
            name: name.into(),
            platform,
            version: version.into(),
        }
    }

    /// Parse a `name:platform:version` descriptor.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let [name, platform, version] = parts.as_slice() else {
            bail!(
                "invalid application descriptor `{}`; expected `name:platform:version`",
                s
            );
        };

        if name.is_empty() || version.is_empty() {
            bail!("invalid application descriptor `{}`: empty name or version", s);
        }

        Ok(AppDescriptor {
            name: name.to_string(),
            platform: platform.parse()?,
            version: version.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for AppDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.platform, self.version)
    }
}

impl FromStr for AppDescriptor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        AppDescriptor::parse(s)
    }
}
