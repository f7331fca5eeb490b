//! Color theme preference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal color theme. Toggling cycles light → dark → futuristic → light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Futuristic,
}

impl Theme {
    /// The theme that follows this one in the toggle cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Futuristic,
            Self::Futuristic => Self::Light,
        }
    }

    /// Name of the bundled syntect theme used to highlight code.
    pub fn syntax_theme(self) -> &'static str {
        match self {
            Self::Light => "InspiredGitHub",
            Self::Dark => "base16-ocean.dark",
            Self::Futuristic => "base16-mocha.dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Futuristic => "futuristic",
        };
        f.write_str(s)
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "futuristic" => Ok(Self::Futuristic),
            _ => Err(format!("invalid theme: {s}")),
        }
    }
}
