use anyhow::{Result, bail};
use serde::Serialize;
use std::str::FromStr;

/// Output format for command summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable lines with `[OK]`/`[WARN]` markers
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid format '{s}'. Use: text or json"),
        }
    }
}

impl OutputFormat {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Serialize data to the requested format
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(data)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}")),
            Self::Text => {
                // Text output is rendered by each command
                bail!("Text format should not use serialize()")
            }
        }
    }

    /// Print `data` as JSON, or run `text` to print the human form.
    pub fn emit<T: Serialize>(self, data: &T, text: impl FnOnce()) -> Result<()> {
        if self.is_json() {
            println!("{}", self.serialize(data)?);
        } else {
            text();
        }
        Ok(())
    }
}
