use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::parse::error::OptionsError;

/// Default time to wait for a parse job before giving up.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Longest wait accepted for a single parse job (one day).
pub const MAX_TIMEOUT_SECONDS: u64 = 86_400;

/// Declares an option enum whose only valid values are its wire strings.
/// Parsing is case-insensitive and serde goes through the same check.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Wire values, for error messages and JSON schemas.
            pub fn wire_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = OptionsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| OptionsError::InvalidValue {
                        field: $field,
                        value: s.to_string(),
                        expected: Self::wire_values().join(", "),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum! {
    /// How extracted content is split into chunks.
    ChunkingStrategy, "chunking_strategy" {
        None => "none",
        Page => "page",
        Section => "section",
        Fragment => "fragment",
    }
}

wire_enum! {
    /// Table recognition algorithm: structured table recognition for clean
    /// grids, a vision-language model for complex or borderless tables.
    TableParsingFormat, "table_parsing_format" {
        Tsr => "tsr",
        Vlm => "vlm",
    }
}

wire_enum! {
    TableOutputMode, "table_output_mode" {
        Markdown => "markdown",
        Html => "html",
    }
}

/// Options for a single document parse. Built per call and forwarded to the
/// service as `parsing_options` and `enrichment_options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentParserOptions {
    pub chunking_strategy: Option<ChunkingStrategy>,
    pub table_parsing_format: TableParsingFormat,
    pub table_output_mode: TableOutputMode,
    pub table_summarization: bool,
    pub table_summarization_prompt: Option<String>,
    pub figure_summarization: bool,
    pub figure_summarization_prompt: Option<String>,
    /// Pages to parse, e.g. "1-5" or "1,3,5". All pages when unset.
    pub page_range: Option<String>,
    pub skew_detection: bool,
    pub disable_layout_detection: bool,
    pub signature_detection: bool,
    pub remove_strikethrough_lines: bool,
    pub timeout_seconds: u64,
}

impl Default for DocumentParserOptions {
    fn default() -> Self {
        Self {
            chunking_strategy: Some(ChunkingStrategy::Page),
            table_parsing_format: TableParsingFormat::Vlm,
            table_output_mode: TableOutputMode::Markdown,
            table_summarization: false,
            table_summarization_prompt: None,
            figure_summarization: false,
            figure_summarization_prompt: None,
            page_range: None,
            skew_detection: false,
            disable_layout_detection: false,
            signature_detection: false,
            remove_strikethrough_lines: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// The `parsing_options` object of a parse request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunking_strategy: Option<ChunkingStrategy>,
    pub table_parsing_format: TableParsingFormat,
    pub table_output_mode: TableOutputMode,
    pub disable_layout_detection: bool,
    pub skew_detection: bool,
    pub signature_detection: bool,
    pub remove_strikethrough_lines: bool,
}

/// The `enrichment_options` object of a parse request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentOptions {
    pub table_summarization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_summarization_prompt: Option<String>,
    pub figure_summarization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure_summarization_prompt: Option<String>,
}

impl DocumentParserOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.timeout_seconds == 0 {
            return Err(OptionsError::ZeroTimeout);
        }
        if self.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(OptionsError::TimeoutTooLarge {
                seconds: self.timeout_seconds,
                max: MAX_TIMEOUT_SECONDS,
            });
        }

        if let Some(ref range) = self.page_range {
            validate_page_range(range)?;
        }

        for (field, prompt) in [
            ("table_summarization_prompt", &self.table_summarization_prompt),
            ("figure_summarization_prompt", &self.figure_summarization_prompt),
        ] {
            if prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(OptionsError::BlankPrompt(field));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn parsing_options(&self) -> ParsingOptions {
        ParsingOptions {
            chunking_strategy: self.chunking_strategy,
            table_parsing_format: self.table_parsing_format,
            table_output_mode: self.table_output_mode,
            disable_layout_detection: self.disable_layout_detection,
            skew_detection: self.skew_detection,
            signature_detection: self.signature_detection,
            remove_strikethrough_lines: self.remove_strikethrough_lines,
        }
    }

    pub fn enrichment_options(&self) -> EnrichmentOptions {
        EnrichmentOptions {
            table_summarization: self.table_summarization,
            table_summarization_prompt: self.table_summarization_prompt.clone(),
            figure_summarization: self.figure_summarization,
            figure_summarization_prompt: self.figure_summarization_prompt.clone(),
        }
    }
}

/// Accepts comma-separated pages and inclusive ranges: "3", "1-5", "1,3,7-9".
fn validate_page_range(range: &str) -> Result<(), OptionsError> {
    let invalid = || OptionsError::InvalidPageRange(range.to_string());

    if range.trim().is_empty() {
        return Err(invalid());
    }

    for part in range.split(',') {
        let part = part.trim();
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (start.trim(), end.trim()),
            None => (part, part),
        };

        let (Some(start), Some(end)) = (page_number(start), page_number(end)) else {
            return Err(invalid());
        };
        if start == 0 || start > end {
            return Err(invalid());
        }
    }

    Ok(())
}

/// Plain decimal page number; signs and whitespace inside the number are rejected.
fn page_number(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
