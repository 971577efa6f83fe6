//! `get-colors-for-mood` arguments and schema.

use std::ops::RangeInclusive;

use serde_json::{Value, json};

use crate::error::InputError;

/// Name the tool is registered under.
pub const TOOL_NAME: &str = "get-colors-for-mood";

/// Colors returned when the caller does not ask for a number.
pub const DEFAULT_COUNT: u32 = 1;

const MIN_COUNT: i64 = 1;

/// A validated request for mood colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRequest {
    pub mood: String,
    pub count: u32,
}

impl ColorRequest {
    pub fn new(mood: impl Into<String>, count: u32) -> Self {
        Self {
            mood: mood.into(),
            count,
        }
    }

    /// Validate raw tool arguments.
    ///
    /// `mood` must be a non-empty string and `count`, when given, an
    /// integer of at least 1. Counts beyond `u32::MAX` saturate.
    pub fn from_arguments(arguments: &Value) -> Result<Self, InputError> {
        let object = arguments.as_object().ok_or(InputError::NotAnObject)?;

        let mood = object
            .get("mood")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(InputError::MissingMood)?;

        let count = match object.get("count") {
            None | Some(Value::Null) => DEFAULT_COUNT,
            Some(value) => match value.as_i64() {
                Some(n) if n >= MIN_COUNT => u32::try_from(n).unwrap_or(u32::MAX),
                None if value.as_u64().is_some() => u32::MAX,
                _ => {
                    return Err(InputError::CountOutOfRange {
                        min: MIN_COUNT,
                        got: value.to_string(),
                    });
                }
            },
        };

        Ok(Self::new(mood, count))
    }

    /// Copy of this request with `count` forced into `range`.
    pub fn clamped(&self, range: &RangeInclusive<u32>) -> Self {
        Self {
            mood: self.mood.clone(),
            count: self.count.clamp(*range.start(), *range.end()),
        }
    }
}

/// JSON schema advertised for the tool, with an optional upper bound on `count`.
pub fn input_schema(max_count: Option<u32>) -> Value {
    let mut count = json!({
        "type": "integer",
        "description": "Number of colors to return",
        "minimum": MIN_COUNT,
        "default": DEFAULT_COUNT,
    });
    if let Some(max) = max_count {
        count["maximum"] = json!(max);
    }

    json!({
        "type": "object",
        "properties": {
            "mood": {
                "type": "string",
                "description": "The mood to find colors for (e.g. happy, calm, energetic)",
            },
            "count": count,
        },
        "required": ["mood"],
    })
}
