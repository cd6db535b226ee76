use serde::{Deserialize, Serialize};

const MAX_LENGTH: usize = 32;

/// Stop identifiers arrive either as JSON strings or as JSON integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawStopId {
    Number(u64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    pub fn parse(s: String) -> Result<StopId, String> {
        let s = s.trim().to_string();

        if s.is_empty() {
            Err("stop_id is required and must be a string or integer".into())
        } else if s.len() > MAX_LENGTH {
            Err(format!("`{s}` is longer than {MAX_LENGTH} characters"))
        } else if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            Err(format!(
                "`{s}` may only contain ASCII letters, digits, `_` and `-`"
            ))
        } else {
            Ok(Self(s))
        }
    }
}

impl TryFrom<RawStopId> for StopId {
    type Error = String;

    fn try_from(raw: RawStopId) -> Result<Self, Self::Error> {
        match raw {
            RawStopId::Number(n) => Self::parse(n.to_string()),
            RawStopId::Text(s) => Self::parse(s),
        }
    }
}

impl AsRef<str> for StopId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
