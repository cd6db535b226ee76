use once_cell::sync::Lazy;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 32;

static FORBIDDEN_CHARS: [char; 10] = ['<', '>', '\'', '"', '\\', '(', ')', '{', '}', '/'];
static FORBIDDEN_CHARS_STRING: Lazy<String> = Lazy::new(|| String::from_iter(FORBIDDEN_CHARS));

/// Bus line reference as the transit feed knows it, e.g. `M15` or `MTA NYCT_B46+`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    pub fn parse(s: String) -> Result<RouteId, String> {
        let s = s.trim().to_string();

        match s {
            _ if s.is_empty() => Err("route is required and must be a string".into()),
            _ if s.graphemes(true).count() > MAX_GRAPHEMES => {
                Err(format!("`{s}` is longer than {MAX_GRAPHEMES} graphemes"))
            }
            _ if s
                .chars()
                .any(|c| c.is_control() || FORBIDDEN_CHARS.contains(&c)) =>
            {
                Err(format!(
                    "`{s}` contains at least one of forbidden characters: {}",
                    *FORBIDDEN_CHARS_STRING
                ))
            }
            _ => Ok(Self(s)),
        }
    }
}

impl AsRef<str> for RouteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
