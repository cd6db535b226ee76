use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::validate_email;

/// Requires a dotted domain, which `validate_email` alone does not.
static DOTTED_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex is valid"));

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RiderEmail(String);

impl RiderEmail {
    pub fn parse(s: String) -> Result<RiderEmail, String> {
        let s = s.trim().to_string();

        if s.is_empty() {
            Err("email is required and must be a string".into())
        } else if validate_email(&s) && DOTTED_DOMAIN.is_match(&s) {
            Ok(Self(s))
        } else {
            Err(format!("`{s}` is not a valid email"))
        }
    }
}

impl AsRef<str> for RiderEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RiderEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
