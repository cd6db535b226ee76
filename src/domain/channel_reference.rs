/// Sentinel written in place of a reference until the rider confirms.
const PENDING_SENTINEL: &str = "PendingConfirmation";

/// Identifier the notification channel hands out for one email endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelReference {
    Pending,
    Live(String),
}

impl ChannelReference {
    /// The channel spells "pending" in several ways, so normalize before comparing.
    pub fn parse(s: String) -> ChannelReference {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        if normalized.is_empty() || normalized == "pendingconfirmation" {
            ChannelReference::Pending
        } else {
            ChannelReference::Live(s)
        }
    }

    pub fn live(&self) -> Option<&str> {
        match self {
            ChannelReference::Pending => None,
            ChannelReference::Live(reference) => Some(reference),
        }
    }
}

impl AsRef<str> for ChannelReference {
    fn as_ref(&self) -> &str {
        match self {
            ChannelReference::Pending => PENDING_SENTINEL,
            ChannelReference::Live(reference) => reference,
        }
    }
}

impl serde::Serialize for ChannelReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_ref())
    }
}
