use super::{ChannelReference, RiderEmail, RouteId, StopId, SubscriptionStatus};
use serde::Serialize;
use time::OffsetDateTime;

/// A persisted subscription, keyed by `(email, route)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Subscription {
    pub email: RiderEmail,
    pub route: RouteId,
    pub stop_id: StopId,
    pub subscription_reference: ChannelReference,
    pub status: SubscriptionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Subscription {
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey {
            email: self.email.clone(),
            route: self.route.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey {
    pub email: RiderEmail,
    pub route: RouteId,
}
