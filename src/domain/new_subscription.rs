use super::{RawStopId, RiderEmail, RouteId, StopId};
use serde::Deserialize;

#[derive(Debug)]
pub struct NewSubscription {
    pub email: RiderEmail,
    pub route: RouteId,
    pub stop_id: StopId,
}

/// Body of `POST /subscribe`; every field is optional so that a missing one
/// is reported as a validation message instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub route: Option<String>,
    pub stop_id: Option<RawStopId>,
    pub email: Option<String>,
}

impl TryFrom<SubscribeRequest> for NewSubscription {
    type Error = String;

    fn try_from(request: SubscribeRequest) -> Result<Self, Self::Error> {
        let route = RouteId::parse(request.route.unwrap_or_default())?;
        let stop_id = match request.stop_id {
            Some(raw) => StopId::try_from(raw)?,
            None => StopId::parse(String::new())?,
        };
        let email = RiderEmail::parse(request.email.unwrap_or_default())?;

        Ok(Self {
            email,
            route,
            stop_id,
        })
    }
}

/// Re-pointing a rider from one address to another.
#[derive(Debug)]
pub struct EmailChange {
    pub old_email: RiderEmail,
    pub new_email: RiderEmail,
}

impl EmailChange {
    pub fn new(old_email: RiderEmail, new_email: RiderEmail) -> Result<Self, String> {
        if old_email == new_email {
            Err("new_email must differ from old_email".into())
        } else {
            Ok(Self {
                old_email,
                new_email,
            })
        }
    }
}
