mod channel_reference;
mod new_subscription;
mod rider_email;
mod route_id;
mod stop_id;
mod subscription;
mod subscription_status;

pub use channel_reference::ChannelReference;
pub use new_subscription::{EmailChange, NewSubscription, SubscribeRequest};
pub use rider_email::RiderEmail;
pub use route_id::RouteId;
pub use stop_id::{RawStopId, StopId};
pub use subscription::{Subscription, SubscriptionKey};
pub use subscription_status::SubscriptionStatus;
