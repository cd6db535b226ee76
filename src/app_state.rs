use crate::{
    configuration::AlertSettings, subscription_service::SubscriptionService,
    subscription_store::SubscriptionStore, transit_client::TransitClient,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub subscriptions: SubscriptionService,
    pub store: Arc<dyn SubscriptionStore>,
    pub transit_client: TransitClient,
    pub alerts: AlertSettings,
}
