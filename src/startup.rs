use crate::{
    app_state::AppState,
    configuration::{DatabaseSettings, Settings},
    notification_channel::{NotificationChannel, SnsNotificationChannel},
    request_id::{RequestUuid, X_REQUEST_ID},
    routes::{
        cancelled, delay, email, health_check, prediction, status, subscribe, subscription,
        unsubscribe,
    },
    subscription_service::SubscriptionService,
    subscription_store::{PgSubscriptionStore, SubscriptionStore},
    telemetry::request_span,
    transit_client::TransitClient,
    utils::{method_not_allowed, not_found},
};
use anyhow::Context;
use axum::{http::HeaderName, Router};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub struct Application {
    listener: TcpListener,
    router: Router,
    address: SocketAddr,
}

impl Application {
    /// Wires the Postgres store and the SNS channel from `config`.
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let store = Arc::new(PgSubscriptionStore::new(get_connection_pool(
            &config.database,
        )));
        let channel = Arc::new(SnsNotificationChannel::from_settings(&config.notifications).await);

        Self::build_with(config, store, channel).await
    }

    pub async fn build_with(
        config: Settings,
        store: Arc<dyn SubscriptionStore>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Result<Self, anyhow::Error> {
        let transit_client =
            TransitClient::new(&config.transit).context("Failed to build the transit client")?;

        tracing::info!(
            delay_threshold_minutes = config.alerts.delay_threshold_minutes,
            vehicle_delay_threshold = config.alerts.vehicle_delay_threshold,
            max_subscriptions = config.alerts.max_subscriptions,
            max_retries = config.alerts.max_retries,
            retry_delay_seconds = config.alerts.retry_delay_seconds,
            "Loaded alert settings"
        );

        let app_state = AppState {
            subscriptions: SubscriptionService::new(
                store.clone(),
                channel,
                config.alerts.max_subscriptions,
            ),
            store,
            transit_client,
            alerts: config.alerts,
        };

        let listener = TcpListener::bind(format!(
            "{}:{}",
            config.application.host, config.application.port
        ))
        .await
        .context("Failed to bind address")?;
        let address = listener
            .local_addr()
            .context("Failed to get local address")?;

        Ok(Self {
            listener,
            router: router(app_state),
            address,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!("Listening on {}", self.address);
        axum::serve(self.listener, self.router).await
    }
}

pub fn get_connection_pool(config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(config.with_db())
}

fn router(app_state: AppState) -> Router {
    let x_request_id = HeaderName::from_static(X_REQUEST_ID);

    Router::new()
        .merge(health_check::router())
        .merge(subscribe::router())
        .merge(status::router())
        .merge(email::router())
        .merge(unsubscribe::router())
        .merge(subscription::router())
        .merge(delay::router())
        .merge(prediction::router())
        .merge(cancelled::router())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), RequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .with_state(app_state)
}
