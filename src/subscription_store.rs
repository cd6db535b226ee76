use crate::{
    domain::{
        ChannelReference, RiderEmail, RouteId, StopId, Subscription, SubscriptionKey,
        SubscriptionStatus,
    },
    transit_client::Prediction,
};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Persistence for subscription records and the latest route predictions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts the record, overwriting any record with the same key.
    async fn create(&self, subscription: &Subscription) -> Result<(), anyhow::Error>;

    async fn list(&self) -> Result<Vec<Subscription>, anyhow::Error>;

    async fn list_by_email(&self, email: &RiderEmail) -> Result<Vec<Subscription>, anyhow::Error>;

    /// Returns whether a record was removed. A missing key is not an error.
    async fn delete(&self, key: &SubscriptionKey) -> Result<bool, anyhow::Error>;

    /// Distinct routes with at least one record.
    async fn routes(&self) -> Result<Vec<RouteId>, anyhow::Error>;

    async fn log_prediction(
        &self,
        route: &RouteId,
        stop_id: &StopId,
        prediction: &Prediction,
    ) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct PgSubscriptionStore {
    db_pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    #[tracing::instrument(
        name = "Saving subscription record",
        skip_all,
        fields(email = %subscription.email, route = %subscription.route)
    )]
    async fn create(&self, subscription: &Subscription) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (email, route, stop_id, subscription_reference, status, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email, route) DO UPDATE SET
                stop_id = EXCLUDED.stop_id,
                subscription_reference = EXCLUDED.subscription_reference,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subscription.email.as_ref())
        .bind(subscription.route.as_ref())
        .bind(subscription.stop_id.as_ref())
        .bind(subscription.subscription_reference.as_ref())
        .bind(subscription.status.as_ref())
        .bind(subscription.timestamp)
        .execute(&self.db_pool)
        .await
        .context("Failed to save subscription record")?;

        Ok(())
    }

    #[tracing::instrument(name = "Listing subscription records", skip_all)]
    async fn list(&self) -> Result<Vec<Subscription>, anyhow::Error> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT email, route, stop_id, subscription_reference, status, updated_at
            FROM subscriptions
            ORDER BY email, route
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to fetch subscription records")?;

        Ok(parse_rows(rows))
    }

    #[tracing::instrument(name = "Listing subscription records by email", skip_all, fields(email = %email))]
    async fn list_by_email(&self, email: &RiderEmail) -> Result<Vec<Subscription>, anyhow::Error> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT email, route, stop_id, subscription_reference, status, updated_at
            FROM subscriptions
            WHERE email = $1
            ORDER BY route
            "#,
        )
        .bind(email.as_ref())
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to fetch subscription records for email")?;

        Ok(parse_rows(rows))
    }

    #[tracing::instrument(
        name = "Deleting subscription record",
        skip_all,
        fields(email = %key.email, route = %key.route)
    )]
    async fn delete(&self, key: &SubscriptionKey) -> Result<bool, anyhow::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM subscriptions
            WHERE email = $1 AND route = $2
            "#,
        )
        .bind(key.email.as_ref())
        .bind(key.route.as_ref())
        .execute(&self.db_pool)
        .await
        .context("Failed to delete subscription record")?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "Listing subscribed routes", skip_all)]
    async fn routes(&self) -> Result<Vec<RouteId>, anyhow::Error> {
        let routes: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT route FROM subscriptions ORDER BY route")
                .fetch_all(&self.db_pool)
                .await
                .context("Failed to fetch subscribed routes")?;

        Ok(routes
            .into_iter()
            .filter_map(|route| match RouteId::parse(route) {
                Ok(route) => Some(route),
                Err(e) => {
                    tracing::warn!(error.message = %e, "Skipping a stored route. It is invalid");
                    None
                }
            })
            .collect())
    }

    #[tracing::instrument(name = "Logging prediction", skip_all, fields(route = %route, stop_id = %stop_id))]
    async fn log_prediction(
        &self,
        route: &RouteId,
        stop_id: &StopId,
        prediction: &Prediction,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO predictions
                (route, stop_id, arrival_time, minutes_away, stops_away, miles_away, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (route) DO UPDATE SET
                stop_id = EXCLUDED.stop_id,
                arrival_time = EXCLUDED.arrival_time,
                minutes_away = EXCLUDED.minutes_away,
                stops_away = EXCLUDED.stops_away,
                miles_away = EXCLUDED.miles_away,
                recorded_at = EXCLUDED.recorded_at
            "#,
        )
        .bind(route.as_ref())
        .bind(stop_id.as_ref())
        .bind(prediction.arrival_time)
        .bind(prediction.minutes_away)
        .bind(prediction.stops_away)
        .bind(prediction.miles_away)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db_pool)
        .await
        .context("Failed to log prediction")?;

        Ok(())
    }
}

#[derive(FromRow)]
struct SubscriptionRow {
    email: String,
    route: String,
    stop_id: String,
    subscription_reference: String,
    status: String,
    updated_at: OffsetDateTime,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = String;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            email: RiderEmail::parse(row.email)?,
            route: RouteId::parse(row.route)?,
            stop_id: StopId::parse(row.stop_id)?,
            subscription_reference: ChannelReference::parse(row.subscription_reference),
            status: SubscriptionStatus::try_from(row.status)?,
            timestamp: row.updated_at,
        })
    }
}

fn parse_rows(rows: Vec<SubscriptionRow>) -> Vec<Subscription> {
    rows.into_iter()
        .filter_map(|row| match Subscription::try_from(row) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(
                    error.message = %e,
                    "Skipping a subscription record. Its stored details are invalid"
                );
                None
            }
        })
        .collect()
}
