use crate::{
    domain::{
        ChannelReference, EmailChange, NewSubscription, RiderEmail, RouteId, Subscription,
        SubscriptionKey, SubscriptionStatus,
    },
    notification_channel::NotificationChannel,
    subscription_store::SubscriptionStore,
};
use anyhow::Context;
use std::{collections::BTreeSet, sync::Arc};
use time::OffsetDateTime;

pub const CONFIRMED_SUBJECT: &str = "Subscription Confirmed";
pub const CONFIRMED_MESSAGE: &str = "You're subscribed to Transit Alerts!";

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Subscription limit reached.")]
    LimitReached,
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Keeps subscription records and channel endpoints loosely in step.
///
/// Nothing here is transactional: a failure halfway through a multi-step
/// operation leaves whatever was already written in place.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    channel: Arc<dyn NotificationChannel>,
    max_subscriptions: usize,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        channel: Arc<dyn NotificationChannel>,
        max_subscriptions: usize,
    ) -> Self {
        Self {
            store,
            channel,
            max_subscriptions,
        }
    }

    #[tracing::instrument(
        name = "Subscribing rider",
        skip_all,
        fields(email = %new_subscription.email, route = %new_subscription.route)
    )]
    pub async fn subscribe(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<Subscription, SubscriptionError> {
        let existing = self
            .store
            .list_by_email(&new_subscription.email)
            .await
            .context("Failed to count the rider's subscriptions")?;

        if existing.len() >= self.max_subscriptions {
            tracing::info!(
                subscriptions = existing.len(),
                "Rider is at the subscription limit"
            );
            return Err(SubscriptionError::LimitReached);
        }

        let reference = self
            .channel
            .subscribe(&new_subscription.email)
            .await
            .context("Failed to subscribe the rider to the notification channel")?;

        let subscription = Subscription {
            status: SubscriptionStatus::from(&reference),
            subscription_reference: reference,
            email: new_subscription.email,
            route: new_subscription.route,
            stop_id: new_subscription.stop_id,
            timestamp: OffsetDateTime::now_utc(),
        };

        self.store
            .create(&subscription)
            .await
            .context("Failed to save the subscription record")?;

        if subscription.status == SubscriptionStatus::Confirmed {
            self.publish_best_effort(CONFIRMED_MESSAGE, CONFIRMED_SUBJECT)
                .await;
        }

        Ok(subscription)
    }

    #[tracing::instrument(name = "Unsubscribing rider", skip_all, fields(email = %email))]
    pub async fn unsubscribe(&self, email: &RiderEmail) -> Result<(), SubscriptionError> {
        let records = self
            .store
            .list_by_email(email)
            .await
            .context("Failed to look up the rider's subscription records")?;
        let live_references = self.live_references(email, &records).await?;

        if live_references.is_empty() && records.is_empty() {
            return Err(SubscriptionError::NotFound(format!(
                "No active subscription found for {email}."
            )));
        }

        for reference in &live_references {
            self.unsubscribe_best_effort(reference).await;
        }

        for record in &records {
            self.store
                .delete(&record.key())
                .await
                .context("Failed to delete a subscription record")?;
        }

        Ok(())
    }

    /// Moves every record of the old address to the new one, as pending.
    ///
    /// A route the new address already holds keeps its existing record; only
    /// the old one is dropped. Returns how many records were moved.
    #[tracing::instrument(
        name = "Changing rider email",
        skip_all,
        fields(old_email = %change.old_email, new_email = %change.new_email)
    )]
    pub async fn update_email(&self, change: EmailChange) -> Result<usize, SubscriptionError> {
        let records = self
            .store
            .list_by_email(&change.old_email)
            .await
            .context("Failed to look up the rider's subscription records")?;

        if records.is_empty() {
            return Err(SubscriptionError::NotFound(format!(
                "No subscriptions found for {}.",
                change.old_email
            )));
        }

        for reference in &self.live_references(&change.old_email, &records).await? {
            self.unsubscribe_best_effort(reference).await;
        }

        let held_by_new_email: BTreeSet<RouteId> = self
            .store
            .list_by_email(&change.new_email)
            .await
            .context("Failed to look up the new address's subscription records")?
            .into_iter()
            .map(|record| record.route)
            .collect();

        let mut moved = 0;
        for record in &records {
            if held_by_new_email.contains(&record.route) {
                tracing::info!(
                    route = %record.route,
                    "New address already holds this route. Keeping its record"
                );
            } else {
                let reference = match self.channel.subscribe(&change.new_email).await {
                    Ok(reference) => reference,
                    Err(e) => {
                        tracing::warn!(
                            error.cause_chain = ?e,
                            "Failed to subscribe the new email. Recording it as pending"
                        );
                        ChannelReference::Pending
                    }
                };

                let replacement = Subscription {
                    email: change.new_email.clone(),
                    route: record.route.clone(),
                    stop_id: record.stop_id.clone(),
                    subscription_reference: reference,
                    status: SubscriptionStatus::Pending,
                    timestamp: OffsetDateTime::now_utc(),
                };

                self.store
                    .create(&replacement)
                    .await
                    .context("Failed to save the replacement subscription record")?;
                moved += 1;
            }

            self.store
                .delete(&record.key())
                .await
                .context("Failed to delete the old subscription record")?;
        }

        Ok(moved)
    }

    /// Removes one record without touching the notification channel.
    #[tracing::instrument(name = "Removing subscription record", skip_all, fields(email = %key.email, route = %key.route))]
    pub async fn remove_record(&self, key: &SubscriptionKey) -> Result<(), SubscriptionError> {
        let removed = self
            .store
            .delete(key)
            .await
            .context("Failed to delete the subscription record")?;

        if removed {
            Ok(())
        } else {
            Err(SubscriptionError::NotFound(format!(
                "No subscription found for route {}.",
                key.route
            )))
        }
    }

    /// Lists records and re-sends a delay notice for every confirmed one.
    #[tracing::instrument(name = "Reporting subscription status", skip(self))]
    pub async fn status(
        &self,
        email: Option<&RiderEmail>,
        delay_threshold_minutes: u32,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        let subscriptions = match email {
            Some(email) => self.store.list_by_email(email).await,
            None => self.store.list().await,
        }
        .context("Failed to list subscription records")?;

        for subscription in subscriptions
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Confirmed)
        {
            self.publish_best_effort(
                &delay_notice(&subscription.route, delay_threshold_minutes),
                &format!("Delay Alert for Route {}", subscription.route),
            )
            .await;
        }

        Ok(subscriptions)
    }

    pub async fn publish_best_effort(&self, message: &str, subject: &str) {
        if let Err(e) = self.channel.publish(message, subject).await {
            tracing::warn!(error.cause_chain = ?e, subject, "Failed to publish a notification");
        }
    }

    /// Live channel references for `email`, as listed by the channel and as
    /// stored in its records. Records keep the reference they were written
    /// with, so a rider who confirmed later only shows up in the listing.
    async fn live_references(
        &self,
        email: &RiderEmail,
        records: &[Subscription],
    ) -> Result<BTreeSet<String>, anyhow::Error> {
        let channel_references = self
            .channel
            .list_by_email(email)
            .await
            .context("Failed to look up the rider's channel subscriptions")?;

        Ok(channel_references
            .iter()
            .chain(records.iter().map(|record| &record.subscription_reference))
            .filter_map(|reference| reference.live().map(str::to_string))
            .collect())
    }

    async fn unsubscribe_best_effort(&self, reference: &str) {
        if let Err(e) = self.channel.unsubscribe(reference).await {
            tracing::warn!(
                error.cause_chain = ?e,
                reference,
                "Failed to remove a channel subscription. Continuing"
            );
        }
    }
}

pub fn delay_notice(route: &RouteId, delay_minutes: u32) -> String {
    format!("Route {route} is experiencing delays of about {delay_minutes} minutes.")
}
