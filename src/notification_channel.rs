use crate::{
    configuration::NotificationSettings,
    domain::{ChannelReference, RiderEmail},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_config::{timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_sns::{config::Region, Client};

/// An email pub/sub topic whose endpoints confirm asynchronously.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Requests a new email endpoint. Usually answers with a pending reference.
    async fn subscribe(&self, email: &RiderEmail) -> Result<ChannelReference, anyhow::Error>;

    async fn unsubscribe(&self, reference: &str) -> Result<(), anyhow::Error>;

    async fn list_by_email(&self, email: &RiderEmail)
        -> Result<Vec<ChannelReference>, anyhow::Error>;

    /// Broadcasts to every confirmed endpoint on the topic.
    async fn publish(&self, message: &str, subject: &str) -> Result<(), anyhow::Error>;
}

pub struct SnsNotificationChannel {
    sns_client: Client,
    topic_arn: String,
}

impl SnsNotificationChannel {
    pub fn new(sns_client: Client, topic_arn: String) -> Self {
        Self {
            sns_client,
            topic_arn,
        }
    }

    pub async fn from_settings(settings: &NotificationSettings) -> Self {
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(settings.timeout())
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeout_config);
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let shared_config = loader.load().await;

        Self::new(Client::new(&shared_config), settings.topic_arn.clone())
    }
}

#[async_trait]
impl NotificationChannel for SnsNotificationChannel {
    #[tracing::instrument(name = "Subscribing email to topic", skip_all, fields(email = %email))]
    async fn subscribe(&self, email: &RiderEmail) -> Result<ChannelReference, anyhow::Error> {
        let output = self
            .sns_client
            .subscribe()
            .topic_arn(&self.topic_arn)
            .protocol("email")
            .endpoint(email.as_ref())
            .send()
            .await
            .context("Failed to subscribe email to topic")?;

        // Email endpoints answer "pending confirmation" until the rider confirms.
        Ok(output
            .subscription_arn()
            .map(|arn| ChannelReference::parse(arn.to_string()))
            .unwrap_or(ChannelReference::Pending))
    }

    #[tracing::instrument(name = "Unsubscribing reference from topic", skip(self))]
    async fn unsubscribe(&self, reference: &str) -> Result<(), anyhow::Error> {
        self.sns_client
            .unsubscribe()
            .subscription_arn(reference)
            .send()
            .await
            .context("Failed to unsubscribe reference from topic")?;

        Ok(())
    }

    #[tracing::instrument(name = "Listing topic subscriptions by email", skip_all, fields(email = %email))]
    async fn list_by_email(
        &self,
        email: &RiderEmail,
    ) -> Result<Vec<ChannelReference>, anyhow::Error> {
        let mut references = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .sns_client
                .list_subscriptions_by_topic()
                .topic_arn(&self.topic_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .context("Failed to list topic subscriptions")?;

            references.extend(
                output
                    .subscriptions()
                    .iter()
                    .filter(|subscription| subscription.endpoint() == Some(email.as_ref()))
                    .filter_map(|subscription| subscription.subscription_arn())
                    .map(|arn| ChannelReference::parse(arn.to_string())),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(references)
    }

    #[tracing::instrument(name = "Publishing to topic", skip(self, message))]
    async fn publish(&self, message: &str, subject: &str) -> Result<(), anyhow::Error> {
        self.sns_client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .subject(subject)
            .send()
            .await
            .context("Failed to publish to topic")?;

        Ok(())
    }
}
