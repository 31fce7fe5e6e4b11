//! Publishes drained domain events on NATS when a connection is configured.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Publisher that drops every event.
    pub fn disabled() -> Self { Self::default() }

    /// Connects when `url` is set; a failed connection disables publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "Connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "NATS unavailable, domain events will not be published");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Publishing is best effort: failures are logged and never surface to the page.
    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        let Some(nats) = &self.nats else { return };
        for event in events {
            let subject = event.subject();
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(%subject, error = %e, "Could not encode domain event");
                    continue;
                }
            };
            if let Err(e) = nats.publish(subject.clone(), payload.into()).await {
                tracing::warn!(%subject, error = %e, "Failed to publish domain event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::ProductEvent;

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let publisher = EventPublisher::connect(None).await;
        assert!(!publisher.is_enabled());
        publisher
            .publish_all(vec![DomainEvent::Product(ProductEvent::WishlistToggled { product_id: 1, in_wishlist: true })])
            .await;
    }
}
