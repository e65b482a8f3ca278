//! Topic-based event bus implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{ActivationEvent, AuraEvent, DamageEvent, TriggerEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Activation lifecycle (creation, steps, suspension, completion)
    Activation,
    /// Hit point changes written by damage cards
    Damage,
    /// Aura reconciliation passes
    Aura,
    /// Condition events fired during resolution
    Trigger,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Activation, Topic::Damage, Topic::Aura, Topic::Trigger];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Activation(ActivationEvent),
    Damage(DamageEvent),
    Aura(AuraEvent),
    Trigger(TriggerEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Activation(_) => Topic::Activation,
            Event::Damage(_) => Topic::Damage,
            Event::Aura(_) => Topic::Aura,
            Event::Trigger(_) => Topic::Trigger,
        }
    }
}

impl From<ActivationEvent> for Event {
    fn from(event: ActivationEvent) -> Self {
        Event::Activation(event)
    }
}

impl From<DamageEvent> for Event {
    fn from(event: DamageEvent) -> Self {
        Event::Damage(event)
    }
}

impl From<AuraEvent> for Event {
    fn from(event: AuraEvent) -> Self {
        Event::Aura(event)
    }
}

impl From<TriggerEvent> for Event {
    fn from(event: TriggerEvent) -> Self {
        Event::Trigger(event)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Delivery is best-effort: publishing with no
/// subscriber, or to a lagging one, never blocks resolution.
#[derive(Clone)]
pub struct EventBus {
    activation: broadcast::Sender<Event>,
    damage: broadcast::Sender<Event>,
    aura: broadcast::Sender<Event>,
    trigger: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            activation: broadcast::channel(capacity).0,
            damage: broadcast::channel(capacity).0,
            aura: broadcast::channel(capacity).0,
            trigger: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Activation => &self.activation,
            Topic::Damage => &self.damage,
            Topic::Aura => &self.aura,
            Topic::Trigger => &self.trigger,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.channel(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use skirmish_core::ActivationId;

    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut receivers = bus.subscribe_multiple(&[Topic::Activation, Topic::Aura]);

        bus.publish(ActivationEvent::Completed {
            activation: ActivationId(3),
        });

        let activation = receivers
            .get_mut(&Topic::Activation)
            .unwrap()
            .recv()
            .await
            .unwrap();
        assert_eq!(activation.topic(), Topic::Activation);
        assert!(receivers.get_mut(&Topic::Aura).unwrap().try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::with_capacity(1);
        for topic in Topic::ALL {
            assert_eq!(bus.channel(topic).receiver_count(), 0);
        }
        bus.publish(AuraEvent::Reconciled {
            created: 0,
            removed: 0,
        });
    }
}
