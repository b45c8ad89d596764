//! Event Bridge: adapts a push-event source into the current socket event and
//! user-visible notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::wallet::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SocketEvent {
    #[serde(rename = "connect")]
    Connected,
    #[serde(rename = "disconnect")]
    Disconnected,
    PoolCreated,
    PoolCreationFailed,
    PositionCreated,
    PositionCreationFailed,
    PositionUpdated,
    PositionUpdateFailed,
    FeesIncentivesCollected,
    AmountBelowMin,
    Swapped,
    SwapFailed,
}

impl SocketEvent {
    pub const ALL: [SocketEvent; 12] = [
        SocketEvent::Connected,
        SocketEvent::Disconnected,
        SocketEvent::PoolCreated,
        SocketEvent::PoolCreationFailed,
        SocketEvent::PositionCreated,
        SocketEvent::PositionCreationFailed,
        SocketEvent::PositionUpdated,
        SocketEvent::PositionUpdateFailed,
        SocketEvent::FeesIncentivesCollected,
        SocketEvent::AmountBelowMin,
        SocketEvent::Swapped,
        SocketEvent::SwapFailed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SocketEvent::Connected => "connect",
            SocketEvent::Disconnected => "disconnect",
            SocketEvent::PoolCreated => "poolCreated",
            SocketEvent::PoolCreationFailed => "poolCreationFailed",
            SocketEvent::PositionCreated => "positionCreated",
            SocketEvent::PositionCreationFailed => "positionCreationFailed",
            SocketEvent::PositionUpdated => "positionUpdated",
            SocketEvent::PositionUpdateFailed => "positionUpdateFailed",
            SocketEvent::FeesIncentivesCollected => "feesIncentivesCollected",
            SocketEvent::AmountBelowMin => "amountBelowMin",
            SocketEvent::Swapped => "swapped",
            SocketEvent::SwapFailed => "swapFailed",
        }
    }

    /// Connection events track the transport itself and never become the
    /// current domain event.
    pub fn is_connection_event(self) -> bool {
        matches!(self, SocketEvent::Connected | SocketEvent::Disconnected)
    }

    pub fn alert_message(self) -> &'static str {
        match self {
            SocketEvent::Connected => "Connected to the DEX event service.",
            SocketEvent::Disconnected => "Disconnected from the DEX event service.",
            SocketEvent::PoolCreated => "Pool created successfully.",
            SocketEvent::PoolCreationFailed => "Pool creation failed.",
            SocketEvent::PositionCreated => "Position created successfully.",
            SocketEvent::PositionCreationFailed => "Position creation failed.",
            SocketEvent::PositionUpdated => "Position updated successfully.",
            SocketEvent::PositionUpdateFailed => "Position update failed.",
            SocketEvent::FeesIncentivesCollected => "Fees and incentives collected.",
            SocketEvent::AmountBelowMin => "Amount is below the minimum.",
            SocketEvent::Swapped => "Swap completed successfully.",
            SocketEvent::SwapFailed => "Swap failed.",
        }
    }
}

impl FromStr for SocketEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub name: String,
    pub payload: Value,
}

/// A named push-event source, such as the DEX socket.
pub trait PushEventSource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<PushEvent>;
}

/// In-process push-event source.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<PushEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event, returning how many subscribers received it.
    pub fn publish(&self, name: &str, payload: Value) -> usize {
        self.tx
            .send(PushEvent {
                name: name.to_string(),
                payload,
            })
            .unwrap_or(0)
    }
}

impl PushEventSource for EventHub {
    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertVariant {
    Info,
    Success,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub variant: AlertVariant,
    pub event: Option<SocketEvent>,
}

/// Transient user-visible alerts. Nobody listening is not an error.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn notify(&self, message: impl Into<String>, variant: AlertVariant) {
        self.send(Notification {
            message: message.into(),
            variant,
            event: None,
        });
    }

    pub fn send(&self, notification: Notification) {
        debug!(variant = ?notification.variant, "notification: {}", notification.message);
        let _ = self.tx.send(notification);
    }
}

/// Holds the most recent domain event. A burst collapses to its last event.
#[derive(Debug, Clone)]
pub struct EventBridge {
    current: Arc<watch::Sender<Option<SocketEvent>>>,
    connected: Arc<watch::Sender<bool>>,
    notifier: Notifier,
}

impl EventBridge {
    pub fn new(notifier: Notifier) -> Self {
        let (current, _rx) = watch::channel(None);
        let (connected, _rx) = watch::channel(false);
        Self {
            current: Arc::new(current),
            connected: Arc::new(connected),
            notifier,
        }
    }

    pub fn current_event(&self) -> Option<SocketEvent> {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SocketEvent>> {
        self.current.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Applies one push event. Unknown names are logged and dropped.
    pub fn handle(&self, event: &PushEvent) {
        let socket_event = match event.name.parse::<SocketEvent>() {
            Ok(socket_event) => socket_event,
            Err(name) => {
                warn!(event = %name, "ignoring unknown push event");
                return;
            }
        };

        match socket_event {
            SocketEvent::Connected => {
                info!("Web socket has been connected.");
                self.connected.send_replace(true);
            }
            SocketEvent::Disconnected => {
                info!("Web socket has been disconnected.");
                self.connected.send_replace(false);
            }
            domain_event => {
                debug!(event = %domain_event, "socket event");
                self.current.send_replace(Some(domain_event));
                self.notifier.send(Notification {
                    message: domain_event.alert_message().to_string(),
                    variant: AlertVariant::Info,
                    event: Some(domain_event),
                });
            }
        }
    }

    /// Listens to `source` until the returned handle is dropped.
    pub fn attach(&self, source: &dyn PushEventSource) -> Subscription {
        let mut events = source.subscribe();
        let bridge = self.clone();
        Subscription::spawn("push-events", move |mut shutdown| async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    event = events.recv() => match event {
                        Ok(event) => bridge.handle(&event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("push event listener lagged, {} events skipped", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn push(name: &str) -> PushEvent {
        PushEvent {
            name: name.to_string(),
            payload: Value::Null,
        }
    }

    #[test]
    fn names_round_trip() {
        for event in SocketEvent::ALL {
            assert_eq!(event.name().parse::<SocketEvent>(), Ok(event));
        }
        assert!("nope".parse::<SocketEvent>().is_err());
        assert_eq!(serde_json::to_value(SocketEvent::PoolCreated).unwrap(), json!("poolCreated"));
        assert_eq!(serde_json::to_value(SocketEvent::Connected).unwrap(), json!("connect"));
    }

    #[test]
    fn burst_collapses_to_last_event() {
        let bridge = EventBridge::new(Notifier::new(8));
        let mut rx = bridge.subscribe();
        rx.borrow_and_update();

        bridge.handle(&push("poolCreated"));
        bridge.handle(&push("positionCreated"));
        bridge.handle(&push("swapped"));

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(SocketEvent::Swapped));
        assert_eq!(bridge.current_event(), Some(SocketEvent::Swapped));
    }

    #[test]
    fn connection_events_do_not_replace_current_event() {
        let notifier = Notifier::new(8);
        let mut alerts = notifier.subscribe();
        let bridge = EventBridge::new(notifier);

        bridge.handle(&push("swapFailed"));
        bridge.handle(&push("connect"));
        assert!(bridge.is_connected());
        bridge.handle(&push("bogus"));
        bridge.handle(&push("disconnect"));
        assert!(!bridge.is_connected());

        assert_eq!(bridge.current_event(), Some(SocketEvent::SwapFailed));
        let alert = alerts.try_recv().unwrap();
        assert_eq!(alert.variant, AlertVariant::Info);
        assert_eq!(alert.event, Some(SocketEvent::SwapFailed));
        assert!(alerts.try_recv().is_err());
    }

    #[tokio::test]
    async fn attached_bridge_follows_the_source() {
        let hub = EventHub::new(16);
        let bridge = EventBridge::new(Notifier::new(16));
        let subscription = bridge.attach(&hub);

        hub.publish("poolCreated", json!({}));
        hub.publish("amountBelowMin", json!({}));
        hub.publish("positionUpdated", json!({ "positionID": "01" }));

        let mut rx = bridge.subscribe();
        tokio::time::timeout(
            Duration::from_secs(1),
            rx.wait_for(|event| *event == Some(SocketEvent::PositionUpdated)),
        )
        .await
        .unwrap()
        .unwrap();

        drop(subscription);
        assert_eq!(bridge.current_event(), Some(SocketEvent::PositionUpdated));
    }
}
