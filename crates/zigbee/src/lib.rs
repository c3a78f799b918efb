#![doc = include_str!("../README.md")]

mod attribute;
pub mod node;
pub mod report;

use crate::report::{AttributeReport, AttributeValue, ReportBinding, ReportConfig};
use bon::bon;
use control::Error;
use control::manager::DeviceManager;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Definitions for all supported zigbee devices
pub mod devices {
    /// Aqara devices
    pub mod aqara;
    /// Xiaomi devices
    pub mod xiaomi;
}

/// Adapts the host mesh runtime: devices register attribute report
/// listeners, the host delivers reports through a [RuntimeHandle], and a
/// routing task fans every report out to the matching listeners
pub struct Manager {
    reports: mpsc::Sender<AttributeReport>,
    incoming: mpsc::Receiver<AttributeReport>,
    subscriptions: Vec<Subscription>,
}

#[bon]
impl Manager {
    /// Create a new manager
    #[builder]
    pub fn new(
        /// size of the inbound report queue
        #[builder(default = 64)]
        capacity: usize,
    ) -> Self {
        let (reports, incoming) = mpsc::channel::<AttributeReport>(capacity);
        Self {
            reports,
            incoming,
            subscriptions: vec![],
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Manager {
    /// The handle the host runtime uses to deliver attribute reports, it can
    /// be cloned freely. Once every handle is dropped the routing task ends
    /// and all device streams close
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            reports: self.reports.clone(),
        }
    }

    pub(crate) fn subscribe(&mut self, binding: ReportBinding, config: ReportConfig) -> Updates {
        let (sender, _) = broadcast::channel::<AttributeValue>(64);
        debug!(
            device = %binding.device,
            cluster = %binding.cluster,
            attribute = %binding.attribute,
            min_interval = config.min_interval.as_secs(),
            max_interval = config.max_interval.as_secs(),
            min_change = config.min_change,
            "registered attr report listener",
        );
        self.subscriptions.push(Subscription {
            binding,
            config,
            sender: sender.clone(),
        });
        Updates { sender }
    }
}

impl DeviceManager for Manager {
    fn start(self: Box<Self>, token: CancellationToken) {
        let Manager {
            reports,
            incoming,
            subscriptions,
        } = *self;
        // the host keeps its own handles, dropping this one lets the routing
        // task observe a fully closed channel
        drop(reports);
        tokio::spawn(route_reports(incoming, subscriptions, token));
    }
}

async fn route_reports(
    mut incoming: mpsc::Receiver<AttributeReport>,
    subscriptions: Vec<Subscription>,
    token: CancellationToken,
) {
    debug!("starting report routing");
    loop {
        let report = tokio::select! {
            () = token.cancelled() => break,
            report = incoming.recv() => match report {
                Some(report) => report,
                None => break,
            },
        };
        debug!(
            device = %report.device,
            cluster = %report.cluster,
            attribute = %report.attribute,
            "received report: {:?}", report.value,
        );
        for subscription in subscriptions.iter().filter(|s| s.binding.matches(&report)) {
            // send will only fail when there are no subscribers, continue in
            // this case since subscribers may join later
            let _ = subscription.sender.send(report.value);
        }
    }
    debug!("report routing stopped");
}

/// The inbound half of the runtime adapter, used to deliver attribute
/// reports into the hub
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    reports: mpsc::Sender<AttributeReport>,
}

impl RuntimeHandle {
    /// Deliver one attribute report
    ///
    /// # Errors
    /// Returns [Error::InputStreamClosed] once the manager has shut down,
    /// delivery failures are not fatal and may simply be logged
    pub async fn deliver(&self, report: AttributeReport) -> Result<(), Error> {
        self.reports
            .send(report)
            .await
            .map_err(|_| Error::InputStreamClosed)
    }
}

#[derive(Debug, Clone)]
struct Subscription {
    binding: ReportBinding,
    #[allow(dead_code, reason = "recorded for diagnostics, reporting parameters are applied by the sensor itself")]
    config: ReportConfig,
    sender: broadcast::Sender<AttributeValue>,
}

#[derive(Debug, Clone)]
pub(crate) struct Updates {
    sender: broadcast::Sender<AttributeValue>,
}

impl Updates {
    fn subscribe(&self) -> impl Stream<Item = AttributeValue> + Unpin + Send + use<> {
        BroadcastStream::new(self.sender.subscribe()).ignore_lag()
    }
}

trait BroadcastStreamExt<T> {
    fn ignore_lag(self) -> impl Stream<Item = T> + Unpin + Send;
}

impl<T: 'static + Clone + Send> BroadcastStreamExt<T> for BroadcastStream<T> {
    fn ignore_lag(self) -> impl Stream<Item = T> + Unpin + Send {
        self.filter_map(|result| match result {
            Ok(value) => Some(value),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!("dropped {n} messages");
                None
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Panics are forgivable while testing")]
mod tests {
    use super::*;
    use crate::report::{ATTR_ON_OFF, ATTR_SCENE_COUNT, GEN_ON_OFF};
    use std::time::Duration;
    use tokio::time::timeout;

    fn binding(device: &str, attribute: crate::report::AttributeId) -> ReportBinding {
        ReportBinding {
            device: device.to_string(),
            endpoint: 0,
            cluster: GEN_ON_OFF,
            attribute,
        }
    }

    #[tokio::test]
    async fn reports_route_to_matching_listeners_only() {
        let mut manager = Manager::default();
        let scene = manager.subscribe(binding("switch", ATTR_SCENE_COUNT), ReportConfig::sensor_default());
        let contact = manager.subscribe(binding("door", ATTR_ON_OFF), ReportConfig::sensor_default());
        let handle = manager.handle();

        let mut scenes = scene.subscribe();
        let mut contacts = contact.subscribe();
        // the routing task owns the only remaining senders
        drop(scene);
        drop(contact);
        let token = CancellationToken::new();
        Box::new(manager).start(token.clone());

        handle
            .deliver(AttributeReport {
                device: "switch".to_string(),
                endpoint: 0,
                cluster: GEN_ON_OFF,
                attribute: ATTR_SCENE_COUNT,
                value: AttributeValue::Unsigned(3),
            })
            .await
            .unwrap();
        handle
            .deliver(AttributeReport {
                device: "door".to_string(),
                endpoint: 0,
                cluster: GEN_ON_OFF,
                attribute: ATTR_ON_OFF,
                value: AttributeValue::Bool(true),
            })
            .await
            .unwrap();

        let value = timeout(Duration::from_millis(500), scenes.next()).await.unwrap();
        assert_eq!(value, Some(AttributeValue::Unsigned(3)));
        let value = timeout(Duration::from_millis(500), contacts.next()).await.unwrap();
        assert_eq!(value, Some(AttributeValue::Bool(true)));

        // the switch listener never observed the door report
        token.cancel();
        let value = timeout(Duration::from_millis(500), scenes.next()).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn delivery_fails_once_shut_down() {
        let manager = Manager::default();
        let handle = manager.handle();
        let token = CancellationToken::new();
        Box::new(manager).start(token.clone());
        token.cancel();
        // wait for the routing task to drop the receiver
        let report = AttributeReport {
            device: "switch".to_string(),
            endpoint: 0,
            cluster: GEN_ON_OFF,
            attribute: ATTR_ON_OFF,
            value: AttributeValue::Bool(false),
        };
        let mut result = handle.deliver(report.clone()).await;
        for _ in 0..50 {
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            result = handle.deliver(report.clone()).await;
        }
        assert!(matches!(result, Err(Error::InputStreamClosed)));
    }
}
