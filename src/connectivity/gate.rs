//! ConnectivityGate and the MQTT-style gate over a `Transport`

use std::thread;
use std::time::Duration;

use super::errors::{ConnectivityError, ConnectivityResult, TransportError};
use super::transport::{Qos, Transport};
use crate::observability::{Event, Logger};

/// Link check plus a bounded-retry publish.
pub trait ConnectivityGate {
    /// Returns true if the network link is up.
    fn is_online(&mut self) -> bool;

    /// Publishes one payload within the retry budget. Returns true on
    /// delivery.
    fn publish_one(&mut self, payload: &[u8]) -> bool;
}

impl<G: ConnectivityGate + ?Sized> ConnectivityGate for Box<G> {
    fn is_online(&mut self) -> bool {
        (**self).is_online()
    }

    fn publish_one(&mut self, payload: &[u8]) -> bool {
        (**self).publish_one(payload)
    }
}

/// Fixed attempt count with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// No pause between attempts
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    fn pause(&self) {
        if !self.backoff.is_zero() {
            thread::sleep(self.backoff);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Gate that publishes every payload to one topic over a broker session.
pub struct MqttGate<T> {
    transport: T,
    topic: String,
    qos: Qos,
    connect_retry: RetryPolicy,
    publish_retry: RetryPolicy,
}

impl<T: Transport> MqttGate<T> {
    pub fn new(
        transport: T,
        topic: impl Into<String>,
        connect_retry: RetryPolicy,
        publish_retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            topic: topic.into(),
            qos: Qos::default(),
            connect_retry,
            publish_retry,
        }
    }

    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Opens a broker session unless one is already open.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the link is down, `BrokerUnreachable` once every
    /// connect attempt failed.
    pub fn ensure_connected(&mut self) -> ConnectivityResult<()> {
        if self.transport.is_connected() {
            return Ok(());
        }

        let attempts = self.connect_retry.attempts;
        let mut last = TransportError::LinkDown;

        for attempt in 1..=attempts {
            match self.transport.connect() {
                Ok(()) => {
                    let n = attempt.to_string();
                    Logger::info(Event::BrokerConnected.as_str(), &[("attempt", n.as_str())]);
                    return Ok(());
                }
                Err(TransportError::LinkDown) => return Err(ConnectivityError::Unavailable),
                Err(e) => {
                    let (n, reason) = (attempt.to_string(), e.to_string());
                    Logger::warn(
                        Event::BrokerConnectFailed.as_str(),
                        &[("attempt", n.as_str()), ("reason", reason.as_str())],
                    );
                    self.transport.disconnect();
                    last = e;
                }
            }
            if attempt < attempts {
                self.connect_retry.pause();
            }
        }

        Err(ConnectivityError::BrokerUnreachable { attempts, last })
    }

    /// Publishes `payload` to the gate's topic.
    ///
    /// # Errors
    ///
    /// Any `ensure_connected` error, or `PublishFailed` once every publish
    /// attempt failed.
    pub fn try_publish(&mut self, payload: &[u8]) -> ConnectivityResult<()> {
        self.ensure_connected()?;

        let attempts = self.publish_retry.attempts;
        let mut last = TransportError::NotConnected;

        for attempt in 1..=attempts {
            if !self.transport.is_connected() {
                self.ensure_connected()?;
            }
            match self.transport.publish(&self.topic, payload, self.qos) {
                Ok(()) => {
                    let bytes = payload.len().to_string();
                    Logger::trace(
                        Event::PublishOk.as_str(),
                        &[("topic", self.topic.as_str()), ("bytes", bytes.as_str())],
                    );
                    return Ok(());
                }
                Err(e) => {
                    let (n, reason) = (attempt.to_string(), e.to_string());
                    Logger::trace(
                        Event::PublishAttemptFailed.as_str(),
                        &[("attempt", n.as_str()), ("reason", reason.as_str())],
                    );
                    last = e;
                }
            }
            if attempt < attempts {
                self.publish_retry.pause();
            }
        }

        Err(ConnectivityError::PublishFailed { attempts, last })
    }
}

impl<T: Transport> ConnectivityGate for MqttGate<T> {
    fn is_online(&mut self) -> bool {
        self.transport.link_up()
    }

    fn publish_one(&mut self, payload: &[u8]) -> bool {
        match self.try_publish(payload) {
            Ok(()) => true,
            Err(e) => {
                let reason = e.to_string();
                Logger::warn(
                    Event::PublishFailed.as_str(),
                    &[("code", e.code()), ("reason", reason.as_str())],
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::errors::TransportResult;

    /// Scripted transport: pops one result per call
    #[derive(Default)]
    struct Scripted {
        link: bool,
        connected: bool,
        connects: Vec<TransportResult<()>>,
        publishes: Vec<TransportResult<()>>,
        connect_calls: u32,
        publish_calls: u32,
        sent: Vec<Vec<u8>>,
    }

    impl Transport for Scripted {
        fn link_up(&mut self) -> bool {
            self.link
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn connect(&mut self) -> TransportResult<()> {
            self.connect_calls += 1;
            let result = if self.connects.is_empty() {
                Ok(())
            } else {
                self.connects.remove(0)
            };
            self.connected = result.is_ok();
            result
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn publish(&mut self, _topic: &str, payload: &[u8], _qos: Qos) -> TransportResult<()> {
            self.publish_calls += 1;
            let result = if self.publishes.is_empty() {
                Ok(())
            } else {
                self.publishes.remove(0)
            };
            if result.is_ok() {
                self.sent.push(payload.to_vec());
            }
            result
        }
    }

    fn gate(transport: Scripted) -> MqttGate<Scripted> {
        MqttGate::new(
            transport,
            "station/weather",
            RetryPolicy::immediate(3),
            RetryPolicy::immediate(3),
        )
    }

    fn rejected() -> TransportResult<()> {
        Err(TransportError::PublishRejected("no puback".into()))
    }

    #[test]
    fn test_is_online_reflects_link() {
        let mut g = gate(Scripted {
            link: false,
            ..Default::default()
        });
        assert!(!g.is_online());
        g.transport_mut().link = true;
        assert!(g.is_online());
    }

    #[test]
    fn test_publish_connects_once_and_reuses_session() {
        let mut g = gate(Scripted {
            link: true,
            ..Default::default()
        });
        assert!(g.publish_one(b"A"));
        assert!(g.publish_one(b"B"));
        assert_eq!(g.transport().connect_calls, 1);
        assert_eq!(g.transport().sent, vec![b"A".to_vec(), b"B".to_vec()]);
    }

    #[test]
    fn test_publish_retries_then_succeeds() {
        let mut g = gate(Scripted {
            link: true,
            publishes: vec![rejected(), rejected(), Ok(())],
            ..Default::default()
        });
        assert!(g.try_publish(b"A").is_ok());
        assert_eq!(g.transport().publish_calls, 3);
    }

    #[test]
    fn test_publish_gives_up_after_budget() {
        let mut g = gate(Scripted {
            link: true,
            publishes: vec![rejected(), rejected(), rejected(), Ok(())],
            ..Default::default()
        });
        let err = g.try_publish(b"A").unwrap_err();
        assert!(matches!(err, ConnectivityError::PublishFailed { attempts: 3, .. }));
        assert_eq!(g.transport().publish_calls, 3);
        assert!(g.transport().sent.is_empty());
    }

    #[test]
    fn test_connect_budget_exhausted() {
        let refused = || Err(TransportError::ConnectRefused("bad credentials".into()));
        let mut g = gate(Scripted {
            link: true,
            connects: vec![refused(), refused(), refused()],
            ..Default::default()
        });
        let err = g.try_publish(b"A").unwrap_err();
        assert!(matches!(
            err,
            ConnectivityError::BrokerUnreachable { attempts: 3, .. }
        ));
        assert_eq!(g.transport().connect_calls, 3);
        assert_eq!(g.transport().publish_calls, 0);
    }

    #[test]
    fn test_link_down_during_connect_is_unavailable() {
        let mut g = gate(Scripted {
            link: false,
            connects: vec![Err(TransportError::LinkDown), Err(TransportError::LinkDown)],
            ..Default::default()
        });
        assert_eq!(g.try_publish(b"A"), Err(ConnectivityError::Unavailable));
        assert!(!g.publish_one(b"A"));
    }

    #[test]
    fn test_default_retry_policy_matches_node_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(5));
    }
}
