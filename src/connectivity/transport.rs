//! Broker transports
//!
//! A `Transport` is the raw network/broker client the gate drives. It makes
//! one attempt per call; retry and backoff live in `MqttGate`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::errors::{TransportError, TransportResult};
use crate::observability::Logger;

/// Delivery guarantee requested for a publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Qos {
    /// Fire and forget
    #[default]
    AtMostOnce,
    /// Broker acknowledges the message
    AtLeastOnce,
}

/// Network link plus broker session.
pub trait Transport {
    /// Current link status.
    fn link_up(&mut self) -> bool;

    /// Returns true if a broker session is open.
    fn is_connected(&self) -> bool;

    /// Opens a broker session. One attempt.
    fn connect(&mut self) -> TransportResult<()>;

    /// Closes the broker session, if any.
    fn disconnect(&mut self);

    /// Publishes one message. One attempt.
    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> TransportResult<()>;
}

/// Always-up transport that writes every message to the log.
#[derive(Debug, Default)]
pub struct LoggerTransport {
    connected: bool,
    delivered: u64,
}

impl LoggerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Transport for LoggerTransport {
    fn link_up(&mut self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> TransportResult<()> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn publish(&mut self, topic: &str, payload: &[u8], _qos: Qos) -> TransportResult<()> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        let body = String::from_utf8_lossy(payload);
        Logger::info("MESSAGE_DELIVERED", &[("topic", topic), ("payload", &*body)]);
        self.delivered += 1;
        Ok(())
    }
}

/// Knobs for `SimulatedTransport`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkProfile {
    /// Chance that a link check finds the network down
    pub offline_probability: f64,
    /// Chance that a single publish attempt is not acknowledged
    pub publish_failure_probability: f64,
}

/// Transport with random outages for host runs. Delivered messages are
/// logged like `LoggerTransport`.
pub struct SimulatedTransport {
    rng: StdRng,
    profile: LinkProfile,
    link: bool,
    connected: bool,
    delivered: u64,
}

impl SimulatedTransport {
    pub fn new(profile: LinkProfile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            profile,
            link: true,
            connected: false,
            delivered: 0,
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    fn roll(&mut self, probability: f64) -> bool {
        probability > 0.0 && self.rng.gen_bool(probability.min(1.0))
    }
}

impl Transport for SimulatedTransport {
    fn link_up(&mut self) -> bool {
        let up = !self.roll(self.profile.offline_probability);
        if !up {
            // a dropped link takes the broker session with it
            self.connected = false;
        }
        self.link = up;
        up
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> TransportResult<()> {
        if !self.link {
            return Err(TransportError::LinkDown);
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn publish(&mut self, topic: &str, payload: &[u8], _qos: Qos) -> TransportResult<()> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.roll(self.profile.publish_failure_probability) {
            return Err(TransportError::PublishRejected("no acknowledgement".to_string()));
        }
        let body = String::from_utf8_lossy(payload);
        Logger::info("MESSAGE_DELIVERED", &[("topic", topic), ("payload", &*body)]);
        self.delivered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(offline: f64, failure: f64) -> LinkProfile {
        LinkProfile {
            offline_probability: offline,
            publish_failure_probability: failure,
        }
    }

    #[test]
    fn test_logger_transport_requires_session() {
        let mut t = LoggerTransport::new();
        assert_eq!(
            t.publish("station/weather", b"x", Qos::AtMostOnce),
            Err(TransportError::NotConnected)
        );
        t.connect().unwrap();
        t.publish("station/weather", b"x", Qos::AtMostOnce).unwrap();
        assert_eq!(t.delivered(), 1);
    }

    #[test]
    fn test_simulated_always_online_delivers() {
        let mut t = SimulatedTransport::new(profile(0.0, 0.0), Some(3));
        assert!(t.link_up());
        t.connect().unwrap();
        for _ in 0..20 {
            t.publish("feed", b"{t:1.00,h:2.00,l:3.00}", Qos::AtLeastOnce)
                .unwrap();
        }
        assert_eq!(t.delivered(), 20);
    }

    #[test]
    fn test_simulated_always_offline() {
        let mut t = SimulatedTransport::new(profile(1.0, 0.0), Some(3));
        assert!(!t.link_up());
        assert_eq!(t.connect(), Err(TransportError::LinkDown));
    }

    #[test]
    fn test_link_loss_drops_session() {
        let mut t = SimulatedTransport::new(profile(0.0, 0.0), Some(3));
        assert!(t.link_up());
        t.connect().unwrap();
        t.profile.offline_probability = 1.0;
        assert!(!t.link_up());
        assert!(!t.is_connected());
    }

    #[test]
    fn test_simulated_publish_failure() {
        let mut t = SimulatedTransport::new(profile(0.0, 1.0), Some(9));
        t.link_up();
        t.connect().unwrap();
        assert!(matches!(
            t.publish("feed", b"x", Qos::AtMostOnce),
            Err(TransportError::PublishRejected(_))
        ));
        assert_eq!(t.delivered(), 0);
    }
}
