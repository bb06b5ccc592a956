//! Platform trait: the device services the agent can observe.

use crate::bounded::Text;
use crate::limits::CFG_CAP;

/// Link status reported by the network tool and the status command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInfo {
    pub connected: bool,
    pub ssid: Text<CFG_CAP>,
    pub ip: Text<46>,
    pub rssi: i32,
}

pub trait Platform: Send + Sync {
    /// Board or host name shown by `status`.
    fn board(&self) -> &str;

    /// Milliseconds since start.
    fn uptime_ms(&self) -> u64;

    fn network(&self) -> NetworkInfo;

    /// Writes an agent-originated message to the local console.
    fn announce(&self, text: &str);

    /// Periodic liveness action for the host-facing interface.
    fn keepalive(&self) {}
}

/// Fixed-answer platform for tests and for runs without a device.
///
/// Records announcements and counts keepalive calls.
#[derive(Debug, Default)]
pub struct StubPlatform {
    pub network: NetworkInfo,
    pub uptime_ms: u64,
    announced: std::sync::Mutex<Vec<String>>,
    keepalives: std::sync::atomic::AtomicUsize,
}

impl StubPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform reporting a connected network.
    pub fn online(ssid: &str, ip: &str, rssi: i32) -> Self {
        Self {
            network: NetworkInfo {
                connected: true,
                ssid: crate::bounded::text_truncated(ssid),
                ip: crate::bounded::text_truncated(ip),
                rssi,
            },
            ..Self::default()
        }
    }

    pub fn announced(&self) -> Vec<String> {
        self.announced
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    pub fn keepalives(&self) -> usize {
        self.keepalives.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Platform for StubPlatform {
    fn board(&self) -> &str {
        "stub"
    }

    fn uptime_ms(&self) -> u64 {
        self.uptime_ms
    }

    fn network(&self) -> NetworkInfo {
        self.network.clone()
    }

    fn announce(&self, text: &str) {
        if let Ok(mut a) = self.announced.lock() {
            a.push(text.to_owned());
        }
    }

    fn keepalive(&self) {
        self.keepalives
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
}
