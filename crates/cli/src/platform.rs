//! Host implementation of the device services.

use femtoclaw_core::bounded::text_truncated;
use femtoclaw_core::platform::{NetworkInfo, Platform};
use std::io::Write;
use std::net::{IpAddr, UdpSocket};
use std::time::Instant;

/// Uptime from process start, network status from the default route,
/// console on stdout.
pub struct HostPlatform {
    started: Instant,
    board: String,
}

impl HostPlatform {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            board: format!("host ({}-{})", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// Address of the interface holding the default route. Connecting a UDP
/// socket sends nothing.
fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

impl Platform for HostPlatform {
    fn board(&self) -> &str {
        &self.board
    }

    fn uptime_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn network(&self) -> NetworkInfo {
        match local_ip() {
            Some(ip) => NetworkInfo {
                connected: true,
                ssid: text_truncated("host"),
                ip: text_truncated(&ip.to_string()),
                rssi: 0,
            },
            None => NetworkInfo::default(),
        }
    }

    fn announce(&self, text: &str) {
        println!("\n[message] {text}");
    }

    fn keepalive(&self) {
        let _ = std::io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_names_the_host() {
        assert!(HostPlatform::new().board().starts_with("host ("));
    }

    #[test]
    fn uptime_moves_forward() {
        let platform = HostPlatform::new();
        let first = platform.uptime_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(platform.uptime_ms() >= first + 5);
    }

    #[test]
    fn disconnected_network_has_no_address() {
        let info = NetworkInfo::default();
        assert!(!info.connected);
        assert!(info.ip.is_empty());
    }
}
