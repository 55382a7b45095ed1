//! Startup banner helpers: which URLs can peers use to reach the relay?
//!
//! The phone and the screen are usually on the same Wi-Fi network, so the
//! address worth printing is the machine's LAN IPv4, not `0.0.0.0`.

use std::net::{IpAddr, SocketAddr, UdpSocket};

/// Returns the IPv4 address of the interface holding the default route.
///
/// Uses the unconnected-UDP trick: `connect` on a UDP socket only selects a
/// route and source address, it sends no packet.  Returns `None` on hosts
/// without a usable route (air-gapped machines, some containers).
pub fn lan_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("192.0.2.1:9").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

/// Lines describing where the relay can be reached.
pub fn banner_lines(bind_addr: SocketAddr, lan_ip: Option<IpAddr>) -> Vec<String> {
    let port = bind_addr.port();
    let mut lines = Vec::new();

    if bind_addr.ip().is_unspecified() || bind_addr.ip().is_loopback() {
        lines.push(format!("Local:   ws://localhost:{port}"));
    }
    if bind_addr.ip().is_unspecified() {
        if let Some(ip) = lan_ip {
            lines.push(format!("Network: ws://{ip}:{port}"));
        }
    } else if !bind_addr.ip().is_loopback() {
        lines.push(format!("Network: ws://{bind_addr}"));
    }

    lines
}

// ── Tests ─────────────────────────────────────────────────────────────────────
