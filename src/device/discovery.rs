//! Broadcast discovery of devices on the local network

use std::{
    collections::BTreeSet,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use tokio::{net::UdpSocket, time::Instant};

/// Payload of a discovery probe
pub const DISCOVERY_MESSAGE: &[u8] = b"\x00discover";

/// Discovery reply carrying the device name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredDevice {
    pub address: IpAddr,
    pub name: Option<String>,
}

impl DiscoveredDevice {
    /// Parse a reply datagram
    ///
    /// Replies are made of the responder IPv4 address in reverse byte order, the status `OK`
    /// and the NUL-terminated device name.
    pub fn parse(address: IpAddr, reply: &[u8]) -> Self {
        let name = if reply.len() > 6 && &reply[4..6] == b"OK" {
            let name = &reply[6..];
            let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
            Some(String::from_utf8_lossy(&name[..end]).into_owned())
        } else {
            None
        };

        Self { address, name }
    }
}

/// Broadcast a probe on `port` and collect the devices answering within `window`
#[instrument]
pub async fn discover(port: u16, window: Duration) -> io::Result<Vec<DiscoveredDevice>> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))).await?;
    socket.set_broadcast(true)?;

    probe(
        &socket,
        SocketAddr::from((Ipv4Addr::BROADCAST, port)),
        window,
    )
    .await
}

/// Send a probe to `target` and gather distinct responders until `window` elapses
pub async fn probe(
    socket: &UdpSocket,
    target: SocketAddr,
    window: Duration,
) -> io::Result<Vec<DiscoveredDevice>> {
    socket.send_to(DISCOVERY_MESSAGE, target).await?;

    let deadline = Instant::now() + window;
    let mut seen = BTreeSet::new();
    let mut devices = Vec::new();
    let mut buf = [0u8; 512];

    loop {
        match tokio::time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                if seen.insert(from.ip()) {
                    let device = DiscoveredDevice::parse(from.ip(), &buf[..len]);
                    debug!(address = %device.address, name = ?device.name, "device answered");
                    devices.push(device);
                }
            }
            Ok(Err(error)) => {
                warn!(%error, "discovery receive failed");
            }
            Err(_) => break,
        }
    }

    Ok(devices)
}
