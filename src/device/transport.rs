//! I/O seams of the device client: the HTTP control plane and the UDP datagram sink

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::UdpSocket;

use super::{DeviceError, AUTH_HEADER};

/// JSON request/response exchange with a device
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, token: Option<&str>) -> Result<Value, DeviceError>;

    async fn post(&self, url: &str, token: Option<&str>, body: &Value)
        -> Result<Value, DeviceError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, DeviceError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> Result<Value, DeviceError> {
        if let Some(token) = token {
            request = request.header(AUTH_HEADER, token);
        }

        let response = request.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_slice(&bytes)?)
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, token: Option<&str>) -> Result<Value, DeviceError> {
        trace!(%url, "GET");
        self.send(self.client.get(url), token).await
    }

    async fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Value, DeviceError> {
        trace!(%url, %body, "POST");
        self.send(self.client.post(url).json(body), token).await
    }
}

/// Destination of real-time datagrams
#[async_trait]
pub trait DatagramSink: Send + Sync {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()>;
}

/// Sends datagrams to a fixed remote address
///
/// The socket is bound on first use and dropped after a failed send, so the next send
/// binds a fresh one.
pub struct UdpSink {
    remote_addr: SocketAddr,
    socket: Option<UdpSocket>,
}

impl UdpSink {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            socket: None,
        }
    }

    async fn bind(remote_addr: &SocketAddr) -> io::Result<UdpSocket> {
        // Choose correct IP version for local addr
        let local_addr = if remote_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        UdpSocket::bind(local_addr).await
    }
}

#[async_trait]
impl DatagramSink for UdpSink {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => Self::bind(&self.remote_addr).await?,
        };

        socket.send_to(datagram, self.remote_addr).await?;
        self.socket = Some(socket);

        Ok(())
    }
}
