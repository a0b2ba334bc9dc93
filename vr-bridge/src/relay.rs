use crate::message::BridgeMessage;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use vr_bridge_api::{VRError, VRResult};

// Largest payload of a single IPv4 UDP datagram.
pub const MAX_DATAGRAM: usize = 65_507;

/// Sends bridge messages as JSON datagrams to a fixed consumer address.
pub struct UdpRelay {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpRelay {
    pub fn bind(local: SocketAddr, target: SocketAddr) -> VRResult<UdpRelay> {
        let socket = UdpSocket::bind(local)?;
        info!("Relaying controller states from {} to {}", socket.local_addr()?, target);
        Ok(UdpRelay { socket, target })
    }

    pub fn local_addr(&self) -> VRResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn send(&self, message: &BridgeMessage) -> VRResult<usize> {
        let bytes = message.to_bytes()?;
        self.send_bytes(&bytes)
    }

    pub fn send_bytes(&self, bytes: &[u8]) -> VRResult<usize> {
        if bytes.len() > MAX_DATAGRAM {
            return Err(VRError::Serialize(format!(
                "message of {} bytes exceeds a UDP datagram",
                bytes.len()
            )));
        }
        Ok(self.socket.send_to(bytes, self.target)?)
    }

    /// Receives one message on the local socket, `None` on timeout.
    pub fn recv(&self, timeout: Duration) -> VRResult<Option<(BridgeMessage, SocketAddr)>> {
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match self.socket.recv_from(&mut buf) {
            Ok((len, from)) => Ok(Some((BridgeMessage::from_bytes(&buf[..len])?, from))),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FrameConversion;
    use vr_bridge_api::VRFrameData;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn delivers_one_message_over_loopback() {
        let consumer = UdpRelay::bind(loopback(), loopback()).unwrap();
        let relay = UdpRelay::bind(loopback(), consumer.local_addr().unwrap()).unwrap();

        let mut frame = VRFrameData::default();
        frame.right.trigger = 0.25;
        let message = BridgeMessage::from_frame(&frame, FrameConversion::Stage);
        let sent = relay.send(&message).unwrap();
        assert!(sent > 0);

        let (received, from) = consumer.recv(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(received, message);
        assert_eq!(from, relay.local_addr().unwrap());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let relay = UdpRelay::bind(loopback(), loopback()).unwrap();
        let err = relay.send_bytes(&vec![b' '; MAX_DATAGRAM + 1]).unwrap_err();
        assert!(matches!(err, VRError::Serialize(_)));
    }

    #[test]
    fn recv_times_out_quietly() {
        let consumer = UdpRelay::bind(loopback(), loopback()).unwrap();
        assert!(consumer.recv(Duration::from_millis(20)).unwrap().is_none());
    }
}
