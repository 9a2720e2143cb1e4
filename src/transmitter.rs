use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use tracing::{trace, warn};

use crate::codec::PieceRecord;
use crate::config::TransmitterConfig;
use crate::error::Error;

/// Outbound sink for retired piece records. Delivery is best effort.
pub trait Transmitter {
    fn send(&mut self, record: &PieceRecord) -> Result<(), Error>;
}

/// Sends each record as one datagram to a multicast group (or any other
/// address). The socket only sends, so it never joins the group.
#[derive(Debug)]
pub struct UdpTransmitter {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransmitter {
    pub fn new(config: &TransmitterConfig) -> Result<Self, Error> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_multicast_ttl_v4(config.ttl)?;

        Ok(Self {
            socket,
            target: SocketAddrV4::new(config.group, config.port).into(),
        })
    }

    /// Sends to a plain unicast address.
    pub fn to(target: SocketAddr) -> Result<Self, Error> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))?;

        Ok(Self { socket, target })
    }

    #[inline]
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transmitter for UdpTransmitter {
    fn send(&mut self, record: &PieceRecord) -> Result<(), Error> {
        let payload = record.encode();

        match self.socket.send_to(&payload, self.target) {
            Ok(_) => {
                trace!(addr = %self.target, material = %record.material, "record sent");
                Ok(())
            }
            Err(err) => {
                warn!(addr = %self.target, error = %err, "record not sent");
                Err(err.into())
            }
        }
    }
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    #[inline]
    fn send(&mut self, record: &PieceRecord) -> Result<(), Error> {
        (**self).send(record)
    }
}

/// Keeps records in memory instead of sending them.
impl Transmitter for Vec<PieceRecord> {
    #[inline]
    fn send(&mut self, record: &PieceRecord) -> Result<(), Error> {
        self.push(*record);
        Ok(())
    }
}
