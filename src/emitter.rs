//! Turns ranked estimates into OSC messages and hands them to a transport.
//!
//! Every estimate of a frame becomes one message addressed `/point/<rank>`
//! carrying four floats, `x y z energy`. Delivery is fire-and-forget: a
//! failed send is logged and counted, never retried, and never stops the
//! run.

use crate::estimator::DirectionEstimate;
use crate::pacer::Pacer;
use crate::ranker::RankedTopK;

use log::warn;
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::{
    borrow::Cow,
    fmt, io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
};

/// Default destination host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default destination port.
pub const DEFAULT_PORT: u16 = 7000;

/// Address prefix of every point message.
pub const POINT_ADDRESS_PREFIX: &str = "/point/";

/// Errors raised while getting a point onto the wire.
#[derive(Debug)]
pub enum EmitError {
    /// The destination host did not resolve to any address.
    NoAddress(String),

    /// Socket level failure.
    Io(io::Error),

    /// The OSC encoder refused the message.
    Encode(rosc::OscError),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            EmitError::NoAddress(host) => Cow::from(format!("could not resolve {}", host)),
            EmitError::Io(error) => Cow::from(format!("io error: {}", error)),
            EmitError::Encode(error) => Cow::from(format!("osc encoding error: {:?}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for EmitError {}

impl From<io::Error> for EmitError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rosc::OscError> for EmitError {
    fn from(value: rosc::OscError) -> Self {
        Self::Encode(value)
    }
}

/// The wire form of one ranked estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutboundPoint {
    /// Rank within the frame, 0 is the loudest
    pub index: usize,
    /// Unit vector x component
    pub x: f32,
    /// Unit vector y component
    pub y: f32,
    /// Unit vector z component
    pub z: f32,
    /// Bin energy
    pub energy: f32,
}

impl OutboundPoint {
    /// The point for the estimate at `rank`.
    pub fn from_ranked(rank: usize, estimate: &DirectionEstimate) -> Self {
        Self {
            index: rank,
            x: estimate.x as f32,
            y: estimate.y as f32,
            z: estimate.z as f32,
            energy: estimate.energy as f32,
        }
    }

    /// OSC address, `/point/<rank>`.
    pub fn address(&self) -> String {
        format!("{}{}", POINT_ADDRESS_PREFIX, self.index)
    }

    /// Message arguments in wire order.
    pub fn payload(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.energy]
    }

    /// The OSC packet for this point.
    pub fn to_packet(&self) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: self.address(),
            args: self.payload().into_iter().map(OscType::Float).collect(),
        })
    }
}

/// Anything that can carry a point to the consumer.
pub trait Transport {
    /// Sends one point. No acknowledgement is expected.
    fn send(&mut self, point: &OutboundPoint) -> Result<(), EmitError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, point: &OutboundPoint) -> Result<(), EmitError> {
        (**self).send(point)
    }
}

/// OSC over UDP to a single destination.
#[derive(Debug)]
pub struct OscTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl OscTransport {
    /// Resolves `host:port` and binds an ephemeral local socket of the
    /// matching address family.
    pub fn connect(host: &str, port: u16) -> Result<Self, EmitError> {
        let destination = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| EmitError::NoAddress(host.to_string()))?;

        let local: SocketAddr = if destination.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)?;

        Ok(Self {
            socket,
            destination,
        })
    }

    /// Where the points are going.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl Transport for OscTransport {
    fn send(&mut self, point: &OutboundPoint) -> Result<(), EmitError> {
        let buf = encoder::encode(&point.to_packet())?;
        self.socket.send_to(&buf, self.destination)?;
        Ok(())
    }
}

/// What happened to one frame's worth of points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Points handed to the transport successfully
    pub sent: usize,
    /// Points the transport rejected
    pub failed: usize,
}

/// Sends ranked frames through a [Transport] and paces the stream.
pub struct StreamEmitter<T: Transport> {
    transport: T,
    pacer: Pacer,
}

impl<T: Transport> StreamEmitter<T> {
    /// An emitter that pauses with `pacer` after each frame.
    pub fn new(transport: T, pacer: Pacer) -> Self {
        Self { transport, pacer }
    }

    /// Sends every estimate of the frame, rank 0 first.
    pub fn emit(&mut self, ranked: &RankedTopK) -> EmitReport {
        let mut report = EmitReport::default();

        for (rank, estimate) in ranked.iter().enumerate() {
            let point = OutboundPoint::from_ranked(rank, estimate);
            match self.transport.send(&point) {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    warn!("failed to send {} : {}", point.address(), error);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Waits out the inter-frame delay.
    pub fn pace(&self) {
        self.pacer.pause();
    }

    /// Gives the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Remembers everything it was asked to send, optionally failing some.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<OutboundPoint>,
        fail_rank: Option<usize>,
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, point: &OutboundPoint) -> Result<(), EmitError> {
            if Some(point.index) == self.fail_rank {
                return Err(EmitError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "network unreachable",
                )));
            }
            self.sent.push(*point);
            Ok(())
        }
    }

    fn ranked(energies: &[f64]) -> RankedTopK {
        let estimates = energies
            .iter()
            .enumerate()
            .map(|(bin, &energy)| DirectionEstimate {
                bin: bin + 1,
                x: 0.0,
                y: 0.6,
                z: 0.8,
                energy,
            })
            .collect();
        RankedTopK::rank(estimates, 3)
    }

    #[test]
    fn point_wire_form() {
        let point = OutboundPoint {
            index: 12,
            x: 0.0,
            y: -1.0,
            z: 0.0,
            energy: 3.5,
        };

        assert_eq!(point.address(), "/point/12");
        match point.to_packet() {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/point/12");
                assert_eq!(
                    msg.args,
                    vec![
                        OscType::Float(0.0),
                        OscType::Float(-1.0),
                        OscType::Float(0.0),
                        OscType::Float(3.5)
                    ]
                );
            }
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[test]
    fn emits_ranks_in_order() {
        let mut transport = RecordingTransport::default();
        let mut emitter = StreamEmitter::new(&mut transport, Pacer::new(Duration::ZERO));

        let report = emitter.emit(&ranked(&[1.0, 7.0, 3.0, 9.0, 2.0]));
        assert_eq!(report, EmitReport { sent: 3, failed: 0 });

        let sent = &transport.sent;
        assert_eq!(sent.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(sent.iter().map(|p| p.energy).collect::<Vec<_>>(), vec![9.0, 7.0, 3.0]);
    }

    #[test]
    fn failures_are_counted_not_fatal() {
        let mut transport = RecordingTransport {
            fail_rank: Some(1),
            ..Default::default()
        };
        let mut emitter = StreamEmitter::new(&mut transport, Pacer::new(Duration::ZERO));

        let report = emitter.emit(&ranked(&[1.0, 2.0, 3.0]));
        assert_eq!(report, EmitReport { sent: 2, failed: 1 });
        assert_eq!(transport.sent.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn udp_transport_delivers_osc() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut transport = OscTransport::connect("127.0.0.1", port).unwrap();
        let point = OutboundPoint {
            index: 0,
            x: 1.0,
            y: 0.0,
            z: 0.0,
            energy: 0.25,
        };
        transport.send(&point).unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = listener.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
        assert_eq!(packet, point.to_packet());
    }
}
