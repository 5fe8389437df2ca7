//! The receiving end of the point stream.
//!
//! [decode_points] pulls `/point/<rank>` messages out of a UDP datagram and
//! [PointTable] turns the stream of instantaneous points into something
//! pleasant to watch: each rank owns a slot that eases towards the latest
//! position and energy and fades out when the rank stops being refreshed.

use rosc::{decoder, OscMessage, OscPacket, OscType};

use crate::emitter::POINT_ADDRESS_PREFIX;

/// Target energy multiplier applied on every tick.
pub const DEFAULT_DECAY_RATE: f32 = 0.95;

/// Slots with less displayed energy than this are hidden.
pub const VISIBILITY_THRESHOLD: f32 = 0.01;

/// Energy easing speed, per second.
const ENERGY_SMOOTHING: f32 = 10.0;

/// Position easing speed, per second.
const POSITION_SMOOTHING: f32 = 8.0;

/// One decoded `/point/<rank>` message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceivedPoint {
    /// Rank within its frame
    pub rank: usize,
    /// Position, unit length as sent
    pub position: [f32; 3],
    /// Bin energy
    pub energy: f32,
}

fn as_f32(arg: &OscType) -> Option<f32> {
    match *arg {
        OscType::Float(v) => Some(v),
        OscType::Double(v) => Some(v as f32),
        OscType::Int(v) => Some(v as f32),
        OscType::Long(v) => Some(v as f32),
        _ => None,
    }
}

fn point_from_message(msg: &OscMessage) -> Option<ReceivedPoint> {
    let rank = msg.addr.strip_prefix(POINT_ADDRESS_PREFIX)?.parse().ok()?;
    if msg.args.len() < 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (value, arg) in values.iter_mut().zip(&msg.args) {
        *value = as_f32(arg)?;
    }

    Some(ReceivedPoint {
        rank,
        position: [values[0], values[1], values[2]],
        energy: values[3],
    })
}

fn collect_points(packet: &OscPacket, points: &mut Vec<ReceivedPoint>) {
    match packet {
        OscPacket::Message(msg) => points.extend(point_from_message(msg)),
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                collect_points(inner, points);
            }
        }
    }
}

/// Every well-formed point message in one datagram, in order. Anything
/// else, including undecodable bytes, is ignored.
pub fn decode_points(datagram: &[u8]) -> Vec<ReceivedPoint> {
    let mut points = Vec::new();
    if let Ok((_, packet)) = decoder::decode_udp(datagram) {
        collect_points(&packet, &mut points);
    }
    points
}

/// Display state of one rank.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointSlot {
    /// Where the point is drawn
    pub position: [f32; 3],
    /// Where it is heading
    pub target_position: [f32; 3],
    /// How big it is drawn
    pub energy: f32,
    /// What the energy is easing towards
    pub target_energy: f32,
}

impl PointSlot {
    /// Whether the slot is currently worth drawing.
    pub fn is_visible(&self) -> bool {
        self.energy >= VISIBILITY_THRESHOLD
    }
}

/// Fixed set of slots, one per rank.
#[derive(Debug, Clone)]
pub struct PointTable {
    slots: Vec<PointSlot>,
    decay_rate: f32,
}

impl PointTable {
    /// A table with `max_points` slots and the default decay.
    pub fn new(max_points: usize) -> Self {
        Self::with_decay(max_points, DEFAULT_DECAY_RATE)
    }

    /// A table with a custom per-tick decay of the target energy.
    pub fn with_decay(max_points: usize, decay_rate: f32) -> Self {
        Self {
            slots: vec![PointSlot::default(); max_points],
            decay_rate,
        }
    }

    /// Retargets the slot of the point's rank. Ranks beyond the table are
    /// ignored; returns whether the point was taken.
    pub fn apply(&mut self, point: &ReceivedPoint) -> bool {
        match self.slots.get_mut(point.rank) {
            Some(slot) => {
                slot.target_position = point.position;
                slot.target_energy = point.energy;
                true
            }
            None => false,
        }
    }

    /// Advances the animation by `dt` seconds: eases every slot towards its
    /// target, then decays the targets.
    pub fn tick(&mut self, dt: f32) {
        let energy_step = (dt * ENERGY_SMOOTHING).clamp(0.0, 1.0);
        let position_step = (dt * POSITION_SMOOTHING).clamp(0.0, 1.0);

        for slot in &mut self.slots {
            slot.energy += (slot.target_energy - slot.energy) * energy_step;
            for (p, t) in slot.position.iter_mut().zip(slot.target_position) {
                *p += (t - *p) * position_step;
            }
            slot.target_energy *= self.decay_rate;
        }
    }

    /// Visible slots with their ranks.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &PointSlot)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_visible())
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::OutboundPoint;
    use rosc::{encoder, OscBundle, OscTime};

    fn wire(index: usize, xyz: [f32; 3], energy: f32) -> Vec<u8> {
        let point = OutboundPoint {
            index,
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            energy,
        };
        encoder::encode(&point.to_packet()).unwrap()
    }

    #[test]
    fn decodes_what_the_emitter_sends() {
        let points = decode_points(&wire(7, [0.0, 0.6, 0.8], 2.5));
        assert_eq!(
            points,
            vec![ReceivedPoint {
                rank: 7,
                position: [0.0, 0.6, 0.8],
                energy: 2.5
            }]
        );
    }

    #[test]
    fn ignores_foreign_and_short_messages() {
        let other = OscPacket::Message(OscMessage {
            addr: "/volume".to_string(),
            args: vec![OscType::Float(1.0); 4],
        });
        let short = OscPacket::Message(OscMessage {
            addr: "/point/1".to_string(),
            args: vec![OscType::Float(1.0); 3],
        });
        let bad_rank = OscPacket::Message(OscMessage {
            addr: "/point/left".to_string(),
            args: vec![OscType::Float(1.0); 4],
        });

        for packet in [other, short, bad_rank] {
            assert!(decode_points(&encoder::encode(&packet).unwrap()).is_empty());
        }
        assert!(decode_points(b"garbage").is_empty());
    }

    #[test]
    fn unpacks_bundles_and_mixed_numbers() {
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime::from((0, 1)),
            content: vec![
                OscPacket::Message(OscMessage {
                    addr: "/point/0".to_string(),
                    args: vec![
                        OscType::Double(1.0),
                        OscType::Int(0),
                        OscType::Float(0.0),
                        OscType::Float(4.0),
                    ],
                }),
                OscPacket::Message(OscMessage {
                    addr: "/point/1".to_string(),
                    args: vec![OscType::Float(0.0); 4],
                }),
            ],
        });

        let points = decode_points(&encoder::encode(&bundle).unwrap());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].position, [1.0, 0.0, 0.0]);
        assert_eq!(points[0].energy, 4.0);
        assert_eq!(points[1].rank, 1);
    }

    #[test]
    fn slots_ease_in_and_fade_out() {
        let mut table = PointTable::new(4);
        let point = ReceivedPoint {
            rank: 2,
            position: [0.0, 0.0, 1.0],
            energy: 1.0,
        };

        assert!(table.apply(&point));
        assert!(!table.apply(&ReceivedPoint { rank: 4, ..point }));
        assert_eq!(table.visible().count(), 0);

        table.tick(0.05);
        let (rank, slot) = table.visible().next().unwrap();
        assert_eq!(rank, 2);
        assert!((slot.energy - 0.5).abs() < 1e-6);
        assert!((slot.position[2] - 0.4).abs() < 1e-6);
        assert!((slot.target_energy - 0.95).abs() < 1e-6);

        for _ in 0..500 {
            table.tick(0.05);
        }
        assert_eq!(table.visible().count(), 0);
        assert_eq!(table.capacity(), 4);
    }
}
