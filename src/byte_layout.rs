/*!
 * Per-byte bitfield layout of a message: signal fragments plus reserved padding
 */

use serde::Serialize;
use tracing::debug;

use crate::default_image::{compute_default_image, segment_default, DefaultImage};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::message_group::MessageGroup;
use crate::signal_layout::{BitSpan, SignalLayout, FRAME_BYTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Signal,
    Reserved,
}

/// A contiguous bit range inside one byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteSegment {
    pub kind: SegmentKind,
    /// First bit in the byte (0..=7).
    pub start: u8,
    /// Last bit in the byte, inclusive.
    pub end: u8,
    /// Signal name, or a synthesized `_reserved_*` name.
    pub label: String,
    /// The owning signal's default restricted to this segment.
    pub default_bits: Option<u64>,
}

impl ByteSegment {
    fn signal(span: &BitSpan, name: &str, default_value: Option<u64>) -> Self {
        ByteSegment {
            kind: SegmentKind::Signal,
            start: span.bit_offset,
            end: span.last_bit(),
            label: name.to_owned(),
            default_bits: segment_default(span, default_value),
        }
    }

    fn reserved(byte_index: usize, start: u8, end: u8) -> Self {
        let label = if start == 0 && end == 7 {
            format!("_reserved_{byte_index}")
        } else {
            format!("_reserved_{byte_index}_{start}")
        };
        ByteSegment {
            kind: SegmentKind::Reserved,
            start,
            end,
            label,
            default_bits: None,
        }
    }

    pub fn width(&self) -> u8 {
        self.end - self.start + 1
    }

    pub fn is_reserved(&self) -> bool {
        self.kind == SegmentKind::Reserved
    }
}

/// Eight ordered segment lists, one per payload byte, plus the default image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteLayout {
    pub message: String,
    pub id: u32,
    pub bytes: [Vec<ByteSegment>; FRAME_BYTES],
    pub default_image: DefaultImage,
}

/// Lay out one message.
///
/// Signals are placed in row order. A signal whose bits collide with an
/// already placed signal is reported and left out entirely, default included.
/// Bits past byte 7 are dropped with a warning. Every byte ends up covered
/// exactly once from bit 0 to bit 7.
pub fn build_layout(group: &MessageGroup) -> (ByteLayout, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let mut bytes: [Vec<ByteSegment>; FRAME_BYTES] = std::array::from_fn(|_| Vec::new());
    let mut placed: Vec<(SignalLayout, Option<u64>)> = Vec::with_capacity(group.signals.len());
    let mut owners: Vec<(u64, &str)> = Vec::with_capacity(group.signals.len());

    for signal in &group.signals {
        let layout = SignalLayout::from_signal(signal);
        if layout.truncated_bits > 0 {
            diagnostics.report(
                signal.row,
                DiagnosticKind::BitsBeyondFrame {
                    message: group.name.clone(),
                    signal: signal.name.clone(),
                    bits: layout.truncated_bits,
                },
            );
        }

        let mask = layout.frame_mask();
        if let Some((_, other)) = owners.iter().find(|(owned, _)| owned & mask != 0) {
            diagnostics.report(
                signal.row,
                DiagnosticKind::OverlapDetected {
                    message: group.name.clone(),
                    signal: signal.name.clone(),
                    other: (*other).to_owned(),
                },
            );
            continue;
        }
        owners.push((mask, signal.name.as_str()));

        for span in &layout.segments {
            let segment = ByteSegment::signal(span, &signal.name, signal.default_value);
            bytes[span.byte_index].push(segment);
        }
        placed.push((layout, signal.default_value));
    }

    for (byte_index, segments) in bytes.iter_mut().enumerate() {
        fill_reserved(byte_index, segments);
    }

    let default_image =
        compute_default_image(placed.iter().map(|(layout, value)| (layout, *value)));
    debug!(
        message = %group.name,
        placed = placed.len(),
        rejected = group.signals.len() - placed.len(),
        "built byte layout"
    );

    (
        ByteLayout {
            message: group.name.clone(),
            id: group.id,
            bytes,
            default_image,
        },
        diagnostics,
    )
}

/// Sort a byte's signal segments and pad every gap with a reserved segment.
fn fill_reserved(byte_index: usize, segments: &mut Vec<ByteSegment>) {
    segments.sort_by_key(|segment| segment.start);
    let mut filled = Vec::with_capacity(segments.len() * 2 + 1);
    let mut next_free: u8 = 0;
    for segment in segments.drain(..) {
        if segment.start > next_free {
            filled.push(ByteSegment::reserved(byte_index, next_free, segment.start - 1));
        }
        next_free = segment.end + 1;
        filled.push(segment);
    }
    if next_free < 8 {
        filled.push(ByteSegment::reserved(byte_index, next_free, 7));
    }
    *segments = filled;
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;

    use super::*;
    use crate::signal::Signal;

    fn signal(name: &str, start_bit: u32, length: u32, default_value: Option<u64>) -> Signal {
        Signal {
            message_id: 0x10,
            message_name: "MSG_A".to_string(),
            name: name.to_string(),
            start_bit,
            end_bit: start_bit + length - 1,
            length,
            default_value,
            row: 2,
        }
    }

    fn group(signals: Vec<Signal>) -> MessageGroup {
        MessageGroup {
            name: "MSG_A".to_string(),
            id: 0x10,
            signals,
        }
    }

    fn spans(segments: &[ByteSegment]) -> Vec<(&str, u8, u8)> {
        segments
            .iter()
            .map(|s| (s.label.as_str(), s.start, s.end))
            .collect()
    }

    /// Segments must be sorted, contiguous and cover bits 0..=7 exactly.
    fn assert_byte_covered(segments: &[ByteSegment]) {
        let mut next = 0u8;
        for segment in segments {
            assert_eq!(segment.start, next, "gap or overlap in {:?}", segments);
            assert!(segment.end >= segment.start);
            next = segment.end + 1;
        }
        assert_eq!(next, 8, "byte not fully covered: {:?}", segments);
        let width: u32 = segments.iter().map(|s| u32::from(s.width())).sum();
        assert_eq!(width, 8);
    }

    #[test]
    fn test_single_flag() {
        let (layout, diagnostics) = build_layout(&group(vec![signal("Flag", 0, 1, Some(1))]));
        assert!(diagnostics.is_empty());
        assert_eq!(spans(&layout.bytes[0]), vec![("Flag", 0, 0), ("_reserved_0_1", 1, 7)]);
        assert_eq!(layout.bytes[0][1].width(), 7);
        assert!(layout.bytes[0][1].is_reserved());
        assert_eq!(layout.default_image.bytes()[0], 0xFF);
        for byte_index in 1..FRAME_BYTES {
            assert_eq!(layout.bytes[byte_index].len(), 1);
            assert_eq!(layout.bytes[byte_index][0].label, format!("_reserved_{byte_index}"));
        }
    }

    #[test]
    fn test_flag_and_mode() {
        let (layout, _) = build_layout(&group(vec![
            signal("Flag", 0, 1, Some(1)),
            signal("Mode", 1, 2, Some(2)),
        ]));
        assert_eq!(
            spans(&layout.bytes[0]),
            vec![("Flag", 0, 0), ("Mode", 1, 2), ("_reserved_0_3", 3, 7)]
        );
        assert_eq!(layout.default_image.bytes()[0], 0xFD);
        assert_eq!(layout.bytes[0][1].default_bits, Some(2));
    }

    #[test]
    fn test_gaps_are_filled_in_order() {
        // row order differs from bit order
        let (layout, _) = build_layout(&group(vec![
            signal("High", 6, 2, None),
            signal("Low", 2, 1, None),
        ]));
        assert_eq!(
            spans(&layout.bytes[0]),
            vec![
                ("_reserved_0_0", 0, 1),
                ("Low", 2, 2),
                ("_reserved_0_3", 3, 5),
                ("High", 6, 7),
            ]
        );
    }

    #[test]
    fn test_long_signal_repeats_its_name() {
        let (layout, _) = build_layout(&group(vec![signal("Counter", 4, 10, Some(0x3FF))]));
        assert_eq!(
            spans(&layout.bytes[0]),
            vec![("_reserved_0_0", 0, 3), ("Counter", 4, 7)]
        );
        assert_eq!(
            spans(&layout.bytes[1]),
            vec![("Counter", 0, 5), ("_reserved_1_6", 6, 7)]
        );
        assert_eq!(layout.bytes[0][1].width(), 4);
        assert_eq!(layout.bytes[1][0].width(), 6);
        assert_eq!(layout.bytes[0][1].default_bits, Some(0xF));
        assert_eq!(layout.bytes[1][0].default_bits, Some(0x3F));
    }

    #[test]
    fn test_no_defaults_gives_idle_image() {
        let (layout, _) = build_layout(&group(vec![
            signal("A", 0, 8, None),
            signal("B", 8, 16, None),
        ]));
        assert_eq!(layout.default_image.bytes(), [0xFF; FRAME_BYTES]);
    }

    #[test]
    fn test_overlap_is_rejected() {
        let (layout, diagnostics) = build_layout(&group(vec![
            signal("A", 0, 4, Some(0)),
            signal("B", 2, 4, Some(0)),
        ]));
        assert_eq!(
            diagnostics.errors[0].kind,
            DiagnosticKind::OverlapDetected {
                message: "MSG_A".to_string(),
                signal: "B".to_string(),
                other: "A".to_string()
            }
        );
        assert_eq!(spans(&layout.bytes[0]), vec![("A", 0, 3), ("_reserved_0_4", 4, 7)]);
        // B's default never reaches the image
        assert_eq!(layout.default_image.bytes()[0], 0xF0);
    }

    #[test]
    fn test_bits_beyond_frame_warn_and_drop() {
        let (layout, diagnostics) = build_layout(&group(vec![
            signal("Tail", 60, 8, Some(0)),
            signal("Gone", 70, 2, None),
        ]));
        assert!(diagnostics.errors.is_empty());
        assert_eq!(diagnostics.warnings.len(), 2);
        assert_eq!(
            diagnostics.warnings[0].kind,
            DiagnosticKind::BitsBeyondFrame {
                message: "MSG_A".to_string(),
                signal: "Tail".to_string(),
                bits: 4
            }
        );
        assert_eq!(spans(&layout.bytes[7]), vec![("_reserved_7_0", 0, 3), ("Tail", 4, 7)]);
        assert_eq!(layout.default_image.bytes()[7], 0x0F);
    }

    #[test]
    fn test_random_layouts_cover_every_byte() {
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..200 {
            let count = rng.random_range(1..12);
            let signals = (0..count)
                .map(|i| {
                    let start = rng.random_range(0..72u32);
                    let length = rng.random_range(1..24u32);
                    let default_value = rng.random_bool(0.5).then(|| rng.random::<u64>());
                    signal(&format!("s{i}"), start, length, default_value)
                })
                .collect();
            let (layout, _) = build_layout(&group(signals));
            for segments in &layout.bytes {
                assert_byte_covered(segments);
            }
        }
    }
}
