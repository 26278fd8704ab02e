/*!
 * Default byte image of a message: the bytes it holds before any signal carries data
 */

use serde::Serialize;

use crate::signal_layout::{BitSpan, SignalLayout, FRAME_BYTES};

/// Recessive (idle) bus level: every unassigned bit reads 1.
pub const IDLE_BYTE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DefaultImage([u8; FRAME_BYTES]);

impl Default for DefaultImage {
    fn default() -> Self {
        DefaultImage::idle()
    }
}

impl DefaultImage {
    pub fn idle() -> Self {
        DefaultImage([IDLE_BYTE; FRAME_BYTES])
    }

    /// Write a whole signal's default into the image, bit by bit.
    ///
    /// Done on the unsplit signal so a long default is laid down consistently
    /// across every byte it touches. A signal without a default leaves its bits
    /// at the idle level.
    pub fn apply(&mut self, layout: &SignalLayout, default_value: Option<u64>) {
        if let Some(value) = default_value {
            layout.pack(&mut self.0, value);
        }
    }

    pub fn bytes(&self) -> [u8; FRAME_BYTES] {
        self.0
    }
}

/// Build the image for a set of placed signals, in placement order.
pub fn compute_default_image<'a, I>(placed: I) -> DefaultImage
where
    I: IntoIterator<Item = (&'a SignalLayout, Option<u64>)>,
{
    let mut image = DefaultImage::idle();
    for (layout, default_value) in placed {
        image.apply(layout, default_value);
    }
    image
}

/// The slice of a signal's default that falls inside one segment, re-based to
/// the segment. Only used to annotate segments; the image above is canonical.
pub fn segment_default(span: &BitSpan, default_value: Option<u64>) -> Option<u64> {
    default_value.map(|value| u64::from(span.bits_of(value)))
}
