//! Sample format configuration: width, signedness, and byte order.
//!
//! Replaces the reference tool's bitfield-encoded `format` integer with an
//! explicit, immutable configuration record. Derivations (byte count, scale,
//! offset) are small total functions over this record.

use std::fmt;

/// Sample kind: signed integer, unsigned integer, or IEEE-754 float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    SignedInt,
    UnsignedInt,
    Float,
}

impl SampleKind {
    /// Full option names, in prefix-match order (longest unambiguous prefix wins).
    pub const NAMES: [(&'static str, SampleKind); 3] = [
        ("signed-integer", SampleKind::SignedInt),
        ("unsigned-integer", SampleKind::UnsignedInt),
        ("floating-point", SampleKind::Float),
    ];

    /// Resolve a user-supplied string against [`NAMES`](Self::NAMES) by prefix,
    /// mirroring the reference's `strncmp(optarg, name, strlen(optarg))` match.
    /// Ambiguous or empty prefixes are rejected.
    pub fn from_prefix(s: &str) -> Option<SampleKind> {
        if s.is_empty() {
            return None;
        }
        let mut matches = Self::NAMES.iter().filter(|(name, _)| name.starts_with(s));
        let first = matches.next()?;
        if matches.next().is_some() {
            None
        } else {
            Some(first.1)
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::NAMES.iter().find(|(_, k)| *k == *self).unwrap().0;
        f.write_str(name)
    }
}

/// Byte order for a sample on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Bit width of a sample: 8, 16, 24, or 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFormat {
    pub width: u8,
    pub kind: SampleKind,
    pub endian: Endian,
}

impl SampleFormat {
    /// Construct a format, enforcing the `kind=float ⇒ width=32` invariant.
    pub fn new(width: u8, kind: SampleKind, endian: Endian) -> Option<Self> {
        match (width, kind) {
            (8 | 16 | 24 | 32, SampleKind::Float) if width != 32 => None,
            (8 | 16 | 24 | 32, _) => Some(Self { width, kind, endian }),
            _ => None,
        }
    }

    /// Bytes occupied by one sample: `ceil(width / 8)`, 3 for 24-bit, never 4.
    pub fn sample_size_bytes(&self) -> usize {
        ((self.width as usize) + 7) / 8
    }

    /// Quantization scale: `2^(width-1)`.
    pub fn scale(&self) -> f64 {
        (1u64 << (self.width - 1)) as f64
    }

    /// Integer zero-point offset: 0 for signed, `2^(width-1)` for unsigned
    /// (the standard unsigned-PCM convention: silence sits at mid-scale, e.g.
    /// 128 for 8-bit, so the full range maps to `[0, 2^width - 1]`).
    pub fn offset(&self) -> i64 {
        match self.kind {
            SampleKind::SignedInt | SampleKind::Float => 0,
            SampleKind::UnsignedInt => 1i64 << (self.width - 1),
        }
    }
}

/// Interleaved-frame geometry derived from a [`SampleFormat`] and a channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub channels: usize,
    pub sample_size_bytes: usize,
}

impl FrameLayout {
    pub fn new(format: &SampleFormat, channels: usize) -> Self {
        Self {
            channels,
            sample_size_bytes: format.sample_size_bytes(),
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels * self.sample_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_must_be_32_bit() {
        assert!(SampleFormat::new(16, SampleKind::Float, Endian::Little).is_none());
        assert!(SampleFormat::new(32, SampleKind::Float, Endian::Little).is_some());
    }

    #[test]
    fn sample_size_24_bit_is_three_bytes() {
        let f = SampleFormat::new(24, SampleKind::SignedInt, Endian::Little).unwrap();
        assert_eq!(f.sample_size_bytes(), 3);
    }

    #[test]
    fn prefix_match_resolves_unambiguous_prefixes() {
        assert_eq!(SampleKind::from_prefix("s"), Some(SampleKind::SignedInt));
        assert_eq!(SampleKind::from_prefix("u"), Some(SampleKind::UnsignedInt));
        assert_eq!(SampleKind::from_prefix("f"), Some(SampleKind::Float));
        assert_eq!(SampleKind::from_prefix("signed-integer"), Some(SampleKind::SignedInt));
    }

    #[test]
    fn prefix_match_rejects_empty_and_unknown() {
        assert_eq!(SampleKind::from_prefix(""), None);
        assert_eq!(SampleKind::from_prefix("xyz"), None);
    }

    #[test]
    fn bytes_per_frame_accounts_for_channels() {
        let f = SampleFormat::new(16, SampleKind::SignedInt, Endian::Little).unwrap();
        let layout = FrameLayout::new(&f, 2);
        assert_eq!(layout.bytes_per_frame(), 4);
    }
}
