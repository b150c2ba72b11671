//! Per-sample conversion between packed PCM bytes and the server's native
//! 32-bit float samples.
//!
//! Every function here is pure and total over well-formed inputs: no
//! allocation, no branching on data beyond the format tag, no failure mode.
//! This is what runs once per sample per channel inside the real-time
//! callback, so it must stay branch-predictable.

use crate::format::{Endian, SampleFormat, SampleKind};

/// Encode one float sample (server's native format) into its packed wire
/// representation, writing exactly `format.sample_size_bytes()` bytes into
/// `out`.
///
/// Floats are clamped to `[-1.0, (scale-1)/scale]` before quantization so the
/// resulting integer always fits `[-scale, scale-1]` (see design notes on
/// clamp-on-encode); this is a deliberate tightening of the reference, which
/// let out-of-range floats wrap.
pub fn encode(format: &SampleFormat, sample: f32, out: &mut [u8]) {
    let n = format.sample_size_bytes();
    debug_assert!(out.len() >= n);

    if format.kind == SampleKind::Float {
        let bytes = sample.to_le_bytes();
        let bytes = if format.endian == Endian::Little { bytes } else { reversed(bytes) };
        out[..4].copy_from_slice(&bytes);
        return;
    }

    let scale = format.scale();
    let offset = format.offset();
    let max_sample = (scale - 1.0) / scale;
    let clamped = (sample as f64).clamp(-1.0, max_sample);
    let i = (clamped * scale).round() as i64 + offset;

    let unsigned = i as u64;
    let mut be = [0u8; 8];
    be[8 - n..].copy_from_slice(&unsigned.to_be_bytes()[8 - n..]);
    let packed = &be[8 - n..];

    if format.endian == Endian::Big {
        out[..n].copy_from_slice(packed);
    } else {
        for (dst, src) in out[..n].iter_mut().zip(packed.iter().rev()) {
            *dst = *src;
        }
    }
}

/// Decode one packed wire sample into the server's native float format.
pub fn decode(format: &SampleFormat, bytes: &[u8]) -> f32 {
    let n = format.sample_size_bytes();
    debug_assert!(bytes.len() >= n);

    if format.kind == SampleKind::Float {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[..4]);
        let raw = if format.endian == Endian::Little { raw } else { reversed(raw) };
        return f32::from_le_bytes(raw);
    }

    // Assemble into a big-endian byte layout regardless of wire endian, so
    // sign extension always looks at the true most-significant byte.
    let mut be = [0u8; 8];
    if format.endian == Endian::Big {
        be[8 - n..].copy_from_slice(&bytes[..n]);
    } else {
        for (dst, src) in be[8 - n..].iter_mut().zip(bytes[..n].iter().rev()) {
            *dst = *src;
        }
    }

    let unsigned = u64::from_be_bytes(be);
    let scale = format.scale();
    let offset = format.offset();

    let signed = match format.kind {
        SampleKind::SignedInt => sign_extend(unsigned, format.width),
        // `offset` below already shifts this back into the signed domain
        // (it's `2^(width-1)`, which fits `i64` even at width=32), so no
        // separate sign-bit toggle is needed here.
        SampleKind::UnsignedInt => unsigned as i64,
        SampleKind::Float => unreachable!(),
    };

    ((signed - offset) as f64 / scale) as f32
}

/// Sign-extend the low `width` bits of `value` to a full 64-bit signed value.
fn sign_extend(value: u64, width: u8) -> i64 {
    let shift = 64 - width as u32;
    ((value << shift) as i64) >> shift
}

fn reversed(mut bytes: [u8; 4]) -> [u8; 4] {
    bytes.reverse();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Endian, SampleFormat, SampleKind};
    use approx::assert_relative_eq;

    fn formats() -> Vec<SampleFormat> {
        let mut out = Vec::new();
        for &width in &[8u8, 16, 24, 32] {
            for &kind in &[SampleKind::SignedInt, SampleKind::UnsignedInt] {
                for &endian in &[Endian::Little, Endian::Big] {
                    out.push(SampleFormat::new(width, kind, endian).unwrap());
                }
            }
        }
        out.push(SampleFormat::new(32, SampleKind::Float, Endian::Little).unwrap());
        out.push(SampleFormat::new(32, SampleKind::Float, Endian::Big).unwrap());
        out
    }

    #[test]
    fn integer_roundtrip_is_stable_under_repeated_encode_decode() {
        for format in formats() {
            if format.kind == SampleKind::Float {
                continue;
            }
            for &f in &[-1.0f32, -0.5, 0.0, 0.25, 0.5, 0.999, 1.0] {
                let n = format.sample_size_bytes();
                let mut bytes = vec![0u8; n];
                encode(&format, f, &mut bytes);
                let decoded = decode(&format, &bytes);
                assert!(
                    (-1.0..=1.0).contains(&decoded),
                    "decoded {decoded} out of range for {format:?}"
                );

                let mut re_encoded = vec![0u8; n];
                encode(&format, decoded, &mut re_encoded);
                assert_eq!(bytes, re_encoded, "not stable under re-encode for {format:?}");
            }
        }
    }

    #[test]
    fn float_roundtrip_is_exact() {
        for endian in [Endian::Little, Endian::Big] {
            let format = SampleFormat::new(32, SampleKind::Float, endian).unwrap();
            for &f in &[0.0f32, 1.0, -1.0, 0.123456, -0.987654, 12345.6] {
                let mut bytes = [0u8; 4];
                encode(&format, f, &mut bytes);
                let decoded = decode(&format, &bytes);
                assert_relative_eq!(decoded, f);
            }
        }
    }

    #[test]
    fn endian_symmetry_for_integers() {
        let le = SampleFormat::new(16, SampleKind::SignedInt, Endian::Little).unwrap();
        let be = SampleFormat::new(16, SampleKind::SignedInt, Endian::Big).unwrap();
        for &f in &[-0.75f32, 0.1, 0.999] {
            let mut le_bytes = [0u8; 2];
            let mut be_bytes = [0u8; 2];
            encode(&le, f, &mut le_bytes);
            encode(&be, f, &mut be_bytes);
            let mut reversed = be_bytes;
            reversed.reverse();
            assert_eq!(le_bytes, reversed);
        }
    }

    #[test]
    fn scenario_s2_24bit_be_signed_extremes() {
        let format = SampleFormat::new(24, SampleKind::SignedInt, Endian::Big).unwrap();
        let max_positive = decode(&format, &[0x7F, 0xFF, 0xFF]);
        let max_negative = decode(&format, &[0x80, 0x00, 0x00]);
        assert_relative_eq!(max_positive, 1.0 - 1.0 / 8388608.0, epsilon = 1e-6);
        assert_relative_eq!(max_negative, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn scenario_s3_32bit_float_le_half_scale() {
        let format = SampleFormat::new(32, SampleKind::Float, Endian::Little).unwrap();
        let mut bytes = [0u8; 4];
        encode(&format, 0.5, &mut bytes);
        assert_eq!(bytes, [0x00, 0x00, 0x00, 0x3F]);
    }

    #[test]
    fn scenario_s4_8bit_unsigned_zero_is_midscale() {
        let format = SampleFormat::new(8, SampleKind::UnsignedInt, Endian::Little).unwrap();
        let mut bytes = [0u8; 1];
        encode(&format, 0.0, &mut bytes);
        assert_eq!(bytes, [0x80]);
    }
}
