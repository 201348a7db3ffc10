//! Cross-domain channel value conversion.
//!
//! Three numeric domains exist per channel: LDR (8-bit fixed point),
//! HDR (16-bit fixed point) and float (linear, unclamped). Conversions
//! into a fixed-point domain clamp to `[0, 1]` and round to nearest;
//! conversions into float divide by the domain maximum and never clamp.
//! The fixed-to-fixed conversions compose through float, so `ldr_to_hdr`
//! is exactly `round(v * 65535 / 255)`.

use crate::format::Domain;

/// 8-bit fixed-point channel value.
pub type LdrValue = u8;
/// 16-bit fixed-point channel value.
pub type HdrValue = u16;
/// 32-bit float channel value.
pub type FloatValue = f32;

/// LDR to float: `v / 255`.
#[inline]
pub fn ldr_to_float(v: LdrValue) -> FloatValue {
    v as f32 / 255.0
}

/// HDR to float: `v / 65535`.
#[inline]
pub fn hdr_to_float(v: HdrValue) -> FloatValue {
    v as f32 / 65535.0
}

/// Float to LDR: `round(clamp(v, 0, 1) * 255)`.
#[inline]
pub fn float_to_ldr(v: FloatValue) -> LdrValue {
    libm::roundf(v.clamp(0.0, 1.0) * 255.0) as u8
}

/// Float to HDR: `round(clamp(v, 0, 1) * 65535)`.
#[inline]
pub fn float_to_hdr(v: FloatValue) -> HdrValue {
    libm::roundf(v.clamp(0.0, 1.0) * 65535.0) as u16
}

/// LDR to HDR, composed through float.
#[inline]
pub fn ldr_to_hdr(v: LdrValue) -> HdrValue {
    float_to_hdr(ldr_to_float(v))
}

/// HDR to LDR, composed through float.
#[inline]
pub fn hdr_to_ldr(v: HdrValue) -> LdrValue {
    float_to_ldr(hdr_to_float(v))
}

/// Decode one stored channel value to float, without clamping.
///
/// `bytes` must hold at least `domain` byte size at `offset`; callers
/// validate bounds before decoding.
#[inline]
pub(crate) fn decode_channel(bytes: &[u8], offset: usize, domain: Domain) -> f32 {
    match domain {
        Domain::Ldr => ldr_to_float(bytes[offset]),
        Domain::Hdr => hdr_to_float(u16::from_le_bytes([bytes[offset], bytes[offset + 1]])),
        Domain::Float => f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]),
    }
}

/// Encode a float value into one stored channel.
///
/// Fixed-point domains clamp and round per the conversion rules; the
/// float domain stores the value untouched.
#[inline]
pub(crate) fn encode_channel(bytes: &mut [u8], offset: usize, domain: Domain, v: f32) {
    match domain {
        Domain::Ldr => bytes[offset] = float_to_ldr(v),
        Domain::Hdr => bytes[offset..offset + 2].copy_from_slice(&float_to_hdr(v).to_le_bytes()),
        Domain::Float => bytes[offset..offset + 4].copy_from_slice(&v.to_le_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldr_float_round_trip_exact() {
        for v in 0..=255u8 {
            assert_eq!(float_to_ldr(ldr_to_float(v)), v);
        }
    }

    #[test]
    fn hdr_float_round_trip_within_one() {
        for v in (0..=65535u16).step_by(7) {
            let back = float_to_hdr(hdr_to_float(v));
            assert!(back.abs_diff(v) <= 1, "{v} -> {back}");
        }
        assert_eq!(float_to_hdr(hdr_to_float(65535)), 65535);
        assert_eq!(float_to_hdr(hdr_to_float(0)), 0);
    }

    #[test]
    fn float_clamps_into_fixed_domains() {
        assert_eq!(float_to_ldr(-0.25), 0);
        assert_eq!(float_to_ldr(1.75), 255);
        assert_eq!(float_to_hdr(-1.0), 0);
        assert_eq!(float_to_hdr(2.0), 65535);
    }

    #[test]
    fn fixed_to_fixed_composes_through_float() {
        assert_eq!(ldr_to_hdr(0), 0);
        assert_eq!(ldr_to_hdr(255), 65535);
        // round(128 * 65535 / 255) = round(32896.0)
        assert_eq!(ldr_to_hdr(128), 32896);
        assert_eq!(hdr_to_ldr(65535), 255);
        assert_eq!(hdr_to_ldr(32896), 128);
    }

    #[test]
    fn decode_encode_ldr() {
        let mut bytes = [0u8; 3];
        encode_channel(&mut bytes, 1, Domain::Ldr, 1.0);
        assert_eq!(bytes, [0, 255, 0]);
        assert_eq!(decode_channel(&bytes, 1, Domain::Ldr), 1.0);
    }

    #[test]
    fn decode_encode_hdr() {
        let mut bytes = [0u8; 4];
        encode_channel(&mut bytes, 2, Domain::Hdr, 1.0);
        assert_eq!(&bytes[2..4], &65535u16.to_le_bytes());
        assert_eq!(decode_channel(&bytes, 2, Domain::Hdr), 1.0);
    }

    #[test]
    fn float_domain_is_unclamped() {
        let mut bytes = [0u8; 4];
        encode_channel(&mut bytes, 0, Domain::Float, 4.5);
        assert_eq!(decode_channel(&bytes, 0, Domain::Float), 4.5);
        encode_channel(&mut bytes, 0, Domain::Float, -2.0);
        assert_eq!(decode_channel(&bytes, 0, Domain::Float), -2.0);
    }
}
