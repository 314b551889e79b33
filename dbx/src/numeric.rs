//! Int-vs-float classification and field-name hint tables for DBX numeric
//! vectors (spec §3.2 / §4.3 / §4.4).

use crate::float_fmt::{format_float, format_float32};

/// Field names (the first attribute's value) that force a width-4 vector to
/// decode/encode as signed 32-bit integers, never floats.
pub const HASHES: &[&str] = &[
    "OriginalHashedWaveName",
    "HashedName",
    "HashedWaveName",
    "OnRoadMaterialNameHashes",
    "Hash",
    "Id",
    "CompositeMeshPartNames",
];

/// Field names that force a width-2 (`u16`) vector.
pub const HALVES: &[&str] = &[
    "SphereKeyW",
    "SphereKeyY",
    "SphereKeyZ",
    "TargetId",
    "SourceId",
    "SphereKeyX",
];

/// Field names that force a width-8 (`f64`) vector.
pub const DOUBLES: &[&str] = &[
    "AwareForgetTime",
    "LineOfSightTestTime",
    "SensingTimeSpan",
    "FireKeepTime",
    "LostForgetTime",
    "TimeUntilUnseenIsLost",
    "AttackerTrackTime",
];

/// Field names whose empty content is still a valid zero-length width-4
/// vector, rather than an empty string value.
pub const EMPTYNUMS: &[&str] = &[
    "NeighbourLinks",
    "LeftCurve",
    "ForwardGearSpeeds",
    "DownCurve",
    "CompositeMeshPartNames",
    "RandomEventWeight",
    "RightCurve",
    "ShCoefficientsLightDelta",
    "ShCoefficientsLight",
    "FirstPartHealthStateNetworkIds",
    "ReverseGearSpeeds",
    "ZOcclusionLookup",
    "ForwardGearRatios",
    "DisallowedIndices",
    "SkinnedMeshTransforms",
    "UpCurve",
    "FirstPartHealthStateIndices",
    "ShCoefficientsShadow",
    "ReverseGearRatios",
];

/// One element of a decoded/encoded numeric vector, tagged by how it was
/// (or will be) rendered as text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorElement {
    Int32(i32),
    Float32(f32),
    UInt16(u16),
    Float64(f64),
    /// Stride-4 slot that was `00 00 00 00` across the whole vector.
    ZeroMarker,
    /// Stride-4 slot that was `CD CD CD CD` across the whole vector.
    NonzeroMarker,
}

impl VectorElement {
    pub fn to_text(self) -> String {
        match self {
            VectorElement::Int32(n) => n.to_string(),
            VectorElement::Float32(f) => format_float32(f),
            VectorElement::UInt16(n) => n.to_string(),
            VectorElement::Float64(f) => format_float(f),
            VectorElement::ZeroMarker => "*zero*".to_string(),
            VectorElement::NonzeroMarker => "*nonzero*".to_string(),
        }
    }
}

/// The reference tool's `intfloat` range test: a raw big-endian 4-byte slot
/// is treated as a plain integer iff its top byte is zero (small positive)
/// or its top 9 bits (arithmetic shift by 23) are all-ones (a likely
/// non-normal float pattern). Everything else renders as a `binary32`.
pub fn looks_like_int(raw: [u8; 4]) -> bool {
    let n = i32::from_be_bytes(raw);
    (n >> 24) == 0 || matches!(n >> 23, 255 | -1)
}

/// Classify one width-4 slot, honoring the `HASHES` field override (always
/// integer) ahead of the per-element heuristic.
pub fn classify_slot(raw: [u8; 4], field: &str) -> VectorElement {
    let n = i32::from_be_bytes(raw);
    if HASHES.contains(&field) {
        return VectorElement::Int32(n);
    }
    if looks_like_int(raw) {
        VectorElement::Int32(n)
    } else {
        log::debug!("field {field:?}: slot {raw:02x?} classified as float by fallthrough");
        VectorElement::Float32(f32::from_be_bytes(raw))
    }
}

/// Stride-4 sentinel state while scanning a width-4 vector (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq)]
enum StrideState {
    Undetermined,
    AllZero,
    AllNonzero,
    Mixed,
}

/// Decode a width-4 numeric vector, applying stride-4 sentinel detection
/// when `raw.len()` is a positive multiple of 4 (spec §3.2, §4.3).
pub fn decode_vector_w4(raw: &[[u8; 4]], field: &str) -> Vec<VectorElement> {
    let n = raw.len();
    if n == 0 || n % 4 != 0 {
        return raw.iter().map(|slot| classify_slot(*slot, field)).collect();
    }

    let mut state = StrideState::Undetermined;
    for i in (3..n).step_by(4) {
        let slot = raw[i];
        match state {
            StrideState::Undetermined => {
                if slot == [0, 0, 0, 0] {
                    state = StrideState::AllZero;
                } else if slot == [0xCD; 4] {
                    state = StrideState::AllNonzero;
                }
            }
            StrideState::AllZero => {
                if slot != [0, 0, 0, 0] {
                    state = StrideState::Mixed;
                    break;
                }
            }
            StrideState::AllNonzero => {
                if slot != [0xCD; 4] {
                    state = StrideState::Mixed;
                    break;
                }
            }
            StrideState::Mixed => break,
        }
    }

    match state {
        StrideState::AllZero => (0..n)
            .map(|i| {
                if i % 4 == 3 {
                    VectorElement::ZeroMarker
                } else {
                    classify_slot(raw[i], field)
                }
            })
            .collect(),
        StrideState::AllNonzero => (0..n)
            .map(|i| {
                if i % 4 == 3 {
                    VectorElement::NonzeroMarker
                } else {
                    classify_slot(raw[i], field)
                }
            })
            .collect(),
        StrideState::Undetermined | StrideState::Mixed => {
            raw.iter().map(|slot| classify_slot(*slot, field)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_positive_is_int() {
        assert!(looks_like_int(0x00_00_00_2A_i32.to_be_bytes()));
    }

    #[test]
    fn negative_one_is_int() {
        assert!(looks_like_int((-1i32).to_be_bytes()));
    }

    #[test]
    fn mid_range_float_is_not_int() {
        let bytes = 1.5f32.to_be_bytes();
        assert!(!looks_like_int(bytes));
    }

    #[test]
    fn hashes_field_is_always_int_even_if_float_shaped() {
        let bytes = 1.5f32.to_be_bytes();
        assert_eq!(classify_slot(bytes, "Hash"), VectorElement::Int32(i32::from_be_bytes(bytes)));
    }

    #[test]
    fn stride4_all_zero_markers() {
        let mut raw = Vec::new();
        for _ in 0..2 {
            raw.push(1i32.to_be_bytes());
            raw.push(2i32.to_be_bytes());
            raw.push(3i32.to_be_bytes());
            raw.push([0, 0, 0, 0]);
        }
        let out = decode_vector_w4(&raw, "OffsetXYZ");
        assert_eq!(out[3], VectorElement::ZeroMarker);
        assert_eq!(out[7], VectorElement::ZeroMarker);
    }

    #[test]
    fn stride4_all_nonzero_markers() {
        let mut raw = Vec::new();
        for _ in 0..2 {
            raw.push(1i32.to_be_bytes());
            raw.push(2i32.to_be_bytes());
            raw.push(3i32.to_be_bytes());
            raw.push([0xCD; 4]);
        }
        let out = decode_vector_w4(&raw, "OffsetXYZ");
        assert_eq!(out[3], VectorElement::NonzeroMarker);
        assert_eq!(out[7], VectorElement::NonzeroMarker);
    }

    #[test]
    fn stride4_mixed_disables_markers() {
        let raw = vec![
            1i32.to_be_bytes(),
            2i32.to_be_bytes(),
            3i32.to_be_bytes(),
            [0, 0, 0, 0],
            4i32.to_be_bytes(),
            5i32.to_be_bytes(),
            6i32.to_be_bytes(),
            [9, 9, 9, 9],
        ];
        let out = decode_vector_w4(&raw, "OffsetXYZ");
        assert!(!matches!(out[3], VectorElement::ZeroMarker));
        assert!(!matches!(out[7], VectorElement::ZeroMarker));
    }

    #[test]
    fn non_multiple_of_4_skips_stride_detection() {
        let raw = vec![[0, 0, 0, 0]; 3];
        let out = decode_vector_w4(&raw, "Whatever");
        assert!(out.iter().all(|e| matches!(e, VectorElement::Int32(0))));
    }
}
