use crate::{
    codec::{patch_u32, PutLe},
    element::Element,
    record::Record,
};

use super::Layout;

const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// 32-bit FNV-1a hash of a string's UTF-8 bytes.
pub fn fnv1a(value: &str) -> u32 {
    value.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Like [`BinaryLayout`](super::BinaryLayout), but logger and message are
/// replaced by their FNV-1a hashes. A `.hashlog` map is needed to read the
/// output back.
///
/// ```text
/// [u32 size][u64 timestamp][u64 thread][u8 level]
/// [u32 logger hash][u32 message hash][u32 buffer len][buffer]
/// ```
#[derive(Debug, Default)]
pub struct HashLayout;

impl Element for HashLayout {}

impl Layout for HashLayout {
    fn layout_record(&self, record: &mut Record) {
        let raw = &mut record.raw;
        raw.clear();
        raw.reserve(4 + 8 + 8 + 1 + 4 + 4 + 4 + record.buffer.len());

        raw.put_u32(0);
        raw.put_u64(record.timestamp);
        raw.put_u64(record.thread);
        raw.put_u8(record.level.as_u8());
        raw.put_u32(fnv1a(&record.logger));
        raw.put_u32(fnv1a(&record.message));
        raw.put_u32(record.buffer.len() as u32);
        raw.extend_from_slice(&record.buffer);

        let size = (raw.len() - 4) as u32;
        patch_u32(raw, 0, size);
    }
}
