use crate::{
    codec::{patch_u32, PutLe},
    element::Element,
    record::Record,
};

use super::Layout;

/// Compact binary form that keeps the deferred message pattern and its
/// argument buffer, so formatting happens only when the log is read.
///
/// ```text
/// [u32 size][u64 timestamp][u64 thread][u8 level]
/// [u8 logger len][logger][u16 message len][message][u32 buffer len][buffer]
/// ```
///
/// `size` counts every byte after itself.
#[derive(Debug, Default)]
pub struct BinaryLayout;

/// Longest prefix of `s` no longer than `max` bytes that ends on a char
/// boundary.
pub(crate) fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl Element for BinaryLayout {}

impl Layout for BinaryLayout {
    fn layout_record(&self, record: &mut Record) {
        let logger = clip(&record.logger, u8::MAX as usize);
        let message = clip(&record.message, u16::MAX as usize);

        let raw = &mut record.raw;
        raw.clear();
        raw.reserve(4 + 8 + 8 + 1 + 1 + logger.len() + 2 + message.len() + 4 + record.buffer.len());

        raw.put_u32(0);
        raw.put_u64(record.timestamp);
        raw.put_u64(record.thread);
        raw.put_u8(record.level.as_u8());
        raw.put_u8(logger.len() as u8);
        raw.extend_from_slice(logger.as_bytes());
        raw.put_u16(message.len() as u16);
        raw.extend_from_slice(message.as_bytes());
        raw.put_u32(record.buffer.len() as u32);
        raw.extend_from_slice(&record.buffer);

        let size = (raw.len() - 4) as u32;
        patch_u32(raw, 0, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::level::Level;

    #[test]
    fn test_binary_layout() {
        let mut record = Record {
            timestamp: 1468408953123456789,
            thread: 0x98ABCDEF,
            level: Level::Warn,
            logger: "Test logger".into(),
            ..Default::default()
        };
        record.store_format("Test {}", &[&1u8]);

        BinaryLayout.layout_record(&mut record);

        let expected = 4 + 8 + 8 + 1 + 1 + 11 + 2 + 7 + 4 + 2;
        assert_eq!(record.raw.len(), expected);
        assert_eq!(
            u32::from_le_bytes(record.raw[0..4].try_into().unwrap()) as usize,
            expected - 4,
            "Size prefix should count the bytes after itself"
        );
        assert_eq!(record.raw[20], Level::Warn.as_u8());
        assert_eq!(record.raw[21], 11);
        assert_eq!(&record.raw[22..33], b"Test logger");
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("abc", 5), "abc");
        assert_eq!(clip("abcdef", 3), "abc");
        // 'é' is two bytes; cutting in the middle backs off
        assert_eq!(clip("aé", 2), "a");

        let mut record = Record::new(Level::Info, "x".repeat(300), "m");
        BinaryLayout.layout_record(&mut record);
        assert_eq!(record.raw[21], 255);
    }
}
