//! Readers for logs written with the binary and hash layouts.

use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::Path,
};

use crate::{
    appenders::archive::ARCHIVE_EXTENSION,
    codec::Cursor,
    error::{IoResultExt, LoggingError, Result},
    hashlog::Hashlog,
    level::Level,
    record::Record,
};

/// Opens a log file for reading, decompressing archived (`.zst`) logs on
/// the fly.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_path(path)?;
    if path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION) {
        let decoder = zstd::stream::read::Decoder::new(file).with_path(path)?;
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Reads one size-prefixed frame. `None` on a clean end of input.
fn read_frame(input: &mut impl Read) -> Option<Result<Vec<u8>>> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match input.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return None,
            Ok(0) => return Some(Err(LoggingError::Decode("truncated record size"))),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Some(Err(e.into())),
        }
    }

    // The buffer grows with the data actually read, not with the prefix
    let size = u32::from_le_bytes(prefix) as usize;
    let mut frame = Vec::new();
    Some(match input.take(size as u64).read_to_end(&mut frame) {
        Ok(read) if read == size => Ok(frame),
        Ok(_) => Err(LoggingError::Decode("truncated record")),
        Err(e) => Err(e.into()),
    })
}

fn read_header(cursor: &mut Cursor, record: &mut Record) -> Result<()> {
    record.timestamp = cursor.u64()?;
    record.thread = cursor.u64()?;
    record.level = Level::from_u8(cursor.u8()?).ok_or(LoggingError::Decode("unknown level"))?;
    Ok(())
}

fn read_buffer(cursor: &mut Cursor, record: &mut Record) -> Result<()> {
    let len = cursor.u32()? as usize;
    record.buffer.extend_from_slice(cursor.bytes(len)?);
    Ok(())
}

/// Decodes one [`BinaryLayout`](crate::layouts::BinaryLayout) frame
/// (without its size prefix).
pub fn decode_binary(frame: &[u8]) -> Result<Record> {
    let mut cursor = Cursor::new(frame);
    let mut record = Record::default();
    read_header(&mut cursor, &mut record)?;

    let len = cursor.u8()? as usize;
    record.logger.push_str(cursor.str(len)?);
    let len = cursor.u16()? as usize;
    record.message.push_str(cursor.str(len)?);
    read_buffer(&mut cursor, &mut record)?;
    Ok(record)
}

/// Decodes one [`HashLayout`](crate::layouts::HashLayout) frame, resolving
/// hashes through `hashlog`.
pub fn decode_hash(frame: &[u8], hashlog: &Hashlog) -> Result<Record> {
    let mut cursor = Cursor::new(frame);
    let mut record = Record::default();
    read_header(&mut cursor, &mut record)?;

    record.logger = hashlog.resolve(cursor.u32()?);
    record.message = hashlog.resolve(cursor.u32()?);
    read_buffer(&mut cursor, &mut record)?;
    Ok(record)
}

/// Iterator over the records of a binary log. A malformed record is
/// yielded as an error and ends the iteration.
pub struct BinaryReader<R: Read> {
    input: R,
    done: bool,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, done: false }
    }
}

impl<R: Read> Iterator for BinaryReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = read_frame(&mut self.input)?.and_then(|frame| decode_binary(&frame));
        self.done = item.is_err();
        Some(item)
    }
}

/// Iterator over the records of a hash log.
pub struct HashReader<'a, R: Read> {
    input: R,
    hashlog: &'a Hashlog,
    done: bool,
}

impl<'a, R: Read> HashReader<'a, R> {
    pub fn new(input: R, hashlog: &'a Hashlog) -> Self {
        Self {
            input,
            hashlog,
            done: false,
        }
    }
}

impl<R: Read> Iterator for HashReader<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item =
            read_frame(&mut self.input)?.and_then(|frame| decode_hash(&frame, self.hashlog));
        self.done = item.is_err();
        Some(item)
    }
}
