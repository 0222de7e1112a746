//! Day-file access and record framing.
//!
//! A day file is a flat sequence of variable-length records:
//!
//! ```text
//! ┌─────┬────────┬────────┬─────────────────────┐
//! │ pad │ length │ type   │ payload             │
//! │ 1B  │ 1B     │ 1B     │ length - 1 bytes    │
//! └─────┴────────┴────────┴─────────────────────┘
//! ```
//!
//! The file is memory-mapped once at open; the cursor is a pure
//! index-advancing iterator with no per-record allocation. A record whose
//! length runs past the end of the buffer yields [`ImiError::TruncatedFrame`]
//! once and then stops — the caller keeps whatever was reconstructed up to
//! that point.

use std::fs::File;
use std::path::Path;

use imi_core::error::ImiError;
use memmap2::Mmap;

/// Number of framing bytes preceding each payload (pad, length, type).
const FRAME_HEADER: usize = 3;

/// A memory-mapped day file.
pub struct DayFile {
    map: Mmap,
}

impl DayFile {
    /// Open and map the file read-only.
    pub fn open(path: &Path) -> Result<Self, ImiError> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and recorded day files are
        // immutable once written.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map })
    }

    /// The whole file as a byte slice.
    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    /// Iterate the file's frames.
    pub fn frames(&self) -> FrameCursor<'_> {
        FrameCursor::new(self.bytes())
    }
}

/// One framed record: the type byte and its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub msg_type: u8,
    pub payload: &'a [u8],
}

/// Forward cursor over the frames of a day buffer.
pub struct FrameCursor<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> FrameCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, failed: false }
    }

    /// Current byte offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for FrameCursor<'a> {
    type Item = Result<Frame<'a>, ImiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let pos = self.pos;
        if pos + FRAME_HEADER > self.data.len() {
            self.failed = true;
            return Some(Err(ImiError::TruncatedFrame { offset: pos }));
        }
        // length counts the type byte plus the payload
        let length = self.data[pos + 1] as usize;
        let end = pos + 2 + length;
        if length == 0 || end > self.data.len() {
            self.failed = true;
            return Some(Err(ImiError::TruncatedFrame { offset: pos }));
        }
        let frame = Frame {
            msg_type: self.data[pos + 2],
            payload: &self.data[pos + FRAME_HEADER..end],
        };
        self.pos = end;
        Some(Ok(frame))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn frame_bytes(msg_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut rec = vec![0u8, (payload.len() + 1) as u8, msg_type];
        rec.extend_from_slice(payload);
        rec
    }

    #[test]
    fn yields_frames_in_order() {
        let mut data = frame_bytes(b'T', &[0, 0, 0x75, 0x30]);
        data.extend(frame_bytes(b'X', b"abc"));
        let frames: Vec<_> = FrameCursor::new(&data).collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].msg_type, b'T');
        assert_eq!(frames[0].payload, &[0, 0, 0x75, 0x30]);
        assert_eq!(frames[1].msg_type, b'X');
        assert_eq!(frames[1].payload, b"abc");
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert!(FrameCursor::new(&[]).next().is_none());
    }

    #[test]
    fn truncated_header_is_flagged_once() {
        let data = [0u8, 5]; // pad + length, no type byte
        let mut cursor = FrameCursor::new(&data);
        assert!(matches!(
            cursor.next(),
            Some(Err(ImiError::TruncatedFrame { offset: 0 }))
        ));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn truncated_payload_is_flagged() {
        // claims 10 payload bytes but only 2 follow
        let data = frame_bytes(b'A', &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let mut cursor = FrameCursor::new(&data[..6]);
        assert!(matches!(
            cursor.next(),
            Some(Err(ImiError::TruncatedFrame { .. }))
        ));
    }

    #[test]
    fn zero_length_is_truncation() {
        let data = [0u8, 0, b'T'];
        let mut cursor = FrameCursor::new(&data);
        assert!(matches!(
            cursor.next(),
            Some(Err(ImiError::TruncatedFrame { offset: 0 }))
        ));
    }

    #[test]
    fn good_frames_before_truncation_survive() {
        let mut data = frame_bytes(b'T', &[0, 0, 0, 1]);
        data.extend([0u8, 99, b'A']); // claims 98 payload bytes, none follow
        let collected: Vec<_> = FrameCursor::new(&data).collect();
        assert_eq!(collected.len(), 2);
        assert!(collected[0].is_ok());
        assert!(collected[1].is_err());
    }

    #[test]
    fn maps_file_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&frame_bytes(b'T', &[0, 0, 0, 42])).unwrap();
        tmp.flush().unwrap();
        let file = DayFile::open(tmp.path()).unwrap();
        let frames: Vec<_> = file.frames().collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].msg_type, b'T');
    }
}
