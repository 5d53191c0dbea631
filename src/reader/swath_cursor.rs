// src/reader/swath_cursor.rs
use crate::config::ParserConfig;
use crate::error::{DeltaTError, Result};
use crate::position::{resolve_pose, PositionResolver};
use crate::record::{HeaderDecoder, PingHeader};
use crate::report::ProcessReport;
use crate::swath::{SwathDecoder, SwathOptions};
use crate::types::BathymetrySwath;
use log::warn;
use std::cell::Cell;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;
#[cfg(feature = "mmap")]
use std::io::Cursor;

/// Trait alias for Read + Seek
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Walks the pings of an 83P channel.
///
/// The cursor owns its byte offset and is deliberately `!Sync`; open one
/// cursor per thread over its own file handle.
pub struct SwathCursor<R: ReadSeek, P: PositionResolver> {
    reader: R,
    len: u64,
    offset: u64,
    header: Option<PingHeader>,
    header_offset: u64,
    decoder: HeaderDecoder,
    resolver: P,
    options: SwathOptions,
    timestamp_increment_ms: i64,
    halted: bool,
    report: Option<ProcessReport>,
    _not_sync: PhantomData<Cell<()>>,
}

/// Constructor for standard file I/O
impl<P: PositionResolver> SwathCursor<BufReader<File>, P> {
    pub fn open(path: impl AsRef<Path>, resolver: P, config: &ParserConfig) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::with_capacity(65536, file), resolver, config)
    }
}

/// Constructor for memory-mapped file I/O (requires "mmap" feature)
#[cfg(feature = "mmap")]
impl<P: PositionResolver> SwathCursor<Cursor<Mmap>, P> {
    pub fn open_mmap(path: impl AsRef<Path>, resolver: P, config: &ParserConfig) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_reader(Cursor::new(mmap), resolver, config)
    }
}

impl<R: ReadSeek, P: PositionResolver> SwathCursor<R, P> {
    pub fn from_reader(mut reader: R, resolver: P, config: &ParserConfig) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        Ok(SwathCursor {
            reader,
            len,
            offset: 0,
            header: None,
            header_offset: 0,
            decoder: HeaderDecoder::new()?,
            resolver,
            options: config.swath_options(),
            timestamp_increment_ms: config.timestamp_increment_ms,
            halted: false,
            report: None,
            _not_sync: PhantomData,
        })
    }

    /// Channel size in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset of the next record
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Most recently decoded header
    pub fn current_header(&self) -> Option<&PingHeader> {
        self.header.as_ref()
    }

    pub fn options(&self) -> &SwathOptions {
        &self.options
    }

    pub fn resolver_mut(&mut self) -> &mut P {
        &mut self.resolver
    }

    /// Write a processing report block for every decoded ping.
    ///
    /// A failed write drops the report; decoding goes on.
    pub fn attach_report(&mut self, report: ProcessReport) {
        self.report = Some(report);
    }

    pub fn take_report(&mut self) -> Option<ProcessReport> {
        self.report.take()
    }

    /// Decode the next ping. `Ok(None)` at end of channel.
    ///
    /// After an error the traversal is over: later calls return `Ok(None)`
    /// until [`rewind`](Self::rewind).
    pub fn next(&mut self) -> Result<Option<BathymetrySwath>> {
        if self.halted {
            return Ok(None);
        }
        let result = self.decode_next();
        self.halted = result.is_err();
        result
    }

    /// Step over the next record reading only its header.
    ///
    /// The resolver is never consulted and the payload is not checked.
    pub fn next_header(&mut self) -> Result<Option<PingHeader>> {
        if self.halted {
            return Ok(None);
        }
        let result = self.read_header_forward();
        match result {
            Ok(Some(header)) => {
                self.header_offset = self.offset;
                self.offset += header.record_length as u64;
                self.header = Some(header.clone());
                Ok(Some(header))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.halted = true;
                Err(e)
            }
        }
    }

    /// Decode the first ping whose timestamp is `>= target_ms`.
    ///
    /// Asking for the current ping's timestamp decodes that ping again.
    /// Otherwise the scan runs forward from the current offset, or from the
    /// start of the channel when the target lies before the current ping.
    /// The scan is linear and stops at the last complete header; `Ok(None)`
    /// leaves the cursor where it was. An error ends the traversal as in
    /// [`next`](Self::next).
    pub fn seek_to(&mut self, target_ms: i64) -> Result<Option<BathymetrySwath>> {
        let current = self.header.as_ref().map(|h| h.timestamp_ms);
        let start = match current {
            Some(ts) if ts == target_ms => {
                self.offset = self.header_offset;
                return self.restart();
            }
            Some(ts) if target_ms > ts => self.offset,
            _ => 0,
        };

        match self.scan_for(start, target_ms) {
            Ok(Some(pos)) => {
                self.offset = pos;
                self.restart()
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.halted = true;
                Err(e)
            }
        }
    }

    /// Offset of the first record at or after `target_ms`, reading headers only
    fn scan_for(&mut self, start: u64, target_ms: i64) -> Result<Option<u64>> {
        let mut pos = start;
        while self.len.saturating_sub(pos) >= PingHeader::SIZE as u64 {
            let buf = self.read_header_bytes(pos)?;
            match self.decoder.decode(&buf) {
                Ok(header) if header.timestamp_ms >= target_ms => return Ok(Some(pos)),
                Ok(header) => pos += header.record_length as u64,
                Err(e) => match e.skip_length() {
                    Some(skip) => {
                        warn!("Skipping record at offset {} while seeking: {}", pos, e);
                        pos += skip;
                    }
                    None => return Err(e.into()),
                },
            }
        }
        Ok(None)
    }

    /// Back to the first record
    pub fn rewind(&mut self) {
        self.offset = 0;
        self.halted = false;
    }

    fn restart(&mut self) -> Result<Option<BathymetrySwath>> {
        self.halted = false;
        self.next()
    }

    fn decode_next(&mut self) -> Result<Option<BathymetrySwath>> {
        let header = match self.read_header_forward()? {
            Some(h) => h,
            None => return Ok(None),
        };

        let record_offset = self.offset;
        let payload = self.read_payload(record_offset, &header)?;
        self.offset = record_offset + header.record_length as u64;

        let pose_time_ms = header.timestamp_ms + self.timestamp_increment_ms;
        let pose = resolve_pose(&mut self.resolver, &header, pose_time_ms);
        let swath = SwathDecoder::decode(&header, &payload, &pose, &self.options);

        let report_error = match self.report.as_mut() {
            Some(report) => {
                let ranges = SwathDecoder::beam_ranges(&header, &payload, &self.options);
                let corrected = self.options.sound_speed_correction;
                report.record_ping(&header, &swath, &ranges, pose_time_ms, corrected).err()
            }
            None => None,
        };
        if let Some(e) = report_error {
            warn!("Dropping process report: {}", e);
            self.report = None;
        }

        self.header_offset = record_offset;
        self.header = Some(header);
        Ok(Some(swath))
    }

    /// Decode the header at the current offset, stepping over records whose
    /// timestamp is unreadable. Leaves `offset` at the returned header.
    fn read_header_forward(&mut self) -> Result<Option<PingHeader>> {
        loop {
            if self.offset >= self.len {
                return Ok(None);
            }
            let buf = self.read_header_bytes(self.offset)?;
            match self.decoder.decode(&buf) {
                Ok(header) => return Ok(Some(header)),
                Err(e) => match e.skip_length() {
                    Some(skip) => {
                        warn!("Skipping record at offset {}: {}", self.offset, e);
                        self.offset += skip;
                    }
                    None => return Err(e.into()),
                },
            }
        }
    }

    fn read_header_bytes(&mut self, pos: u64) -> Result<[u8; PingHeader::SIZE]> {
        let available = self.len.saturating_sub(pos);
        if available < PingHeader::SIZE as u64 {
            return Err(DeltaTError::TruncatedRecord {
                offset: pos,
                needed: PingHeader::SIZE as u64,
                available,
            });
        }

        let mut buf = [0u8; PingHeader::SIZE];
        self.reader.seek(SeekFrom::Start(pos))?;
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_payload(&mut self, record_offset: u64, header: &PingHeader) -> Result<Vec<u8>> {
        let start = record_offset + PingHeader::SIZE as u64;
        let needed = header.payload_len() as u64;
        let available = self.len.saturating_sub(start);
        if available < needed {
            return Err(DeltaTError::TruncatedRecord {
                offset: record_offset,
                needed: PingHeader::SIZE as u64 + needed,
                available: PingHeader::SIZE as u64 + available,
            });
        }

        let mut payload = vec![0u8; needed as usize];
        self.reader.seek(SeekFrom::Start(start))?;
        self.reader.read_exact(&mut payload)?;
        Ok(payload)
    }
}
