// src/writer/ping_writer.rs
use crate::error::{DeltaTError, Result};
use crate::record::PingHeader;
use crate::swath::intensity_offset;
use byteorder::{BigEndian, ByteOrder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes 83P ping records.
///
/// Each record is the encoded header followed by the beam payload. Intensity
/// samples go to their fixed slots after the ranges are laid down, and any
/// slot that falls outside the payload is dropped.
pub struct DeltaTWriter<W: Write> {
    inner: W,
    pings_written: u64,
    bytes_written: u64,
}

impl DeltaTWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DeltaTWriter<W> {
    pub fn new(inner: W) -> Self {
        DeltaTWriter {
            inner,
            pings_written: 0,
            bytes_written: 0,
        }
    }

    /// Append one ping.
    ///
    /// `ranges` holds one raw range count per beam. `intensities` must be
    /// given exactly when the header says the ping carries intensity.
    pub fn write_ping(&mut self, header: &PingHeader, ranges: &[u16], intensities: Option<&[u16]>) -> Result<()> {
        let beams = header.num_beams as usize;
        if ranges.len() != beams {
            return Err(DeltaTError::Encode(format!(
                "{} range samples for {} beams",
                ranges.len(),
                beams
            )));
        }

        let expected = PingHeader::expected_record_length(header.num_beams, header.has_intensity);
        if header.record_length as u32 != expected {
            return Err(DeltaTError::Encode(format!(
                "record length {} does not match {} beams (expected {})",
                header.record_length, beams, expected
            )));
        }

        match (header.has_intensity, intensities) {
            (true, Some(samples)) if samples.len() != beams => {
                return Err(DeltaTError::Encode(format!(
                    "{} intensity samples for {} beams",
                    samples.len(),
                    beams
                )));
            }
            (true, None) => return Err(DeltaTError::Encode("header expects intensity samples".into())),
            (false, Some(_)) => return Err(DeltaTError::Encode("header has no intensity flag".into())),
            _ => {}
        }

        let mut payload = vec![0u8; header.payload_len()];
        for (c, &range) in ranges.iter().enumerate() {
            BigEndian::write_u16(&mut payload[c * 2..], range);
        }
        if let Some(samples) = intensities {
            for (c, &intensity) in samples.iter().enumerate() {
                let offset = intensity_offset(c);
                if let Some(slot) = payload.get_mut(offset..offset + 2) {
                    BigEndian::write_u16(slot, intensity);
                }
            }
        }

        self.inner.write_all(&header.encode()?)?;
        self.inner.write_all(&payload)?;
        self.pings_written += 1;
        self.bytes_written += expected as u64;
        Ok(())
    }

    pub fn pings_written(&self) -> u64 {
        self.pings_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let mut writer = DeltaTWriter::new(Vec::new());
        let header = PingHeader::new(3, false, 0);
        writer.write_ping(&header, &[1, 0x0203, 0xFFFF], None).unwrap();
        assert_eq!(writer.pings_written(), 1);
        assert_eq!(writer.bytes_written(), 262);

        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes.len(), 262);
        assert_eq!(&bytes[256..], &[0, 1, 2, 3, 0xFF, 0xFF]);
    }

    #[test]
    fn test_intensity_slots() {
        let mut writer = DeltaTWriter::new(Vec::new());
        let header = PingHeader::new(240, true, 0);
        let ranges = vec![0x0100u16; 240];
        let intensities: Vec<u16> = (0..240).map(|c| 0x4000 + c as u16).collect();
        writer.write_ping(&header, &ranges, Some(&intensities)).unwrap();

        let bytes = writer.into_inner().unwrap();
        let payload = &bytes[256..];
        assert_eq!(payload.len(), 960);
        assert_eq!(BigEndian::read_u16(&payload[479..]), 0x4000);
        assert_eq!(BigEndian::read_u16(&payload[957..]), 0x4000 + 239);
        // the first intensity slot overwrites the low byte of the last range
        assert_eq!(payload[478], 0x01);
        assert_eq!(payload[479], 0x40);
        assert_eq!(payload[959], 0);
    }

    #[test]
    fn test_intensity_slots_outside_small_payload() {
        let mut writer = DeltaTWriter::new(Vec::new());
        let header = PingHeader::new(2, true, 0);
        writer.write_ping(&header, &[5, 6], Some(&[7, 8])).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(&bytes[256..], &[0, 5, 0, 6, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rejects_inconsistent_input() {
        let mut writer = DeltaTWriter::new(Vec::new());
        let header = PingHeader::new(4, false, 0);
        assert!(writer.write_ping(&header, &[1, 2, 3], None).is_err());
        assert!(writer.write_ping(&header, &[1, 2, 3, 4], Some(&[1, 2, 3, 4])).is_err());

        let mut bad_length = header.clone();
        bad_length.record_length += 2;
        assert!(writer.write_ping(&bad_length, &[1, 2, 3, 4], None).is_err());

        let with_intensity = PingHeader::new(4, true, 0);
        assert!(writer.write_ping(&with_intensity, &[1, 2, 3, 4], None).is_err());
        assert_eq!(writer.pings_written(), 0);
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.83P");
        let mut writer = DeltaTWriter::create(&path).unwrap();
        writer.write_ping(&PingHeader::new(1, false, 0), &[9], None).unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 258);
    }
}
