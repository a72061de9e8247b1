//! miniSEED (SEED 2.x data-only) record decoding.
//!
//! Each record starts with a 48-byte fixed header followed by a blockette chain.
//! Blockette 1000 is required and gives the encoding, word order and record
//! length. Blockette 100 overrides the nominal sample rate and blockette 1001
//! adds microseconds to the start time.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::MseedError;
use crate::steim::{self, SteimLevel};

const FIXED_HEADER_LEN: usize = 48;

/// Activity flag bit 1: time correction already applied.
const TIME_CORRECTION_APPLIED: u8 = 0x02;

/// Data encodings from blockette 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Int16,
    Int32,
    Float32,
    Float64,
    Steim1,
    Steim2,
}

impl Encoding {
    pub fn from_code(code: u8) -> Result<Self, MseedError> {
        match code {
            1 => Ok(Encoding::Int16),
            3 => Ok(Encoding::Int32),
            4 => Ok(Encoding::Float32),
            5 => Ok(Encoding::Float64),
            10 => Ok(Encoding::Steim1),
            11 => Ok(Encoding::Steim2),
            other => Err(MseedError::UnsupportedEncoding(other)),
        }
    }
}

/// One decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    /// Data quality indicator (`D`, `R`, `Q` or `M`).
    pub quality: char,
    pub start: DateTime<Utc>,
    pub sampling_rate: f64,
    pub encoding: Encoding,
    /// Total record length in bytes.
    pub length: usize,
    pub samples: Vec<f64>,
}

impl Record {
    /// Key used to group records into traces.
    pub fn seed_id(&self) -> (String, String, String, String) {
        (
            self.network.clone(),
            self.station.clone(),
            self.location.clone(),
            self.channel.clone(),
        )
    }
}

/// Byte-order aware field reader over one record.
struct Reader<'a> {
    data: &'a [u8],
    base: usize,
    big_endian: bool,
}

impl Reader<'_> {
    fn bytes<const N: usize>(&self, at: usize) -> Result<[u8; N], MseedError> {
        self.data
            .get(at..at + N)
            .and_then(|s| s.try_into().ok())
            .ok_or(MseedError::Truncated {
                offset: self.base + at,
                needed: N,
            })
    }

    fn u8(&self, at: usize) -> Result<u8, MseedError> {
        Ok(self.bytes::<1>(at)?[0])
    }

    fn u16(&self, at: usize) -> Result<u16, MseedError> {
        let b = self.bytes::<2>(at)?;
        Ok(if self.big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    fn i16(&self, at: usize) -> Result<i16, MseedError> {
        Ok(self.u16(at)? as i16)
    }

    fn i32(&self, at: usize) -> Result<i32, MseedError> {
        let b = self.bytes::<4>(at)?;
        Ok(if self.big_endian {
            i32::from_be_bytes(b)
        } else {
            i32::from_le_bytes(b)
        })
    }

    fn f32(&self, at: usize) -> Result<f32, MseedError> {
        Ok(f32::from_bits(self.i32(at)? as u32))
    }

    fn text(&self, at: usize, len: usize) -> Result<String, MseedError> {
        let raw = self.data.get(at..at + len).ok_or(MseedError::Truncated {
            offset: self.base + at,
            needed: len,
        })?;
        Ok(String::from_utf8_lossy(raw).trim().to_string())
    }
}

/// Guess the header byte order from the plausibility of the start year and day.
fn detect_big_endian(header: &[u8]) -> bool {
    let year = u16::from_be_bytes([header[20], header[21]]);
    let day = u16::from_be_bytes([header[22], header[23]]);
    (1900..=2100).contains(&year) && (1..=366).contains(&day)
}

/// Decode every record in `data`, skipping records without samples.
pub fn parse_records(data: &[u8]) -> Result<Vec<Record>, MseedError> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        // Some services pad the stream with zeros or spaces.
        if data[offset..].iter().all(|&b| b == 0 || b == b' ') {
            break;
        }
        let record = parse_record(&data[offset..], offset)?;
        offset += record.length;

        if record.samples.is_empty() || record.sampling_rate <= 0.0 {
            tracing::debug!(
                channel = %record.channel,
                quality = %record.quality,
                "Skipping record without samples"
            );
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Decode one record starting at the beginning of `data`.
///
/// `base` is the record's offset in the enclosing buffer, used for error reporting.
pub fn parse_record(data: &[u8], base: usize) -> Result<Record, MseedError> {
    if data.len() < FIXED_HEADER_LEN {
        return Err(MseedError::Truncated {
            offset: base,
            needed: FIXED_HEADER_LEN,
        });
    }

    let quality = data[6] as char;
    if !matches!(quality, 'D' | 'R' | 'Q' | 'M') {
        return Err(MseedError::header(
            base + 6,
            format!("unknown data quality indicator {:?}", quality),
        ));
    }

    let r = Reader {
        data,
        base,
        big_endian: detect_big_endian(data),
    };

    let station = r.text(8, 5)?;
    let location = r.text(13, 2)?;
    let channel = r.text(15, 3)?;
    let network = r.text(18, 2)?;

    let num_samples = r.u16(30)? as usize;
    let rate_factor = r.i16(32)?;
    let rate_multiplier = r.i16(34)?;
    let activity = r.u8(36)?;
    let num_blockettes = r.u8(39)?;
    let time_correction = r.i32(40)?;
    let data_offset = r.u16(44)? as usize;
    let mut blockette_offset = r.u16(46)? as usize;

    let mut start = btime(&r, 20)?;
    let mut sampling_rate = nominal_rate(rate_factor, rate_multiplier);
    let mut encoding_code = None;
    let mut word_big_endian = r.big_endian;
    let mut length = None;

    for _ in 0..num_blockettes {
        if blockette_offset == 0 {
            break;
        }
        if blockette_offset < FIXED_HEADER_LEN {
            return Err(MseedError::header(
                base + 46,
                format!("blockette offset {} inside fixed header", blockette_offset),
            ));
        }

        let kind = r.u16(blockette_offset)?;
        let next = r.u16(blockette_offset + 2)? as usize;
        match kind {
            1000 => {
                encoding_code = Some(r.u8(blockette_offset + 4)?);
                word_big_endian = r.u8(blockette_offset + 5)? == 1;
                let exponent = r.u8(blockette_offset + 6)?;
                if !(7..=20).contains(&exponent) {
                    return Err(MseedError::header(
                        base + blockette_offset + 6,
                        format!("record length exponent {} out of range", exponent),
                    ));
                }
                length = Some(1usize << exponent);
            }
            100 => {
                let actual = r.f32(blockette_offset + 4)? as f64;
                if actual > 0.0 {
                    sampling_rate = actual;
                }
            }
            1001 => {
                let micros = r.u8(blockette_offset + 5)? as i8;
                start += TimeDelta::microseconds(micros as i64);
            }
            other => {
                tracing::trace!(blockette = other, "Ignoring blockette");
            }
        }

        if next != 0 && next <= blockette_offset {
            return Err(MseedError::header(
                base + blockette_offset + 2,
                "blockette chain does not advance",
            ));
        }
        blockette_offset = next;
    }

    let length = length
        .ok_or_else(|| MseedError::header(base, "missing blockette 1000"))?;
    let encoding = Encoding::from_code(encoding_code.unwrap_or_default())?;

    if activity & TIME_CORRECTION_APPLIED == 0 && time_correction != 0 {
        start += TimeDelta::microseconds(time_correction as i64 * 100);
    }

    let samples = if num_samples == 0 {
        Vec::new()
    } else {
        if data_offset < FIXED_HEADER_LEN || data_offset >= length {
            return Err(MseedError::header(
                base + 44,
                format!("data offset {} outside record of {} bytes", data_offset, length),
            ));
        }
        let payload = data.get(data_offset..length).ok_or(MseedError::Truncated {
            offset: base + data_offset,
            needed: length - data_offset,
        })?;
        decode_samples(payload, num_samples, encoding, word_big_endian)?
    };

    Ok(Record {
        network,
        station,
        location,
        channel,
        quality,
        start,
        sampling_rate,
        encoding,
        length,
        samples,
    })
}

/// Read a 10-byte BTIME structure.
fn btime(r: &Reader<'_>, at: usize) -> Result<DateTime<Utc>, MseedError> {
    let year = r.u16(at)? as i32;
    let day = r.u16(at + 2)? as u32;
    let hour = r.u8(at + 4)? as u32;
    let minute = r.u8(at + 5)? as u32;
    let second = r.u8(at + 6)? as u32;
    let fraction = r.u16(at + 8)? as i64;

    let invalid = || MseedError::header(r.base + at, "invalid start time");

    // A leap second is expressed as second 60.
    let (second, leap) = if second == 60 { (59, 1) } else { (second, 0) };
    let naive = NaiveDate::from_yo_opt(year, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)?;

    Ok(naive.and_utc() + TimeDelta::seconds(leap) + TimeDelta::microseconds(fraction * 100))
}

/// Sample rate from the fixed-header factor and multiplier.
fn nominal_rate(factor: i16, multiplier: i16) -> f64 {
    if factor == 0 || multiplier == 0 {
        return 0.0;
    }
    let f = factor as f64;
    let m = multiplier as f64;
    match (factor > 0, multiplier > 0) {
        (true, true) => f * m,
        (true, false) => -f / m,
        (false, true) => -m / f,
        (false, false) => 1.0 / (f * m),
    }
}

fn decode_samples(
    payload: &[u8],
    num_samples: usize,
    encoding: Encoding,
    big_endian: bool,
) -> Result<Vec<f64>, MseedError> {
    let samples = match encoding {
        Encoding::Int16 => payload
            .chunks_exact(2)
            .take(num_samples)
            .map(|c| {
                let b = [c[0], c[1]];
                (if big_endian { i16::from_be_bytes(b) } else { i16::from_le_bytes(b) }) as f64
            })
            .collect::<Vec<_>>(),
        Encoding::Int32 => payload
            .chunks_exact(4)
            .take(num_samples)
            .map(|c| {
                let b = [c[0], c[1], c[2], c[3]];
                (if big_endian { i32::from_be_bytes(b) } else { i32::from_le_bytes(b) }) as f64
            })
            .collect(),
        Encoding::Float32 => payload
            .chunks_exact(4)
            .take(num_samples)
            .map(|c| {
                let b = [c[0], c[1], c[2], c[3]];
                (if big_endian { f32::from_be_bytes(b) } else { f32::from_le_bytes(b) }) as f64
            })
            .collect(),
        Encoding::Float64 => payload
            .chunks_exact(8)
            .take(num_samples)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                if big_endian { f64::from_be_bytes(b) } else { f64::from_le_bytes(b) }
            })
            .collect(),
        Encoding::Steim1 => steim::decode(payload, num_samples, SteimLevel::One, big_endian)?
            .into_iter()
            .map(f64::from)
            .collect(),
        Encoding::Steim2 => steim::decode(payload, num_samples, SteimLevel::Two, big_endian)?
            .into_iter()
            .map(f64::from)
            .collect(),
    };

    if samples.len() < num_samples {
        return Err(MseedError::SteimFrame(format!(
            "payload holds {} of {} samples",
            samples.len(),
            num_samples
        )));
    }
    Ok(samples)
}
