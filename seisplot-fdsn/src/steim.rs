//! Steim-1 and Steim-2 difference decompression.
//!
//! Data is a sequence of 64-byte frames of sixteen 32-bit words. Word 0 of each
//! frame packs sixteen 2-bit control nibbles, one per word. In the first frame
//! words 1 and 2 hold the forward (X0) and reverse (Xn) integration constants.

use crate::error::MseedError;

const FRAME_BYTES: usize = 64;
const WORDS_PER_FRAME: usize = 16;

/// Steim compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteimLevel {
    One,
    Two,
}

/// Decode `num_samples` integer samples from Steim frames.
pub fn decode(
    data: &[u8],
    num_samples: usize,
    level: SteimLevel,
    big_endian: bool,
) -> Result<Vec<i32>, MseedError> {
    if num_samples == 0 {
        return Ok(Vec::new());
    }

    let (x0, xn, diffs) = differences(data, num_samples, level, big_endian)?;
    if diffs.len() < num_samples {
        return Err(MseedError::SteimFrame(format!(
            "expected {} samples, frames hold {}",
            num_samples,
            diffs.len()
        )));
    }

    // The first difference refers to the previous record and is replaced by X0.
    let mut samples = Vec::with_capacity(num_samples);
    samples.push(x0);
    let mut last = x0;
    for &d in &diffs[1..num_samples] {
        last = last.wrapping_add(d);
        samples.push(last);
    }

    if last != xn {
        tracing::warn!(
            last,
            reverse_constant = xn,
            "Steim reverse integration constant mismatch"
        );
    }

    Ok(samples)
}

/// Unpack the integration constants and every difference up to `limit`.
fn differences(
    data: &[u8],
    limit: usize,
    level: SteimLevel,
    big_endian: bool,
) -> Result<(i32, i32, Vec<i32>), MseedError> {
    let frames = data.len() / FRAME_BYTES;
    if frames == 0 {
        return Err(MseedError::SteimFrame("no complete frame".to_string()));
    }

    let word_at = |frame: usize, index: usize| -> u32 {
        let offset = frame * FRAME_BYTES + index * 4;
        let bytes = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        }
    };

    let x0 = word_at(0, 1) as i32;
    let xn = word_at(0, 2) as i32;
    // At most 7 differences in each of the 15 data words of a frame.
    let mut diffs = Vec::with_capacity(limit.min(frames * 15 * 7));

    'frames: for frame in 0..frames {
        let control = word_at(frame, 0);
        let first = if frame == 0 { 3 } else { 1 };

        for index in first..WORDS_PER_FRAME {
            if diffs.len() >= limit {
                break 'frames;
            }
            let nibble = (control >> (30 - 2 * index)) & 0b11;
            let word = word_at(frame, index);
            match (level, nibble) {
                (_, 0) => {}
                (_, 1) => unpack(word, 4, 8, &mut diffs),
                (SteimLevel::One, 2) => unpack(word, 2, 16, &mut diffs),
                (SteimLevel::One, 3) => diffs.push(word as i32),
                (SteimLevel::Two, 2) => match word >> 30 {
                    1 => unpack(word, 1, 30, &mut diffs),
                    2 => unpack(word, 2, 15, &mut diffs),
                    3 => unpack(word, 3, 10, &mut diffs),
                    dnib => {
                        return Err(MseedError::SteimFrame(format!(
                            "invalid dnib {} for nibble 2 in frame {}",
                            dnib, frame
                        )));
                    }
                },
                (SteimLevel::Two, 3) => match word >> 30 {
                    0 => unpack(word, 5, 6, &mut diffs),
                    1 => unpack(word, 6, 5, &mut diffs),
                    2 => unpack(word, 7, 4, &mut diffs),
                    dnib => {
                        return Err(MseedError::SteimFrame(format!(
                            "invalid dnib {} for nibble 3 in frame {}",
                            dnib, frame
                        )));
                    }
                },
                _ => unreachable!("nibble is two bits"),
            }
        }
    }

    Ok((x0, xn, diffs))
}

/// Push `count` signed values of `bits` width, most significant first.
fn unpack(word: u32, count: u32, bits: u32, out: &mut Vec<i32>) {
    let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
    for i in 0..count {
        let shift = (count - 1 - i) * bits;
        out.push(sign_extend((word >> shift) & mask, bits));
    }
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one big-endian frame; `words` are `(nibble, word)` pairs starting at word 3.
    fn first_frame(x0: i32, xn: i32, words: &[(u32, u32)]) -> Vec<u8> {
        let mut all = [0u32; WORDS_PER_FRAME];
        all[1] = x0 as u32;
        all[2] = xn as u32;
        let mut control = 0u32;
        for (i, &(nibble, word)) in words.iter().enumerate() {
            let index = i + 3;
            control |= nibble << (30 - 2 * index);
            all[index] = word;
        }
        all[0] = control;
        all.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn integrate(x0: i32, diffs: &[i32]) -> Vec<i32> {
        let mut out = vec![x0];
        for d in &diffs[1..] {
            let next = out.last().unwrap() + d;
            out.push(next);
        }
        out
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b111111, 6), -1);
        assert_eq!(sign_extend(0b011111, 6), 31);
        assert_eq!(sign_extend(0x3FC, 10), -4);
        assert_eq!(sign_extend(0x7C18, 15), -1000);
    }

    #[test]
    fn test_steim1_frame() {
        let frame = first_frame(
            10,
            20,
            &[(1, 0x0002_FD00), (3, 11)],
        );
        let samples = decode(&frame, 5, SteimLevel::One, true).unwrap();
        assert_eq!(samples, vec![10, 12, 9, 9, 20]);
    }

    #[test]
    fn test_steim1_sixteen_bit_differences() {
        let frame = first_frame(-5, -305, &[(2, 0x0000_FED4)]);
        // Differences: 0 (ignored), -300.
        let samples = decode(&frame, 2, SteimLevel::One, true).unwrap();
        assert_eq!(samples, vec![-5, -305]);
    }

    #[test]
    fn test_steim2_all_widths() {
        let words = [
            (1, 0x0001_FE03), // 0, 1, -2, 3
            (2, 0x4001_86A0), // 100000
            (2, 0x80FA_7C18), // 500, -1000
            (2, 0xC07F_F12C), // 7, -4, 300
            (3, 0x01FC_2F9F), // 1, -1, 2, -2, 31
            (3, 0x4221_FE0F), // 1, 2, 3, -1, -16, 15
            (3, 0x81F2_E780), // 1, -1, 2, -2, 7, -8, 0
        ];
        let expected_diffs = vec![
            0, 1, -2, 3, 100000, 500, -1000, 7, -4, 300, 1, -1, 2, -2, 31, 1, 2, 3, -1, -16, 15,
            1, -1, 2, -2, 7, -8, 0,
        ];
        let expected = integrate(42, &expected_diffs);
        let frame = first_frame(42, *expected.last().unwrap(), &words);

        let (_, _, diffs) =
            differences(&frame, expected_diffs.len(), SteimLevel::Two, true).unwrap();
        assert_eq!(diffs, expected_diffs);

        // An unbounded limit reads the whole frame without reserving for it.
        let (_, _, diffs) = differences(&frame, usize::MAX, SteimLevel::Two, true).unwrap();
        assert_eq!(diffs[..expected_diffs.len()], expected_diffs[..]);

        let samples = decode(&frame, expected.len(), SteimLevel::Two, true).unwrap();
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_stops_at_sample_count() {
        let frame = first_frame(10, 12, &[(1, 0x0002_FD00), (3, 11)]);
        let samples = decode(&frame, 2, SteimLevel::One, true).unwrap();
        assert_eq!(samples, vec![10, 12]);
    }

    #[test]
    fn test_too_few_differences() {
        let frame = first_frame(10, 20, &[(1, 0x0002_FD00)]);
        let result = decode(&frame, 10, SteimLevel::One, true);
        assert!(matches!(result, Err(MseedError::SteimFrame(_))));
    }

    #[test]
    fn test_invalid_dnib() {
        let frame = first_frame(0, 0, &[(2, 0x0000_0001)]);
        let result = decode(&frame, 2, SteimLevel::Two, true);
        assert!(matches!(result, Err(MseedError::SteimFrame(_))));
    }

    #[test]
    fn test_little_endian_words() {
        let be = first_frame(10, 20, &[(1, 0x0002_FD00), (3, 11)]);
        let le: Vec<u8> = be
            .chunks_exact(4)
            .flat_map(|c| [c[3], c[2], c[1], c[0]])
            .collect();
        let samples = decode(&le, 5, SteimLevel::One, false).unwrap();
        assert_eq!(samples, vec![10, 12, 9, 9, 20]);
    }
}
