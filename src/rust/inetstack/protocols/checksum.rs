// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

/// Computes the Internet checksum (RFC 1071) of `bytes`: the one's complement of the one's complement sum of all
/// 16-bit big-endian words. A trailing odd byte is summed as the high byte of a final word.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut state: u64 = 0;
    let mut chunks = bytes.chunks_exact(2);
    for chunk in &mut chunks {
        state += u16::from_be_bytes([chunk[0], chunk[1]]) as u64;
    }
    // Pad with zeros when there is an odd number of bytes.
    if let Some(&b) = chunks.remainder().first() {
        state += u16::from_be_bytes([b, 0]) as u64;
    }
    while state >> 16 != 0 {
        state = (state & 0xffff) + (state >> 16);
    }
    !(state as u16)
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::checksum;
    use ::anyhow::Result;
    use ::rand::{
        rngs::SmallRng,
        Rng,
        SeedableRng,
    };

    /// Worked example from RFC 1071, section 3.
    #[test]
    fn checksum_reference_value() -> Result<()> {
        crate::ensure_eq!(checksum(&[0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7]), 0x220d);

        let header: [u8; 20] = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8, 0x00, 0x01, 0xc0, 0xa8,
            0x00, 0xc7,
        ];
        crate::ensure_eq!(checksum(&header), 0xb861);
        Ok(())
    }

    #[test]
    fn checksum_zeros_and_odd_lengths() -> Result<()> {
        crate::ensure_eq!(checksum(&[]), 0xffff);
        crate::ensure_eq!(checksum(&[0u8; 64]), 0xffff);
        crate::ensure_eq!(checksum(&[0x01]), !0x0100u16);
        crate::ensure_eq!(checksum(&[0x12, 0x34, 0x56]), checksum(&[0x12, 0x34, 0x56, 0x00]));
        Ok(())
    }

    #[test]
    fn checksum_large_input() -> Result<()> {
        // Carries past 32 bits are folded back in.
        crate::ensure_eq!(checksum(&vec![0xff; 200_000]), 0);

        let mut data: Vec<u8> = vec![0xab; 262_144];
        data[0..2].copy_from_slice(&[0, 0]);
        let sum: u16 = checksum(&data);
        data[0..2].copy_from_slice(&sum.to_be_bytes());
        crate::ensure_eq!(checksum(&data), 0);
        Ok(())
    }

    /// Writing the checksum into the summed data makes the data check to zero.
    #[test]
    fn checksum_verifies_to_zero() -> Result<()> {
        let mut rng: SmallRng = SmallRng::seed_from_u64(42);
        for _ in 0..256 {
            let words: usize = rng.gen_range(1..2048);
            let mut data: Vec<u8> = (0..2 * words).map(|_| rng.gen()).collect();
            let at: usize = 2 * rng.gen_range(0..words);
            data[at] = 0;
            data[at + 1] = 0;
            let sum: u16 = checksum(&data);
            data[at..at + 2].copy_from_slice(&sum.to_be_bytes());
            crate::ensure_eq!(checksum(&data), 0);

            // An odd tail is the same as an explicit zero pad.
            let odd: &[u8] = &data[..2 * words - 1];
            let mut padded: Vec<u8> = odd.to_vec();
            padded.push(0);
            crate::ensure_eq!(checksum(odd), checksum(&padded));
        }
        Ok(())
    }
}
