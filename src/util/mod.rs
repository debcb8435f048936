//! Utility module
//!
//! Bit-level helpers shared by the telegram encoder and decoder.

/// Weights of consecutive telegram bits inside a BCD field
pub const BCD_WEIGHTS: [u8; 8] = [1, 2, 4, 8, 10, 20, 40, 80];

/// Sums the BCD weights of `bits`, least significant bit first
pub fn bcd_value(bits: &[bool]) -> u8 {
    bits.iter()
        .zip(BCD_WEIGHTS.iter())
        .filter(|(bit, _)| **bit)
        .map(|(_, weight)| *weight)
        .sum()
}

/// Returns true if both decimal digits of `bits` are at most 9
pub fn bcd_digits_valid(bits: &[bool]) -> bool {
    let nibble = |bits: &[bool]| -> u8 {
        bits.iter()
            .take(4)
            .enumerate()
            .filter(|(_, bit)| **bit)
            .map(|(i, _)| 1u8 << i)
            .sum()
    };
    let ones = nibble(&bits[..bits.len().min(4)]);
    let tens = if bits.len() > 4 { nibble(&bits[4..]) } else { 0 };
    ones <= 9 && tens <= 9
}

/// Expands `value` into `width` BCD-weighted bits, least significant first
pub fn bcd_bits(value: u8, width: usize) -> Vec<bool> {
    let bcd = ((value / 10) << 4) | (value % 10);
    (0..width).map(|i| (bcd >> i) & 1 == 1).collect()
}

/// True if the number of set bits is even
pub fn even_parity(bits: &[bool]) -> bool {
    bits.iter().filter(|bit| **bit).count() % 2 == 0
}
