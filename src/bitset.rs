//! Compact bitset representation for the species that possess a character.
//!
//! # Overview
//! Each character column of the matrix is stored as a bitset over species.
//! Bit position `i` corresponds to species (row) `i`.
//!
//! # Example
//! For species [s0000, s0001, s0002, s0003]:
//! - Column `"1010"` → bitset `0b0101` (bits 0 and 2 set)
//! - Column `"0111"` → bitset `0b1110` (bits 1, 2, 3 set)
//!
//! Note that the textual column reads left to right from species 0, while the
//! binary literal reads right to left from bit 0.

use std::cmp::Ordering;

/// A compact bitset for representing which species possess a character.
///
/// Internally stores bits in `Vec<u64>` words to support arbitrarily many species.
/// Each u64 word holds 64 species indices.
///
/// # Memory efficiency
/// - Column kept as a `String` of '0'/'1': 1 byte per species
/// - Bitset: 1 bit per species (8 bytes per 64 species)
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Creates a new bitset with all bits set to 0.
    ///
    /// # Parameters
    /// - `words`: Number of u64 words needed. Calculate with [`Bitset::words_for`].
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::bitset::Bitset;
    /// // For a matrix with 100 species, need 2 words (128 bits)
    /// let bs = Bitset::zeros(Bitset::words_for(100));
    /// assert_eq!(bs.0.len(), 2);
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Number of words needed to hold `bits` bits.
    #[inline]
    pub fn words_for(bits: usize) -> usize {
        bits.div_ceil(64)
    }

    /// Builds a bitset from an iterator of booleans, bit `i` taken from item `i`.
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::bitset::Bitset;
    /// let bs = Bitset::from_bits(4, [true, false, true, false]);
    /// assert_eq!(bs.0[0], 0b0101);
    /// ```
    pub fn from_bits<I: IntoIterator<Item = bool>>(len: usize, bits: I) -> Self {
        let mut bs = Bitset::zeros(Self::words_for(len));
        for (idx, bit) in bits.into_iter().enumerate().take(len) {
            if bit {
                bs.set(idx);
            }
        }
        bs
    }

    /// Sets the bit at the given index to 1.
    ///
    /// Marks a species as possessing the character.
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(0);  // species 0
    /// bs.set(5);  // species 5
    /// assert_eq!(bs.0[0], 0b00100001);
    /// ```
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6;     // Equivalent to idx / 64
        let bit = idx & 63;      // Equivalent to idx % 64
        self.0[word] |= 1u64 << bit;
    }

    /// Returns whether the bit at `idx` is set. Out of range reads as unset.
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        self.0
            .get(idx >> 6)
            .is_some_and(|w| (w >> (idx & 63)) & 1 == 1)
    }

    /// True when the two sets share at least one species.
    #[inline]
    pub fn intersects(&self, other: &Bitset) -> bool {
        self.0.iter().zip(&other.0).any(|(a, b)| a & b != 0)
    }

    /// True when every species in `self` is also in `other`.
    #[inline]
    pub fn is_subset_of(&self, other: &Bitset) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a & !b == 0)
    }

    /// True when no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Indices of the set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some((w << 6) + bit)
            })
        })
    }

    /// Compares two bitsets the way their '0'/'1' column strings compare.
    ///
    /// The string puts species 0 first, so the first differing species decides:
    /// whichever side has a 1 there is the greater. Both bitsets must hold the
    /// same number of words.
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::bitset::Bitset;
    /// # use std::cmp::Ordering;
    /// let a = Bitset::from_bits(3, [true, false, false]); // "100"
    /// let b = Bitset::from_bits(3, [false, true, true]);  // "011"
    /// assert_eq!(a.lex_cmp(&b), Ordering::Greater);
    /// ```
    pub fn lex_cmp(&self, other: &Bitset) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            let diff = a ^ b;
            if diff != 0 {
                let bit = diff.trailing_zeros();
                return if (a >> bit) & 1 == 1 { Ordering::Greater } else { Ordering::Less };
            }
        }
        Ordering::Equal
    }

    /// Renders the first `len` bits as a '0'/'1' string, species 0 first.
    pub fn to_bit_string(&self, len: usize) -> String {
        (0..len).map(|i| if self.get(i) { '1' } else { '0' }).collect()
    }
}
