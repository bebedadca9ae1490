//! Spreadsheet-style alphabetic names for parties and measurements.
//!
//! Index `0` maps to `A`, `25` to `Z`, `26` to `AA`, `701` to `ZZ` and `702`
//! to `AAA`: a bijective base-26 numbering with no zero digit.
//!
//! # Citations
//! - Knuth, "The Art of Computer Programming, Vol. 2", §4.1 (1997) – bijective numeration

/// Number of letters in the alphabet.
const RADIX: usize = 26;

/// Converts indices to alphabetic names and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphabeticNamer {
    upper_case: bool,
}

impl AlphabeticNamer {
    /// Namer producing `A`, `B`, ... (party names).
    pub const fn upper() -> Self {
        Self { upper_case: true }
    }

    /// Namer producing `a`, `b`, ... (measurement names).
    pub const fn lower() -> Self {
        Self { upper_case: false }
    }

    /// Number of characters in the name of `index`.
    pub fn strlen(index: usize) -> usize {
        let mut length = 1;
        let mut next_offset = RADIX;
        let mut block = RADIX;
        while index >= next_offset {
            length += 1;
            block = block.saturating_mul(RADIX);
            next_offset = next_offset.saturating_add(block);
        }
        length
    }

    /// Index of the first name that has `length` characters.
    ///
    /// `level_offset(1) == 0`, `level_offset(2) == 26`, `level_offset(3) == 702`.
    pub fn level_offset(length: usize) -> usize {
        let mut offset = 0usize;
        let mut block = 1usize;
        for _ in 1..length {
            block = block.saturating_mul(RADIX);
            offset = offset.saturating_add(block);
        }
        offset
    }

    /// Name of `index`.
    pub fn index_to_name(&self, index: usize) -> String {
        let length = Self::strlen(index);
        let mut remainder = index - Self::level_offset(length);
        let base = if self.upper_case { b'A' } else { b'a' };
        let mut letters = vec![base; length];
        for slot in letters.iter_mut().rev() {
            *slot = base + (remainder % RADIX) as u8;
            remainder /= RADIX;
        }
        letters.into_iter().map(char::from).collect()
    }

    /// Index of `name`, or `None` if it contains anything but letters of this namer's case.
    pub fn name_to_index(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        let base = if self.upper_case { b'A' } else { b'a' };
        let mut value = 0usize;
        for byte in name.bytes() {
            if !(base..base + RADIX as u8).contains(&byte) {
                return None;
            }
            value = value.checked_mul(RADIX)?.checked_add((byte - base) as usize)?;
        }
        Self::level_offset(name.len()).checked_add(value)
    }
}

impl Default for AlphabeticNamer {
    fn default() -> Self {
        Self::upper()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excel_numbering() {
        let namer = AlphabeticNamer::upper();
        assert_eq!(namer.index_to_name(0), "A");
        assert_eq!(namer.index_to_name(25), "Z");
        assert_eq!(namer.index_to_name(26), "AA");
        assert_eq!(namer.index_to_name(27), "AB");
        assert_eq!(namer.index_to_name(701), "ZZ");
        assert_eq!(namer.index_to_name(702), "AAA");
    }

    #[test]
    fn lower_case() {
        let namer = AlphabeticNamer::lower();
        assert_eq!(namer.index_to_name(1), "b");
        assert_eq!(namer.index_to_name(28), "ac");
    }

    /// `strlen` and `level_offset` must agree with direct enumeration.
    #[test]
    fn lengths_agree_with_enumeration() {
        let namer = AlphabeticNamer::upper();
        for index in 0..20_000 {
            let name = namer.index_to_name(index);
            assert_eq!(AlphabeticNamer::strlen(index), name.len(), "index {index}");
            assert_eq!(namer.name_to_index(&name), Some(index));
        }
        assert_eq!(AlphabeticNamer::level_offset(1), 0);
        assert_eq!(AlphabeticNamer::level_offset(2), 26);
        assert_eq!(AlphabeticNamer::level_offset(3), 702);
        assert_eq!(AlphabeticNamer::strlen(AlphabeticNamer::level_offset(4)), 4);
        assert_eq!(AlphabeticNamer::strlen(AlphabeticNamer::level_offset(4) - 1), 3);
    }

    #[test]
    fn rejects_foreign_characters() {
        let namer = AlphabeticNamer::upper();
        assert_eq!(namer.name_to_index("a"), None);
        assert_eq!(namer.name_to_index(""), None);
        assert_eq!(namer.name_to_index("A1"), None);
    }
}
