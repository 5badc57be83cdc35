//! DNA sequence utilities.
//!
//! This module provides the base complement table and in-place reverse
//! complement used when assembling minus-strand transcripts and building
//! reverse reads.

/// Complements a single DNA base, normalizing to uppercase.
///
/// Returns the Watson-Crick complement: A<->T, C<->G. RNA uracil maps to 'A'.
/// Any byte outside the recognized alphabet becomes 'N', so downstream
/// consumers never see ambiguity codes or stray characters in simulated reads.
///
/// # Examples
///
/// ```
/// use readsim_lib::dna::complement;
///
/// assert_eq!(complement(b'A'), b'T');
/// assert_eq!(complement(b'g'), b'C');
/// assert_eq!(complement(b'U'), b'A');
/// assert_eq!(complement(b'R'), b'N');
/// ```
#[inline]
#[must_use]
pub const fn complement(base: u8) -> u8 {
    match base {
        b'A' | b'a' => b'T',
        b'T' | b't' => b'A',
        b'C' | b'c' => b'G',
        b'G' | b'g' => b'C',
        b'U' | b'u' => b'A',
        _ => b'N',
    }
}

/// Reverse complements a sequence in place.
///
/// Two-pointer swap with complementation at both ends, moving inward. The
/// middle base of an odd-length sequence is complemented exactly once.
pub fn reverse_complement_in_place(seq: &mut [u8]) {
    let mut left = 0;
    let mut right = seq.len();
    while left + 1 < right {
        right -= 1;
        let tmp = complement(seq[left]);
        seq[left] = complement(seq[right]);
        seq[right] = tmp;
        left += 1;
    }
    if left + 1 == right {
        seq[left] = complement(seq[left]);
    }
}

/// Reverse complements a sequence, returning a new buffer.
#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    let mut out = seq.to_vec();
    reverse_complement_in_place(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement() {
        assert_eq!(complement(b'A'), b'T');
        assert_eq!(complement(b'T'), b'A');
        assert_eq!(complement(b'C'), b'G');
        assert_eq!(complement(b'G'), b'C');

        // Lowercase normalized to uppercase
        assert_eq!(complement(b'a'), b'T');
        assert_eq!(complement(b't'), b'A');
        assert_eq!(complement(b'c'), b'G');
        assert_eq!(complement(b'g'), b'C');

        // RNA uracil
        assert_eq!(complement(b'U'), b'A');
        assert_eq!(complement(b'u'), b'A');

        // Everything else collapses to N
        for b in [b'N', b'n', b'R', b'Y', b'-', b'.', b'0', b'X'] {
            assert_eq!(complement(b), b'N');
        }
    }

    #[test]
    fn test_reverse_complement_basic() {
        assert_eq!(reverse_complement(b""), b"".to_vec());
        assert_eq!(reverse_complement(b"A"), b"T".to_vec());
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"AAAA"), b"TTTT".to_vec());
        assert_eq!(reverse_complement(b"ACGTN"), b"NACGT".to_vec());
        assert_eq!(reverse_complement(b"acgt"), b"ACGT".to_vec());
    }

    #[test]
    fn test_reverse_complement_odd_length() {
        // Middle base must be complemented exactly once
        assert_eq!(reverse_complement(b"ACG"), b"CGT".to_vec());
        assert_eq!(reverse_complement(b"TTATT"), b"AATAA".to_vec());
    }

    #[test]
    fn test_reverse_complement_is_involution() {
        for seq in [&b"ACGTNacgtn"[..], b"A", b"", b"GATTACA", b"CCCCGGGG"] {
            let once = reverse_complement(seq);
            let twice = reverse_complement(&once);
            let expected: Vec<u8> = seq
                .iter()
                .map(|&b| match b {
                    b'a'..=b'z' => b.to_ascii_uppercase(),
                    _ => b,
                })
                .collect();
            assert_eq!(twice, expected, "double revcomp of {:?}", String::from_utf8_lossy(seq));
        }
    }

    #[test]
    fn test_in_place_matches_allocating() {
        let mut buf = b"GATTACAN".to_vec();
        let expected = reverse_complement(&buf);
        reverse_complement_in_place(&mut buf);
        assert_eq!(buf, expected);
    }
}
