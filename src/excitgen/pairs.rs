//! Triangular indexing of strictly ordered pairs `i > j`.

/// Number of pairs `i > j` with both below `n`.
#[inline]
pub(crate) fn npair(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Flat index of the pair `(i, j)`, `i > j`.
#[inline]
pub(crate) fn encode(i: usize, j: usize) -> usize {
    debug_assert!(i > j, "pair ({i}, {j}) is not strictly ordered");
    i * (i - 1) / 2 + j
}

/// Inverse of [`encode`].
#[inline]
pub(crate) fn decode(k: usize) -> (usize, usize) {
    let mut i = ((1.0 + (1.0 + 8.0 * k as f64).sqrt()) / 2.0) as usize;
    // float rounding can land one off either way
    while i * (i - 1) / 2 > k {
        i -= 1;
    }
    while (i + 1) * i / 2 <= k {
        i += 1;
    }
    (i, k - i * (i - 1) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let mut k = 0;
        for i in 1..200 {
            for j in 0..i {
                assert_eq!(encode(i, j), k);
                assert_eq!(decode(k), (i, j));
                k += 1;
            }
        }
        assert_eq!(npair(200), k);
        assert_eq!(npair(1), 0);
        assert_eq!(npair(0), 0);
    }
}
