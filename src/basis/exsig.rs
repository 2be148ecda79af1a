//! Excitation signatures.
//!
//! An exsig packs the number of fermion and boson creation and annihilation
//! operators of an excitation into one small integer.

use std::fmt;

const NBIT_FRM: u32 = 3;
const NBIT_BOS: u32 = 2;
const MASK_FRM: u32 = (1 << NBIT_FRM) - 1;
const MASK_BOS: u32 = (1 << NBIT_BOS) - 1;

/// Number of distinct representable signatures.
pub const NDISTINCT: usize = 1 << (2 * NBIT_FRM + 2 * NBIT_BOS);

/// Classification of an excitation by operator counts per species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExSig(u32);

/// One fermion moved: 1 creation, 1 annihilation.
pub const EX_SINGLE: ExSig = ExSig::new(1, 1, 0, 0);
/// Two fermions moved.
pub const EX_DOUBLE: ExSig = ExSig::new(2, 2, 0, 0);
/// One boson created.
pub const EX_0010: ExSig = ExSig::new(0, 0, 1, 0);
/// One boson annihilated.
pub const EX_0001: ExSig = ExSig::new(0, 0, 0, 1);
/// Two bosons moved.
pub const EX_0022: ExSig = ExSig::new(0, 0, 2, 2);
/// One fermion moved while a boson is created.
pub const EX_1110: ExSig = ExSig::new(1, 1, 1, 0);
/// One fermion moved while a boson is annihilated.
pub const EX_1101: ExSig = ExSig::new(1, 1, 0, 1);

impl ExSig {
    /// Pack operator counts. Panics (at compile time for constants) when a
    /// count does not fit its bit field.
    pub const fn new(nfrm_cre: u32, nfrm_ann: u32, nbos_cre: u32, nbos_ann: u32) -> Self {
        assert!(nfrm_cre <= MASK_FRM && nfrm_ann <= MASK_FRM, "too many fermion operators");
        assert!(nbos_cre <= MASK_BOS && nbos_ann <= MASK_BOS, "too many boson operators");
        Self(
            nfrm_cre
                | (nfrm_ann << NBIT_FRM)
                | (nbos_cre << (2 * NBIT_FRM))
                | (nbos_ann << (2 * NBIT_FRM + NBIT_BOS)),
        )
    }

    pub const fn nfrm_cre(self) -> u32 {
        self.0 & MASK_FRM
    }

    pub const fn nfrm_ann(self) -> u32 {
        (self.0 >> NBIT_FRM) & MASK_FRM
    }

    pub const fn nbos_cre(self) -> u32 {
        (self.0 >> (2 * NBIT_FRM)) & MASK_BOS
    }

    pub const fn nbos_ann(self) -> u32 {
        (self.0 >> (2 * NBIT_FRM + NBIT_BOS)) & MASK_BOS
    }

    /// True if no boson operators are involved.
    pub const fn is_pure_frm(self) -> bool {
        self.nbos_cre() + self.nbos_ann() == 0
    }

    /// True if no fermion operators are involved.
    pub const fn is_pure_bos(self) -> bool {
        self.nfrm_cre() + self.nfrm_ann() == 0
    }

    pub const fn conserves_nfrm(self) -> bool {
        self.nfrm_cre() == self.nfrm_ann()
    }

    pub const fn conserves_nbos(self) -> bool {
        self.nbos_cre() == self.nbos_ann()
    }

    /// Raw packed value, usable as a dense table index below [`NDISTINCT`].
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.nfrm_cre(), self.nfrm_ann(), self.nbos_cre(), self.nbos_ann())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_counts() {
        let exsig = ExSig::new(2, 1, 1, 3);
        assert_eq!(exsig.nfrm_cre(), 2);
        assert_eq!(exsig.nfrm_ann(), 1);
        assert_eq!(exsig.nbos_cre(), 1);
        assert_eq!(exsig.nbos_ann(), 3);
        assert!(exsig.index() < NDISTINCT);
    }

    #[test]
    fn test_named_signatures() {
        assert_eq!(EX_SINGLE.to_string(), "1100");
        assert_eq!(EX_DOUBLE.to_string(), "2200");
        assert_eq!(EX_0010.to_string(), "0010");
        assert_eq!(EX_0001.to_string(), "0001");
        assert_eq!(EX_0022.to_string(), "0022");
        assert!(EX_DOUBLE.is_pure_frm() && EX_DOUBLE.conserves_nfrm());
        assert!(EX_0010.is_pure_bos() && !EX_0010.conserves_nbos());
        assert_ne!(EX_0010, EX_0001);
    }

    #[test]
    fn test_mixed_signatures() {
        assert_eq!(EX_1110.to_string(), "1110");
        assert_eq!(EX_1101.to_string(), "1101");
        for exsig in [EX_1110, EX_1101] {
            assert!(!exsig.is_pure_frm() && !exsig.is_pure_bos());
            assert!(exsig.conserves_nfrm() && !exsig.conserves_nbos());
        }
        assert_ne!(EX_1110.index(), EX_1101.index());
    }

    #[test]
    #[should_panic]
    fn test_overflow_panics() {
        let _ = ExSig::new(0, 0, 4, 0);
    }
}
