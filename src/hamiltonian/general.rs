//! General fermion Hamiltonian from one- and two-body integrals over spatial
//! orbitals.
//!
//! Two-body integrals are stored in chemists' notation `(pq|rs)` with the
//! eight-fold permutational symmetry of real orbitals. The spin-orbital
//! integral `<ab|ij>` is `(ai|bj)` when `a, i` and `b, j` share a spin and
//! zero otherwise.

use std::sync::Arc;

use nalgebra::DMatrix;
use rand_distr::Normal;

use super::{ExcitGenOpts, FrmHam, HamTerm};
use crate::basis::{FrmBasis, FrmConn, FrmOnv};
use crate::error::ConfigError;
use crate::excitgen::{ExcitGen, PchbDoubles, UniformSingles};
use crate::sampling::Prng;

/// Integrals smaller than this count as symmetry-forbidden zeros.
const SYM_TOL: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct GeneralFrmHam {
    basis: FrmBasis,
    h1: DMatrix<f64>,
    h2: Vec<f64>,
    symmetric: bool,
}

impl GeneralFrmHam {
    /// Build from `h1` (`nsite x nsite`) and `h2` (flat, `nsite^4`, index
    /// `((p*n + q)*n + r)*n + s` for `(pq|rs)`).
    pub fn new(basis: FrmBasis, h1: DMatrix<f64>, h2: Vec<f64>) -> Result<Self, ConfigError> {
        let n = basis.nsite;
        if h1.nrows() != n || h1.ncols() != n {
            return Err(ConfigError::Invalid {
                field: "h1",
                reason: format!("expected {n}x{n}, found {}x{}", h1.nrows(), h1.ncols()),
            });
        }
        if h2.len() != n.pow(4) {
            return Err(ConfigError::Invalid {
                field: "h2",
                reason: format!("expected {} elements, found {}", n.pow(4), h2.len()),
            });
        }
        let mut ham = Self { basis, h1, h2, symmetric: false };
        ham.symmetric = ham.respects_irreps();
        Ok(ham)
    }

    /// Random real integrals with the full permutational symmetry, zero
    /// wherever the irrep product is not totally symmetric.
    pub fn random(basis: FrmBasis, scale: f64, rng: &mut Prng) -> Result<Self, ConfigError> {
        let dist = Normal::new(0.0, scale).map_err(|e| ConfigError::Invalid {
            field: "scale",
            reason: e.to_string(),
        })?;
        let n = basis.nsite;
        let irrep = |p: usize| basis.irrep(p);

        let mut h1 = DMatrix::zeros(n, n);
        for p in 0..n {
            for q in 0..=p {
                if irrep(p) == irrep(q) {
                    let v = rng.sample(&dist);
                    h1[(p, q)] = v;
                    h1[(q, p)] = v;
                }
            }
        }

        let mut h2 = vec![0.0; n.pow(4)];
        let idx = |p: usize, q: usize, r: usize, s: usize| ((p * n + q) * n + r) * n + s;
        for p in 0..n {
            for q in 0..=p {
                for r in 0..n {
                    for s in 0..=r {
                        if p * n + q < r * n + s || irrep(p) ^ irrep(q) ^ irrep(r) ^ irrep(s) != 0 {
                            continue;
                        }
                        let v = rng.sample(&dist);
                        for (a, b, c, d) in [
                            (p, q, r, s),
                            (q, p, r, s),
                            (p, q, s, r),
                            (q, p, s, r),
                            (r, s, p, q),
                            (s, r, p, q),
                            (r, s, q, p),
                            (s, r, q, p),
                        ] {
                            h2[idx(a, b, c, d)] = v;
                        }
                    }
                }
            }
        }
        Self::new(basis, h1, h2)
    }

    fn respects_irreps(&self) -> bool {
        let n = self.basis.nsite;
        let irrep = |p: usize| self.basis.irrep(p);
        let h1_ok = (0..n)
            .flat_map(|p| (0..n).map(move |q| (p, q)))
            .all(|(p, q)| irrep(p) == irrep(q) || self.h1[(p, q)].abs() < SYM_TOL);
        h1_ok
            && self.h2.iter().enumerate().all(|(k, v)| {
                let (s, r, q, p) = (k % n, (k / n) % n, (k / n / n) % n, k / n / n / n);
                irrep(p) ^ irrep(q) ^ irrep(r) ^ irrep(s) == 0 || v.abs() < SYM_TOL
            })
    }

    /// Spatial-orbital integral `(pq|rs)`.
    #[inline]
    pub fn eri(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        let n = self.basis.nsite;
        self.h2[((p * n + q) * n + r) * n + s]
    }

    /// Spin-orbital one-body element `h_ai`.
    #[inline]
    fn one_body(&self, a: usize, i: usize) -> f64 {
        let b = &self.basis;
        if b.ispin(a) != b.ispin(i) {
            return 0.0;
        }
        self.h1[(b.isite(a), b.isite(i))]
    }

    /// Spin-orbital two-body integral `<ab|ij>` in physicists' notation.
    #[inline]
    pub fn coulomb(&self, a: usize, b: usize, i: usize, j: usize) -> f64 {
        let basis = &self.basis;
        if basis.ispin(a) != basis.ispin(i) || basis.ispin(b) != basis.ispin(j) {
            return 0.0;
        }
        self.eri(basis.isite(a), basis.isite(i), basis.isite(b), basis.isite(j))
    }

    /// Antisymmetrized integral `<ab||ij> = <ab|ij> - <ab|ji>`.
    #[inline]
    pub fn antisym(&self, a: usize, b: usize, i: usize, j: usize) -> f64 {
        self.coulomb(a, b, i, j) - self.coulomb(a, b, j, i)
    }

    fn diagonal(&self, src: &FrmOnv) -> f64 {
        let occ: Vec<usize> = src.occs().collect();
        let mut e = 0.0;
        for (n, &i) in occ.iter().enumerate() {
            e += self.one_body(i, i);
            for &j in &occ[..n] {
                e += self.antisym(i, j, i, j);
            }
        }
        e
    }

    fn single(&self, src: &FrmOnv, i: usize, a: usize) -> f64 {
        let mut e = self.one_body(a, i);
        for j in src.occs().filter(|&j| j != i) {
            e += self.antisym(a, j, i, j);
        }
        e
    }
}

impl FrmHam for GeneralFrmHam {
    fn basis(&self) -> &FrmBasis {
        &self.basis
    }

    fn conserves_symmetry(&self) -> bool {
        self.symmetric
    }

    fn get_element(&self, src: &FrmOnv, conn: &FrmConn) -> f64 {
        match (conn.ann.as_slice(), conn.cre.as_slice()) {
            ([], []) => self.diagonal(src),
            (&[i], &[a]) => self.single(src, i, a) * conn.sign(src),
            (&[i, j], &[a, b]) => self.antisym(a, b, i, j) * conn.sign(src),
            _ => 0.0,
        }
    }
}

impl HamTerm for GeneralFrmHam {
    fn description(&self) -> &str {
        "general two-body"
    }

    fn excit_gens(self: Arc<Self>, _opts: &ExcitGenOpts) -> Vec<Box<dyn ExcitGen>> {
        let singles = UniformSingles::new(self.clone());
        let doubles = PchbDoubles::new(self);
        vec![Box::new(singles), Box::new(doubles)]
    }
}
