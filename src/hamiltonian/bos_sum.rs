//! Boson interaction conserving the sum of mode indices.

use std::sync::Arc;

use super::{ExcitGenOpts, HamTerm};
use crate::basis::{BosBasis, BosConn, BosOnv};
use crate::excitgen::{BosonSumConservingDoubles, ExcitGen};

/// `H = v/2 sum_{a+b=i+j} b†a b†b bj bi` over ordered mode indices.
#[derive(Debug, Clone)]
pub struct SumConservingBosHam {
    pub basis: BosBasis,
    pub v: f64,
}

impl SumConservingBosHam {
    pub fn new(basis: BosBasis, v: f64) -> Self {
        Self { basis, v }
    }

    pub fn get_element(&self, src: &BosOnv, conn: &BosConn) -> f64 {
        match (conn.ann.as_slice(), conn.cre.as_slice()) {
            ([], []) => {
                let n = src.nboson() as f64;
                let nsq: f64 = src.occs().iter().map(|&o| (o * o) as f64).sum();
                0.5 * self.v * (2.0 * n * n - n - nsq)
            }
            (&[i, j], &[a, b]) => {
                if a + b != i + j {
                    return 0.0;
                }
                let nann = if i == j { 1.0 } else { 2.0 };
                let ncre = if a == b { 1.0 } else { 2.0 };
                0.5 * self.v * nann * ncre * conn.occ_factor(src)
            }
            _ => 0.0,
        }
    }
}

impl HamTerm for SumConservingBosHam {
    fn description(&self) -> &str {
        "boson sum-conserving"
    }

    fn excit_gens(self: Arc<Self>, _opts: &ExcitGenOpts) -> Vec<Box<dyn ExcitGen>> {
        vec![Box::new(BosonSumConservingDoubles::new(self))]
    }
}
