//! Holstein-type electron-boson ladder coupling.

use std::sync::Arc;

use tracing::warn;

use super::{ExcitGenOpts, HamTerm};
use crate::basis::{BosBasis, FrmBosConn, FrmBosOnv};
use crate::error::ConfigError;
use crate::excitgen::{ExcitGen, LadderPureDensity, LadderPureUniform};

/// `H = sum_n (v_unc[n] + g n_n) (b†n + bn)`, one boson mode per site, where
/// `n_n` counts the electrons on site `n`.
#[derive(Debug, Clone)]
pub struct HolsteinLadderHam {
    pub bos_basis: BosBasis,
    pub g: f64,
    v_unc: Vec<f64>,
}

impl HolsteinLadderHam {
    /// `v_unc` is either empty (no uncoupled term) or one value per mode.
    pub fn new(bos_basis: BosBasis, g: f64, v_unc: Vec<f64>) -> Result<Self, ConfigError> {
        let v_unc = if v_unc.is_empty() { vec![0.0; bos_basis.nmode] } else { v_unc };
        if v_unc.len() != bos_basis.nmode {
            return Err(ConfigError::Invalid {
                field: "v_unc",
                reason: format!("expected {} values, found {}", bos_basis.nmode, v_unc.len()),
            });
        }
        Ok(Self { bos_basis, g, v_unc })
    }

    pub fn nmode(&self) -> usize {
        self.bos_basis.nmode
    }

    /// True if the ladder term only acts through the electron density.
    pub fn is_density_only(&self) -> bool {
        self.v_unc.iter().all(|&v| v == 0.0)
    }

    /// Panics unless `src` has exactly one site per boson mode.
    pub(crate) fn check_sites(&self, src: &FrmBosOnv) {
        assert_eq!(
            src.frm.nsite(),
            self.nmode(),
            "Holstein term needs one boson mode per site, found {} modes for {} sites",
            self.nmode(),
            src.frm.nsite()
        );
    }

    pub fn get_element(&self, src: &FrmBosOnv, conn: &FrmBosConn) -> f64 {
        if !conn.frm.ann.is_empty() || !conn.frm.cre.is_empty() {
            return 0.0;
        }
        let imode = match (conn.bos.ann.as_slice(), conn.bos.cre.as_slice()) {
            (&[n], []) | ([], &[n]) => n,
            _ => return 0.0,
        };
        self.check_sites(src);
        let nelec_site = src.frm.site_nocc(imode) as f64;
        (self.v_unc[imode] + self.g * nelec_site) * conn.bos.occ_factor(&src.bos)
    }
}

impl HamTerm for HolsteinLadderHam {
    fn description(&self) -> &str {
        "Holstein ladder"
    }

    fn excit_gens(self: Arc<Self>, opts: &ExcitGenOpts) -> Vec<Box<dyn ExcitGen>> {
        if opts.ladder_density {
            if self.is_density_only() {
                return vec![Box::new(LadderPureDensity::new(self))];
            }
            warn!("uncoupled boson term present, density-weighted ladder moves would miss connections");
        }
        vec![Box::new(LadderPureUniform::new(self))]
    }
}
