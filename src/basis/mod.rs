//! Basis module - excitation signatures, basis states, connections and the
//! per-worker orbital cache.

mod cached_orbs;
mod conn;
mod exsig;
mod onv;

pub use cached_orbs::{BosDecoded, CachedOrbs, FrmDecoded};
pub use conn::{BosConn, FrmBosConn, FrmConn};
pub use exsig::{ExSig, EX_0001, EX_0010, EX_0022, EX_1101, EX_1110, EX_DOUBLE, EX_SINGLE, NDISTINCT};
pub use onv::{BosBasis, BosOnv, FrmBasis, FrmBosOnv, FrmOnv, Particles};
