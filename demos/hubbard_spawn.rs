//! Hubbard spawning efficiency example
//!
//! Compares uniform hopping with hopping that prefers doubly occupied sites
//! by the spread of the spawning contributions `helem / p` from a random
//! half-filled state.
//!
//! Usage:
//!   cargo run --example hubbard_spawn --release -- [OPTIONS]
//!
//! Options:
//!   -l, --length <N>     Sites along each lattice direction [default: 4]
//!   -u, --u <U>          On-site repulsion [default: 4.0]
//!   -n, --ndraw <N>      Draws per generator [default: 1000000]

use std::sync::Arc;

use clap::Parser;
use rust_excitgen::basis::{CachedOrbs, FrmOnv, EX_SINGLE};
use rust_excitgen::excitgen::{Draw, ExcitGen, HubbardPreferDoubleOcc, HubbardUniform};
use rust_excitgen::hamiltonian::{HubbardFrmHam, Lattice};
use rust_excitgen::Prng;

/// Hubbard hopping generator comparison
#[derive(Parser, Debug)]
#[command(version, about = "Compare Hubbard excitation generators")]
struct Args {
    /// Sites along each of the two lattice directions
    #[arg(short = 'l', long, default_value_t = 4)]
    length: usize,

    /// On-site repulsion U in units of t
    #[arg(short = 'u', long, default_value_t = 4.0)]
    u: f64,

    /// Number of draws per generator
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    ndraw: usize,

    /// Random seed
    #[arg(short, long, default_value_t = 14)]
    seed: u64,
}

/// Random state with `nsite / 2` electrons of each spin.
fn half_filled(nsite: usize, rng: &mut Prng) -> FrmOnv {
    let mut onv = FrmOnv::new(nsite);
    for ispin in 0..2 {
        let mut nplaced = 0;
        while nplaced < nsite / 2 {
            let i = ispin * nsite + rng.draw_uint(nsite);
            if !onv.get(i) {
                onv.set(i);
                nplaced += 1;
            }
        }
    }
    onv
}

fn spread(gen: &dyn ExcitGen, src: &FrmOnv, ndraw: usize, rng: &mut Prng) -> (f64, f64, f64) {
    let mut orbs = CachedOrbs::default();
    let (mut sum, mut sum_sq, mut nrejected) = (0.0, 0.0, 0usize);
    for _ in 0..ndraw {
        match gen.draw_frm(EX_SINGLE, src, &mut orbs, rng) {
            Draw::Proposed(p) => {
                let helem = p.helem.unwrap_or_else(|| gen.coupling_frm(src, &p.conn));
                let contrib = helem / p.prob;
                sum += contrib;
                sum_sq += contrib * contrib;
            }
            Draw::Rejected => nrejected += 1,
        }
    }
    let n = ndraw as f64;
    let mean = sum / n;
    (mean, (sum_sq / n - mean * mean).sqrt(), nrejected as f64 / n)
}

fn main() {
    let args = Args::parse();
    let ham = Arc::new(HubbardFrmHam::new(Lattice::hypercubic(&[args.length, args.length], true), 1.0, args.u));
    let mut rng = Prng::from_seed(args.seed);
    let src = half_filled(args.length * args.length, &mut rng);

    let gens: Vec<Box<dyn ExcitGen>> = vec![
        Box::new(HubbardUniform::new(ham.clone())),
        Box::new(HubbardPreferDoubleOcc::new(ham, 1.0)),
    ];

    println!("{}x{} Hubbard lattice, U = {}", args.length, args.length, args.u);
    println!("{:<45} {:>12} {:>12} {:>10}", "generator", "row sum", "std dev", "rejected");
    for gen in &gens {
        let (mean, std, rej) = spread(gen.as_ref(), &src, args.ndraw, &mut rng);
        println!("{:<45} {:>12.6} {:>12.6} {:>10.4}", gen.description(), mean, std, rej);
    }
}
