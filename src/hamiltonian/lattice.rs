//! Hypercubic lattice topology for tight-binding terms.

use nalgebra::DMatrix;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    pub dims: Vec<usize>,
    pub periodic: bool,
    adj: Vec<Vec<usize>>,
}

impl Lattice {
    /// Row-major hypercubic lattice. With `periodic` each dimension wraps
    /// around; a dimension of length 2 then still has a single bond.
    pub fn hypercubic(dims: &[usize], periodic: bool) -> Self {
        let nsite: usize = dims.iter().product();
        let mut adj = vec![Vec::new(); nsite];
        let mut strides = vec![1; dims.len()];
        for idim in (0..dims.len().saturating_sub(1)).rev() {
            strides[idim] = strides[idim + 1] * dims[idim + 1];
        }

        for (isite, neighbours) in adj.iter_mut().enumerate() {
            for (&len, &stride) in dims.iter().zip(&strides) {
                let coord = (isite / stride) % len;
                let mut push = |c: usize| {
                    let jsite = isite - coord * stride + c * stride;
                    if jsite != isite && !neighbours.contains(&jsite) {
                        neighbours.push(jsite);
                    }
                };
                if coord + 1 < len {
                    push(coord + 1);
                } else if periodic {
                    push(0);
                }
                if coord > 0 {
                    push(coord - 1);
                } else if periodic {
                    push(len - 1);
                }
            }
            neighbours.sort_unstable();
        }
        Self { dims: dims.to_vec(), periodic, adj }
    }

    pub fn nsite(&self) -> usize {
        self.adj.len()
    }

    pub fn neighbours(&self, isite: usize) -> &[usize] {
        &self.adj[isite]
    }

    pub fn is_bonded(&self, isite: usize, jsite: usize) -> bool {
        self.adj[isite].binary_search(&jsite).is_ok()
    }

    pub fn max_coordination(&self) -> usize {
        self.adj.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Nearest-neighbour hopping matrix with `-t` on every bond.
    pub fn hopping_matrix(&self, t: f64) -> DMatrix<f64> {
        let n = self.nsite();
        DMatrix::from_fn(n, n, |i, j| if self.is_bonded(i, j) { -t } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_open_chain() {
        let lattice = Lattice::hypercubic(&[4], false);
        assert_eq!(lattice.neighbours(0), &[1]);
        assert_eq!(lattice.neighbours(2), &[1, 3]);
        assert_eq!(lattice.max_coordination(), 2);
    }

    #[test]
    fn test_periodic_chain() {
        let lattice = Lattice::hypercubic(&[4], true);
        assert_eq!(lattice.neighbours(0), &[1, 3]);
        assert_eq!(lattice.neighbours(3), &[0, 2]);
        let two = Lattice::hypercubic(&[2], true);
        assert_eq!(two.neighbours(0), &[1]);
    }

    #[test]
    fn test_square_lattice() {
        let lattice = Lattice::hypercubic(&[3, 3], true);
        assert_eq!(lattice.nsite(), 9);
        // site 4 is the centre of the 3x3 grid
        assert_eq!(lattice.neighbours(4), &[1, 3, 5, 7]);
        assert_eq!(lattice.neighbours(0), &[1, 2, 3, 6]);
        assert_eq!(lattice.max_coordination(), 4);
    }

    #[test]
    fn test_hopping_matrix_is_symmetric() {
        let lattice = Lattice::hypercubic(&[2, 3], false);
        let h = lattice.hopping_matrix(1.5);
        assert_relative_eq!(h.clone(), h.transpose());
        assert_relative_eq!(h[(0, 1)], -1.5);
        assert_relative_eq!(h[(0, 3)], -1.5);
        assert_relative_eq!(h[(0, 4)], 0.0);
    }
}
