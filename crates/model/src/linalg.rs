//! Dense symmetric solves for the normal equations.
//!
//! The systems are small (`2 + 4 * modes` unknowns), so a plain in-place
//! Cholesky factorisation on an `ndarray` matrix is all that is needed.

use ndarray::Array2;

/// Lower-triangular Cholesky factor `L` with `A = L Lᵀ`.
///
/// Returns `None` if `a` is not square or not positive definite.
pub(crate) fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return None;
    }
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if !(d > 0.0) {
            return None;
        }
        let d = d.sqrt();
        l[[j, j]] = d;
        for i in (j + 1)..n {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / d;
        }
    }
    Some(l)
}

/// Solves `A x = b` for symmetric positive-definite `A`.
///
/// A relative `ridge` is added to the diagonal before factorising.
pub(crate) fn solve_spd(a: &Array2<f64>, b: &[f64], ridge: f64) -> Option<Vec<f64>> {
    let n = a.nrows();
    if b.len() != n {
        return None;
    }
    let mut a = a.clone();
    let scale = (0..n).map(|i| a[[i, i]].abs()).fold(0.0, f64::max).max(1.0);
    for i in 0..n {
        a[[i, i]] += ridge * scale;
    }
    let l = cholesky(&a)?;

    // Forward: L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[[i, k]] * z[k];
        }
        z[i] = s / l[[i, i]];
    }
    // Backward: Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut s = z[i];
        for k in (i + 1)..n {
            s -= l[[k, i]] * x[k];
        }
        x[i] = s / l[[i, i]];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
