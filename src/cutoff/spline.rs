// Regression B-splines and monotone projection.
//
// A clamped B-spline basis over [lo, hi] with evenly spaced interior knots,
// fitted to data by least squares (normal equations solved with Cholesky).
// The fitted values are then projected onto the non-decreasing cone with
// pool-adjacent-violators.

/// Relative ridge added to the normal equations' diagonal.
const RIDGE: f64 = 1e-10;

/// A clamped B-spline basis.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineBasis {
    degree: usize,
    /// Full knot vector: degree + 1 copies of each end plus the interior knots
    knots: Vec<f64>,
}

impl BSplineBasis {
    /// Basis of the given degree on [lo, hi] with `interior` evenly spaced
    /// interior knots. Has `interior + degree + 1` functions.
    pub fn clamped(lo: f64, hi: f64, degree: usize, interior: usize) -> Self {
        let mut knots = Vec::with_capacity(interior + 2 * (degree + 1));
        knots.extend(std::iter::repeat(lo).take(degree + 1));
        let step = (hi - lo) / (interior + 1) as f64;
        knots.extend((1..=interior).map(|j| lo + step * j as f64));
        knots.extend(std::iter::repeat(hi).take(degree + 1));
        Self { degree, knots }
    }

    /// Number of basis functions.
    pub fn len(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn interior_knots(&self) -> &[f64] {
        &self.knots[self.degree + 1..self.knots.len() - self.degree - 1]
    }

    fn hi(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Values of every basis function at `x` (Cox-de Boor recursion).
    pub fn evaluate(&self, x: f64) -> Vec<f64> {
        let t = &self.knots;
        let spans = t.len() - 1;

        let mut n: Vec<f64> = (0..spans)
            .map(|i| if t[i] <= x && x < t[i + 1] { 1.0 } else { 0.0 })
            .collect();
        if x >= self.hi() {
            // The right end belongs to the last non-empty span
            if let Some(last) = (0..spans).rev().find(|&i| t[i] < t[i + 1]) {
                n[last] = 1.0;
            }
        }

        for p in 1..=self.degree {
            let next: Vec<f64> = (0..spans - p)
                .map(|i| {
                    let left_den = t[i + p] - t[i];
                    let right_den = t[i + p + 1] - t[i + 1];
                    let left = if left_den > 0.0 {
                        (x - t[i]) / left_den * n[i]
                    } else {
                        0.0
                    };
                    let right = if right_den > 0.0 {
                        (t[i + p + 1] - x) / right_den * n[i + 1]
                    } else {
                        0.0
                    };
                    left + right
                })
                .collect();
            n = next;
        }
        n
    }

    /// Spline value at `x` for the given coefficients.
    pub fn value(&self, coefficients: &[f64], x: f64) -> f64 {
        self.evaluate(x)
            .iter()
            .zip(coefficients)
            .map(|(b, c)| b * c)
            .sum()
    }
}

/// Least-squares spline coefficients for points (xs, ys).
///
/// Returns None when the normal equations are not positive definite.
pub fn fit_least_squares(basis: &BSplineBasis, xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let m = basis.len();
    let mut ata = vec![vec![0.0; m]; m];
    let mut aty = vec![0.0; m];

    for (&x, &y) in xs.iter().zip(ys) {
        let row = basis.evaluate(x);
        for (i, &bi) in row.iter().enumerate() {
            if bi == 0.0 {
                continue;
            }
            aty[i] += bi * y;
            for (j, &bj) in row.iter().enumerate() {
                ata[i][j] += bi * bj;
            }
        }
    }

    let trace: f64 = (0..m).map(|i| ata[i][i]).sum();
    let ridge = RIDGE * (trace / m as f64).max(1.0);
    for (i, row) in ata.iter_mut().enumerate() {
        row[i] += ridge;
    }

    solve_spd(ata, aty)
}

/// Solve A x = b for symmetric positive definite A (Cholesky).
fn solve_spd(mut a: Vec<Vec<f64>>, b: Vec<f64>) -> Option<Vec<f64>> {
    let m = b.len();

    // Factor in place: the lower triangle of `a` becomes L
    for j in 0..m {
        let mut d = a[j][j];
        for k in 0..j {
            d -= a[j][k] * a[j][k];
        }
        if !(d > 0.0 && d.is_finite()) {
            return None;
        }
        let d = d.sqrt();
        a[j][j] = d;
        for i in j + 1..m {
            let mut s = a[i][j];
            for k in 0..j {
                s -= a[i][k] * a[j][k];
            }
            a[i][j] = s / d;
        }
    }

    let mut z = vec![0.0; m];
    for i in 0..m {
        let mut s = b[i];
        for k in 0..i {
            s -= a[i][k] * z[k];
        }
        z[i] = s / a[i][i];
    }

    let mut x = vec![0.0; m];
    for i in (0..m).rev() {
        let mut s = z[i];
        for k in i + 1..m {
            s -= a[k][i] * x[k];
        }
        x[i] = s / a[i][i];
    }

    Some(x)
}

/// Closest non-decreasing sequence in least squares (pool adjacent violators).
pub fn isotonic(values: &[f64]) -> Vec<f64> {
    // (sum, count) per pooled block
    let mut blocks: Vec<(f64, usize)> = Vec::with_capacity(values.len());
    for &v in values {
        blocks.push((v, 1));
        while blocks.len() >= 2 {
            let (s2, c2) = blocks[blocks.len() - 1];
            let (s1, c1) = blocks[blocks.len() - 2];
            if s1 / c1 as f64 <= s2 / c2 as f64 {
                break;
            }
            blocks.pop();
            let last = blocks.len() - 1;
            blocks[last] = (s1 + s2, c1 + c2);
        }
    }

    blocks
        .into_iter()
        .flat_map(|(sum, count)| std::iter::repeat(sum / count as f64).take(count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_size_and_knots() {
        let basis = BSplineBasis::clamped(1.0, 10.0, 2, 2);
        assert_eq!(basis.len(), 5);
        assert_eq!(basis.interior_knots(), &[4.0, 7.0]);
    }

    #[test]
    fn test_partition_of_unity() {
        let basis = BSplineBasis::clamped(1.0, 10.0, 3, 4);
        for x in [1.0, 2.5, 5.0, 9.99, 10.0] {
            let sum: f64 = basis.evaluate(x).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "sum at {x} was {sum}");
        }
    }

    #[test]
    fn test_fits_linear_data_exactly() {
        let xs: Vec<f64> = (1..=20).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let basis = BSplineBasis::clamped(1.0, 20.0, 2, 2);
        let coef = fit_least_squares(&basis, &xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            let fitted = basis.value(&coef, x);
            assert!((fitted - y).abs() < 1e-6, "at {x}: {fitted} vs {y}");
        }
    }

    #[test]
    fn test_isotonic_pools_violators() {
        assert_eq!(isotonic(&[1.0, 3.0, 2.0, 4.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(isotonic(&[3.0, 2.0, 1.0]), vec![2.0, 2.0, 2.0]);
        assert_eq!(isotonic(&[]), Vec::<f64>::new());
    }
}
