//! Small dense linear algebra for regression fitting.
//!
//! Only what the logistic fit needs: a row-major [`Matrix`] and a
//! [`Cholesky`] factorization of symmetric positive-definite matrices that
//! reports near-singular pivots instead of producing garbage.

use serde::Serialize;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from a slice of rows.
    ///
    /// Returns `None` if the rows have different lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// use trainsight_stats::linalg::Matrix;
    ///
    /// let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m.get(1, 0), 3.0);
    /// assert!(Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    /// ```
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// `Xᵀ W X` for a diagonal weight vector `w`.
    ///
    /// # Panics
    ///
    /// Panics if `w.len() != self.rows()`.
    #[must_use]
    pub fn weighted_gram(&self, w: &[f64]) -> Matrix {
        assert_eq!(w.len(), self.rows, "one weight per row");
        let p = self.cols;
        let mut out = Matrix::zeros(p, p);
        for (i, &wi) in w.iter().enumerate() {
            let xi = self.row(i);
            for a in 0..p {
                let wa = wi * xi[a];
                for b in a..p {
                    out.data[a * p + b] += wa * xi[b];
                }
            }
        }
        for a in 0..p {
            for b in 0..a {
                out.data[a * p + b] = out.data[b * p + a];
            }
        }
        out
    }

    /// `Xᵀ v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != self.rows()`.
    #[must_use]
    pub fn transpose_mul(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.rows, "one value per row");
        let mut out = vec![0.0; self.cols];
        for (i, &vi) in v.iter().enumerate() {
            for (o, &x) in out.iter_mut().zip(self.row(i)) {
                *o += x * vi;
            }
        }
        out
    }

    /// `X β`.
    ///
    /// # Panics
    ///
    /// Panics if `beta.len() != self.cols()`.
    #[must_use]
    pub fn mul_vec(&self, beta: &[f64]) -> Vec<f64> {
        assert_eq!(beta.len(), self.cols, "one coefficient per column");
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(beta).map(|(x, b)| x * b).sum())
            .collect()
    }
}

/// Lower-triangular factor `L` of `A = L Lᵀ`.
#[derive(Debug, Clone)]
pub struct Cholesky {
    l: Matrix,
}

/// The matrix is not numerically positive definite.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("matrix is not positive definite (pivot {pivot} = {value:e})")]
pub struct NotPositiveDefinite {
    pub pivot: usize,
    pub value: f64,
}

impl Cholesky {
    /// Factorizes a symmetric matrix.
    ///
    /// A pivot fails when it is not greater than `relative_tolerance` times the
    /// matching diagonal entry of `a`, which catches exactly and nearly
    /// collinear columns alike.
    ///
    /// # Panics
    ///
    /// Panics if `a` is not square.
    pub fn decompose(a: &Matrix, relative_tolerance: f64) -> Result<Self, NotPositiveDefinite> {
        assert_eq!(a.rows, a.cols, "matrix must be square");
        let n = a.rows;
        let mut l = Matrix::zeros(n, n);
        for j in 0..n {
            let ajj = a.get(j, j);
            let d = ajj - (0..j).map(|k| l.get(j, k).powi(2)).sum::<f64>();
            let acceptable = ajj > 0.0 && d > relative_tolerance * ajj;
            if !acceptable {
                return Err(NotPositiveDefinite { pivot: j, value: d });
            }
            let ljj = d.sqrt();
            l.set(j, j, ljj);
            for i in (j + 1)..n {
                let s = a.get(i, j) - (0..j).map(|k| l.get(i, k) * l.get(j, k)).sum::<f64>();
                l.set(i, j, s / ljj);
            }
        }
        Ok(Self { l })
    }

    /// Solves `A x = b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` does not match the factorized dimension.
    #[must_use]
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.l.rows;
        assert_eq!(b.len(), n, "right-hand side has wrong length");
        // L y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let s: f64 = (0..i).map(|k| self.l.get(i, k) * y[k]).sum();
            y[i] = (b[i] - s) / self.l.get(i, i);
        }
        // Lᵀ x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let s: f64 = ((i + 1)..n).map(|k| self.l.get(k, i) * x[k]).sum();
            x[i] = (y[i] - s) / self.l.get(i, i);
        }
        x
    }

    /// `A⁻¹`, column by column.
    #[must_use]
    pub fn inverse(&self) -> Matrix {
        let n = self.l.rows;
        let mut inv = Matrix::zeros(n, n);
        let mut e = vec![0.0; n];
        for j in 0..n {
            e.fill(0.0);
            e[j] = 1.0;
            for (i, v) in self.solve(&e).into_iter().enumerate() {
                inv.set(i, j, v);
            }
        }
        inv
    }
}
