use std::{fmt, ops::Range};

/// Tolerance used when deciding whether a pivot is zero.
const EPSILON: f64 = 1e-10;

/// Errors raised by the matrix kernels.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// Operand shapes are incompatible for the named operation
    SizeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Operation needs a square matrix
    NotSquare { rows: usize, cols: usize },
    /// Matrix has no inverse
    Singular,
    /// Rows of different lengths, or data not matching the declared shape
    Malformed(String),
    /// A row/column range is outside the matrix
    OutOfRange(String),
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::SizeMismatch { op, left, right } => write!(
                f,
                "Matrix sizes don't match for {}: {}x{} and {}x{}",
                op, left.0, left.1, right.0, right.1
            ),
            MatrixError::NotSquare { rows, cols } => {
                write!(f, "Matrix must be square, got {}x{}", rows, cols)
            }
            MatrixError::Singular => write!(f, "Matrix is singular and has no inverse"),
            MatrixError::Malformed(msg) => write!(f, "Malformed matrix: {}", msg),
            MatrixError::OutOfRange(msg) => write!(f, "Range out of bounds: {}", msg),
        }
    }
}

impl std::error::Error for MatrixError {}

/// A dense, row-major matrix of numbers.
///
/// Every matrix has at least one row and one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, MatrixError> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::Malformed("matrix can't be empty".into()));
        }
        if data.len() != rows * cols {
            return Err(MatrixError::Malformed(format!(
                "expected {} values for a {}x{} matrix, got {}",
                rows * cols,
                rows,
                cols,
                data.len()
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix from nested rows; all rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != col_count) {
            return Err(MatrixError::Malformed(format!(
                "row {} has {} values, expected {}",
                i + 1,
                row.len(),
                col_count
            )));
        }
        Matrix::new(row_count, col_count, rows.into_iter().flatten().collect())
    }

    /// A 1x1 matrix holding `value`.
    pub fn scalar(value: f64) -> Self {
        Matrix {
            rows: 1,
            cols: 1,
            data: vec![value],
        }
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Result<Self, MatrixError> {
        Matrix::new(rows, cols, vec![value; rows * cols])
    }

    pub fn identity(size: usize) -> Result<Self, MatrixError> {
        let mut m = Matrix::filled(size, size, 0.0)?;
        for i in 0..size {
            m.data[i * size + i] = 1.0;
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// The single value of a 1x1 matrix.
    pub fn as_scalar(&self) -> Option<f64> {
        if self.rows == 1 && self.cols == 1 {
            self.data.first().copied()
        } else {
            None
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Combines two equally-shaped matrices element by element.
    pub fn zip_with(
        &self,
        other: &Matrix,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Matrix, MatrixError> {
        if self.shape() != other.shape() {
            return Err(MatrixError::SizeMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    pub fn matmul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != other.rows {
            return Err(MatrixError::SizeMismatch {
                op: "matrix multiplication",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut data = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..other.cols {
                    data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }
        Matrix::new(self.rows, other.cols, data)
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                data.push(self.data[i * self.cols + j]);
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    fn require_square(&self) -> Result<(), MatrixError> {
        if self.is_square() {
            Ok(())
        } else {
            Err(MatrixError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn trace(&self) -> Result<f64, MatrixError> {
        self.require_square()?;
        Ok((0..self.rows).map(|i| self.data[i * self.cols + i]).sum())
    }

    /// Determinant by Gaussian elimination with partial pivoting.
    pub fn determinant(&self) -> Result<f64, MatrixError> {
        self.require_square()?;
        let n = self.rows;
        let mut a = self.data.clone();
        let mut det = 1.0;

        for col in 0..n {
            let pivot = (col..n)
                .max_by(|&x, &y| a[x * n + col].abs().total_cmp(&a[y * n + col].abs()))
                .unwrap_or(col);
            if a[pivot * n + col].abs() < EPSILON {
                return Ok(0.0);
            }
            if pivot != col {
                swap_rows(&mut a, n, pivot, col);
                det = -det;
            }
            let p = a[col * n + col];
            det *= p;
            for row in col + 1..n {
                let factor = a[row * n + col] / p;
                for k in col..n {
                    a[row * n + k] -= factor * a[col * n + k];
                }
            }
        }
        Ok(det)
    }

    /// Inverse by Gauss-Jordan elimination.
    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        self.require_square()?;
        let n = self.rows;
        let mut a = self.data.clone();
        let mut inv = Matrix::identity(n)?.data;

        for col in 0..n {
            let pivot = (col..n)
                .max_by(|&x, &y| a[x * n + col].abs().total_cmp(&a[y * n + col].abs()))
                .unwrap_or(col);
            if a[pivot * n + col].abs() < EPSILON {
                return Err(MatrixError::Singular);
            }
            swap_rows(&mut a, n, pivot, col);
            swap_rows(&mut inv, n, pivot, col);

            let p = a[col * n + col];
            for k in 0..n {
                a[col * n + k] /= p;
                inv[col * n + k] /= p;
            }
            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[row * n + col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    a[row * n + k] -= factor * a[col * n + k];
                    inv[row * n + k] -= factor * inv[col * n + k];
                }
            }
        }
        Matrix::new(n, n, inv)
    }

    /// Rank from the row echelon form.
    pub fn rank(&self) -> usize {
        let (rows, cols) = self.shape();
        let mut a = self.data.clone();
        let mut rank = 0;

        for col in 0..cols {
            if rank == rows {
                break;
            }
            let pivot = (rank..rows)
                .max_by(|&x, &y| a[x * cols + col].abs().total_cmp(&a[y * cols + col].abs()))
                .unwrap_or(rank);
            if a[pivot * cols + col].abs() < EPSILON {
                continue;
            }
            swap_rows(&mut a, cols, pivot, rank);
            for row in rank + 1..rows {
                let factor = a[row * cols + col] / a[rank * cols + col];
                for k in col..cols {
                    a[row * cols + k] -= factor * a[rank * cols + k];
                }
            }
            rank += 1;
        }
        rank
    }

    /// Doolittle LU decomposition without pivoting: `self = L .* U`.
    pub fn lu(&self) -> Result<(Matrix, Matrix), MatrixError> {
        self.require_square()?;
        let n = self.rows;
        let mut l = Matrix::identity(n)?;
        let mut u = Matrix::filled(n, n, 0.0)?;

        for i in 0..n {
            for k in i..n {
                let sum: f64 = (0..i).map(|j| l.data[i * n + j] * u.data[j * n + k]).sum();
                u.data[i * n + k] = self.data[i * n + k] - sum;
            }
            if u.data[i * n + i].abs() < EPSILON {
                return Err(MatrixError::Malformed(
                    "LU decomposition needs non-zero leading pivots".into(),
                ));
            }
            for k in i + 1..n {
                let sum: f64 = (0..i).map(|j| l.data[k * n + j] * u.data[j * n + i]).sum();
                l.data[k * n + i] = (self.data[k * n + i] - sum) / u.data[i * n + i];
            }
        }
        Ok((l, u))
    }

    /// The matrix multiplied by itself `power` times; `power` 0 gives the identity.
    pub fn self_power(&self, power: u32) -> Result<Matrix, MatrixError> {
        self.require_square()?;
        // Square-and-multiply: O(log power) products.
        let mut result = Matrix::identity(self.rows)?;
        let mut base = self.clone();
        let mut remaining = power;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.matmul(&base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.matmul(&base)?;
            }
        }
        Ok(result)
    }
}

fn swap_rows(data: &mut [f64], width: usize, a: usize, b: usize) {
    if a == b {
        return;
    }
    for k in 0..width {
        data.swap(a * width + k, b * width + k);
    }
}

/// A matrix with labelled columns (a dataframe).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    data: Matrix,
}

impl Table {
    pub fn new(columns: Vec<String>, data: Matrix) -> Result<Self, MatrixError> {
        if columns.len() != data.cols() {
            return Err(MatrixError::Malformed(format!(
                "{} column names for {} columns",
                columns.len(),
                data.cols()
            )));
        }
        Ok(Table { columns, data })
    }

    /// Labels every column `col1`, `col2`, ...
    pub fn from_matrix(data: Matrix) -> Self {
        let columns = (1..=data.cols()).map(|i| format!("col{}", i)).collect();
        Table { columns, data }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Shared behaviour of everything that can be bound to a name.
pub trait Grid {
    fn as_matrix(&self) -> &Matrix;

    /// Copies the rows/columns in the given (half-open) ranges.
    fn sub_range(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Self, MatrixError>
    where
        Self: Sized;

    fn shape(&self) -> (usize, usize) {
        let m = self.as_matrix();
        (m.rows(), m.cols())
    }

    fn is_scalar(&self) -> bool {
        self.shape() == (1, 1)
    }
}

fn check_range(
    (rows, cols): (usize, usize),
    r: &Range<usize>,
    c: &Range<usize>,
) -> Result<(), MatrixError> {
    if r.start >= r.end || r.end > rows || c.start >= c.end || c.end > cols {
        return Err(MatrixError::OutOfRange(format!(
            "rows {}..{} and columns {}..{} of a {}x{} matrix",
            r.start, r.end, c.start, c.end, rows, cols
        )));
    }
    Ok(())
}

impl Grid for Matrix {
    fn as_matrix(&self) -> &Matrix {
        self
    }

    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn sub_range(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix, MatrixError> {
        check_range(self.shape(), &rows, &cols)?;
        let data = rows
            .clone()
            .flat_map(|i| cols.clone().map(move |j| (i, j)))
            .map(|(i, j)| self.data[i * self.cols + j])
            .collect();
        Matrix::new(rows.len(), cols.len(), data)
    }
}

impl Grid for Table {
    fn as_matrix(&self) -> &Matrix {
        &self.data
    }

    fn sub_range(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Table, MatrixError> {
        let data = self.data.sub_range(rows, cols.clone())?;
        Table::new(self.columns[cols].to_vec(), data)
    }
}

/// A value that can live in the binding store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Matrix(Matrix),
    Table(Table),
}

impl Value {
    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Human-readable category name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Matrix(_) => "matrix",
            Value::Table(_) => "table",
        }
    }

    /// Drops column labels; a table always degrades to its numbers.
    pub fn into_matrix(self) -> Matrix {
        match self {
            Value::Matrix(m) => m,
            Value::Table(t) => t.data,
        }
    }
}

impl Grid for Value {
    fn as_matrix(&self) -> &Matrix {
        match self {
            Value::Matrix(m) => m,
            Value::Table(t) => t.as_matrix(),
        }
    }

    fn sub_range(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Value, MatrixError> {
        match self {
            Value::Matrix(m) => m.sub_range(rows, cols).map(Value::Matrix),
            Value::Table(t) => t.sub_range(rows, cols).map(Value::Table),
        }
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}
