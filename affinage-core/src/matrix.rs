//! Dense distance matrix ingestion.
//!
//! The matrix is read row by row from whitespace-separated text. Row `r`
//! becomes node `r` downstream, so any row that cannot be parsed fails the
//! whole read instead of being skipped.

use std::io::BufRead;

use crate::error::MatrixError;

/// A square matrix of pairwise distances stored row-major.
///
/// Only the strict lower triangle is validated, since it is the only part
/// the graph builder reads. The diagonal and upper triangle must still be
/// numbers but may hold any value.
///
/// # Examples
/// ```
/// use affinage_core::DistanceMatrix;
///
/// let matrix = DistanceMatrix::from_reader("0 2\n2 0\n".as_bytes())?;
/// assert_eq!(matrix.len(), 2);
/// assert_eq!(matrix.distance(1, 0), Some(2.0));
/// # Ok::<(), affinage_core::MatrixError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Parses a matrix from `reader`, one row per non-blank line.
    ///
    /// # Errors
    /// Returns [`MatrixError::InvalidToken`] for non-numeric tokens,
    /// [`MatrixError::InvalidDistance`] for NaN or negative values below the
    /// diagonal,
    /// [`MatrixError::RowLength`] when a row does not hold exactly one value
    /// per row of the matrix, and [`MatrixError::Io`] when reading fails.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, MatrixError> {
        let mut rows = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = rows.len();
            rows.push(parse_row(row, &line)?);
        }
        Self::from_rows(rows)
    }

    /// Builds a matrix from in-memory rows, applying the same validation as
    /// [`Self::from_reader`].
    ///
    /// # Errors
    /// Returns [`MatrixError::RowLength`] when the rows are not square and
    /// [`MatrixError::InvalidDistance`] for NaN or negative values below the
    /// diagonal.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size.saturating_mul(size));
        for (row, entries) in rows.into_iter().enumerate() {
            if entries.len() != size {
                return Err(MatrixError::RowLength {
                    row,
                    expected: size,
                    actual: entries.len(),
                });
            }
            for (column, value) in entries.iter().copied().enumerate().take(row) {
                validate_distance(row, column, value)?;
            }
            values.extend(entries);
        }
        Ok(Self { size, values })
    }

    /// Number of rows, which is also the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` when the matrix has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Distance stored at `(row, column)`, or `None` when out of bounds.
    #[must_use]
    pub fn distance(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.size || column >= self.size {
            return None;
        }
        self.values.get(row * self.size + column).copied()
    }

    /// Iterates the strict lower triangle as `(row, column, distance)` with
    /// `column < row`, row-major.
    pub(crate) fn lower_triangle(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.values
            .chunks_exact(self.size.max(1))
            .enumerate()
            .flat_map(|(row, entries)| {
                entries
                    .iter()
                    .take(row)
                    .copied()
                    .enumerate()
                    .map(move |(column, value)| (row, column, value))
            })
    }
}

fn parse_row(row: usize, line: &str) -> Result<Vec<f64>, MatrixError> {
    line.split_whitespace()
        .enumerate()
        .map(|(column, token)| {
            token
                .parse::<f64>()
                .map_err(|_| MatrixError::InvalidToken {
                    row,
                    column,
                    token: token.to_owned(),
                })
        })
        .collect()
}

fn validate_distance(row: usize, column: usize, value: f64) -> Result<(), MatrixError> {
    // +inf is a legal "unreachable" distance; it never passes a threshold.
    if value.is_nan() || value < 0.0 {
        return Err(MatrixError::InvalidDistance { row, column, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn parses_rows_in_order() {
        let matrix = DistanceMatrix::from_reader("0 1 4\n1 0 2\n4 2 0\n".as_bytes())
            .expect("matrix must parse");
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.distance(2, 0), Some(4.0));
        assert_eq!(matrix.distance(2, 1), Some(2.0));
        assert_eq!(matrix.distance(3, 0), None);
    }

    #[test]
    fn ignores_blank_lines_and_extra_whitespace() {
        let matrix = DistanceMatrix::from_reader("\n  0\t3 \n\n3   0\n\n".as_bytes())
            .expect("matrix must parse");
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.distance(1, 0), Some(3.0));
    }

    #[test]
    fn empty_input_yields_empty_matrix() {
        let matrix = DistanceMatrix::from_reader("".as_bytes()).expect("empty input is valid");
        assert!(matrix.is_empty());
        assert_eq!(matrix.lower_triangle().count(), 0);
    }

    #[test]
    fn lower_triangle_skips_diagonal_and_upper_half() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0],
            vec![2.0, 3.0, 0.0],
        ])
        .expect("matrix is square");
        let cells: Vec<_> = matrix.lower_triangle().collect();
        assert_eq!(cells, vec![(1, 0, 1.0), (2, 0, 2.0), (2, 1, 3.0)]);
    }

    #[test]
    fn rejects_non_numeric_tokens_with_position() {
        let err = DistanceMatrix::from_reader("0 1\n1 x\n".as_bytes())
            .expect_err("non-numeric token must fail");
        match err {
            MatrixError::InvalidToken { row, column, token } => {
                assert_eq!((row, column), (1, 1));
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[case::short_row("0 1\n1\n", 1, 1)]
    #[case::long_row("0 1 2\n1 0\n", 0, 3)]
    fn rejects_rows_of_the_wrong_length(
        #[case] input: &str,
        #[case] bad_row: usize,
        #[case] bad_len: usize,
    ) {
        let err = DistanceMatrix::from_reader(input.as_bytes()).expect_err("ragged rows must fail");
        assert!(matches!(
            err,
            MatrixError::RowLength { row, actual, expected: 2 } if row == bad_row && actual == bad_len
        ));
    }

    #[rstest]
    #[case::negative("0 -1\n-1 0\n")]
    #[case::nan("0 NaN\nNaN 0\n")]
    fn rejects_invalid_distances(#[case] input: &str) {
        let err = DistanceMatrix::from_reader(input.as_bytes())
            .expect_err("invalid distances must fail");
        assert!(matches!(err, MatrixError::InvalidDistance { row: 1, column: 0, .. }));
    }

    #[test]
    fn ignores_values_on_and_above_the_diagonal() {
        let matrix = DistanceMatrix::from_reader("NaN 1
1 -3
".as_bytes())
            .expect("only the lower triangle is validated");
        assert_eq!(matrix.distance(1, 0), Some(1.0));
        let triangle: Vec<_> = matrix.lower_triangle().collect();
        assert_eq!(triangle, vec![(1, 0, 1.0)]);
    }

    #[test]
    fn accepts_infinite_distances() {
        let matrix =
            DistanceMatrix::from_reader("0 inf\ninf 0\n".as_bytes()).expect("inf is legal");
        assert_eq!(matrix.distance(1, 0), Some(f64::INFINITY));
    }
}
