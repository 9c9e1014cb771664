use crate::error::{ConversionError, Result};
use crate::models::ArrayData;
use crate::processors::raw_field_parser::ParsedFieldArray;

/// Splits the flat values of a parsed raw field into `(time, trailing...)`.
pub struct MatrixReshaper;

impl MatrixReshaper {
    /// Reshape to `(n_observations, trailing_shape...)`.
    ///
    /// Fails when the element count does not match the target exactly; the
    /// error names the first row whose width differs from one observation.
    pub fn reshape(
        parsed: ParsedFieldArray,
        trailing_shape: &[usize],
        n_observations: usize,
    ) -> Result<ArrayData> {
        let mut shape = Vec::with_capacity(trailing_shape.len() + 1);
        shape.push(n_observations);
        shape.extend_from_slice(trailing_shape);

        let row_size: usize = trailing_shape.iter().product();
        let expected = n_observations * row_size;
        let field = parsed.field.name().to_string();

        let mismatch = |row: Option<usize>, cause: String| ConversionError::ShapeMismatch {
            field: field.clone(),
            shape: shape.clone(),
            n_observations,
            row,
            cause,
        };

        if parsed.n_rows() != n_observations {
            return Err(mismatch(
                None,
                format!(
                    "parsed {} rows for {} observations",
                    parsed.n_rows(),
                    n_observations
                ),
            ));
        }

        if parsed.len() != expected {
            let row = parsed.row_widths.iter().position(|w| *w != row_size);
            let cause = match row {
                Some(r) => format!(
                    "{} elements cannot fill {} (row {} has {} values, expected {})",
                    parsed.len(),
                    expected,
                    r,
                    parsed.row_widths[r],
                    row_size
                ),
                None => format!("{} elements cannot fill {}", parsed.len(), expected),
            };
            return Err(mismatch(row, cause));
        }

        parsed
            .data
            .into_shape(&shape)
            .map_err(|e| mismatch(None, e.to_string()))
    }

    /// Flatten `(time, trailing...)` back to one row per observation.
    pub fn flatten(data: ArrayData) -> Result<ArrayData> {
        let n_observations = data.shape().first().copied().unwrap_or(0);
        let row_size: usize = data.shape().iter().skip(1).product();
        data.into_shape(&[n_observations * row_size])
            .map_err(|e| ConversionError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dtype, RawField};
    use crate::processors::raw_field_parser::RawFieldParser;

    fn parsed(rows: &[String], n_bins: usize) -> ParsedFieldArray {
        RawFieldParser::new()
            .parse(rows, RawField::RawData, n_bins, Dtype::Int64)
            .unwrap()
    }

    fn counting_rows(n_rows: usize, width: usize) -> Vec<String> {
        (0..n_rows)
            .map(|r| {
                (0..width)
                    .map(|c| (r * width + c).to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect()
    }

    #[test]
    fn test_reshape_to_matrix() {
        let rows = counting_rows(3, 12);
        let data = MatrixReshaper::reshape(parsed(&rows, 12), &[3, 4], 3).unwrap();

        assert_eq!(data.shape(), &[3, 3, 4]);
        let arr = data.as_array::<i64>().unwrap();
        assert_eq!(arr[[0, 0, 0]], 0);
        assert_eq!(arr[[0, 1, 0]], 4);
        assert_eq!(arr[[2, 2, 3]], 35);
    }

    #[test]
    fn test_reshape_round_trips_with_flatten() {
        let rows = counting_rows(4, 6);
        let original = parsed(&rows, 6);
        let flat_values = original.data.to_f64_vec();

        let reshaped = MatrixReshaper::reshape(original, &[2, 3], 4).unwrap();
        let flattened = MatrixReshaper::flatten(reshaped).unwrap();

        assert_eq!(flattened.shape(), &[24]);
        assert_eq!(flattened.to_f64_vec(), flat_values);
    }

    #[test]
    fn test_short_row_is_reported() {
        let mut rows = counting_rows(3, 12);
        rows[1] = (0..10).map(|v| v.to_string()).collect::<Vec<_>>().join(",");

        let err = MatrixReshaper::reshape(parsed(&rows, 12), &[3, 4], 3).unwrap_err();
        match err {
            ConversionError::ShapeMismatch {
                field,
                shape,
                n_observations,
                row,
                ..
            } => {
                assert_eq!(field, "RawData");
                assert_eq!(shape, vec![3, 3, 4]);
                assert_eq!(n_observations, 3);
                assert_eq!(row, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_indivisible_element_count_never_truncates() {
        let rows = counting_rows(2, 5);
        let result = MatrixReshaper::reshape(parsed(&rows, 5), &[2, 2], 2);
        assert!(matches!(result, Err(ConversionError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_observation_count_must_match_rows() {
        let rows = counting_rows(2, 4);
        let result = MatrixReshaper::reshape(parsed(&rows, 4), &[2, 2], 3);
        assert!(matches!(
            result,
            Err(ConversionError::ShapeMismatch { row: None, .. })
        ));
    }

    #[test]
    fn test_one_dimensional_field() {
        let rows = counting_rows(2, 4);
        let data = MatrixReshaper::reshape(parsed(&rows, 4), &[4], 2).unwrap();
        assert_eq!(data.shape(), &[2, 4]);
    }
}
