use ndarray::Array1;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ConversionError, Result};
use crate::models::{ArrayData, Dtype, Element, RawField, RawObservationBatch, SensorProfile};
use crate::utils::constants::RAW_FIELD_DELIMITER;

/// Hook for instrument specific sentinel values (e.g. `-9.999`).
///
/// Runs on every parsed row of a field, before the values are narrowed to
/// the field dtype. Float fields see `f64` values and integer fields see
/// `i64` values.
pub trait FlagValueHandler: Send + Sync {
    fn apply_float(&self, _field: RawField, _values: &mut [f64]) {}

    fn apply_integer(&self, _field: RawField, _values: &mut [i64]) {}
}

impl<H: FlagValueHandler + ?Sized> FlagValueHandler for Arc<H> {
    fn apply_float(&self, field: RawField, values: &mut [f64]) {
        (**self).apply_float(field, values)
    }

    fn apply_integer(&self, field: RawField, values: &mut [i64]) {
        (**self).apply_integer(field, values)
    }
}

/// Leaves sentinel values untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepFlagValues;

impl FlagValueHandler for KeepFlagValues {}

/// Element types a raw token is read into. Tokens are parsed at full width,
/// handed to the flag handler, then narrowed.
trait RawValue: Element {
    type Wide: FromStr + Copy + fmt::Display + Send;

    fn apply_flags<H: FlagValueHandler + ?Sized>(handler: &H, field: RawField, values: &mut [Self::Wide]);
    fn narrow(value: Self::Wide) -> Option<Self>;
}

impl RawValue for f64 {
    type Wide = f64;

    fn apply_flags<H: FlagValueHandler + ?Sized>(handler: &H, field: RawField, values: &mut [f64]) {
        handler.apply_float(field, values)
    }

    fn narrow(value: f64) -> Option<Self> {
        Some(value)
    }
}

impl RawValue for f32 {
    type Wide = f64;

    fn apply_flags<H: FlagValueHandler + ?Sized>(handler: &H, field: RawField, values: &mut [f64]) {
        handler.apply_float(field, values)
    }

    fn narrow(value: f64) -> Option<Self> {
        Some(value as f32)
    }
}

impl RawValue for i64 {
    type Wide = i64;

    fn apply_flags<H: FlagValueHandler + ?Sized>(handler: &H, field: RawField, values: &mut [i64]) {
        handler.apply_integer(field, values)
    }

    fn narrow(value: i64) -> Option<Self> {
        Some(value)
    }
}

impl RawValue for i32 {
    type Wide = i64;

    fn apply_flags<H: FlagValueHandler + ?Sized>(handler: &H, field: RawField, values: &mut [i64]) {
        handler.apply_integer(field, values)
    }

    fn narrow(value: i64) -> Option<Self> {
        i32::try_from(value).ok()
    }
}

/// Values of one raw column, flattened row after row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFieldArray {
    pub field: RawField,
    /// One dimensional, `sum(row_widths)` elements.
    pub data: ArrayData,
    /// Number of tokens kept for every row.
    pub row_widths: Vec<usize>,
}

impl ParsedFieldArray {
    pub fn n_rows(&self) -> usize {
        self.row_widths.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub struct RawFieldParser<H: FlagValueHandler = KeepFlagValues> {
    flag_handler: H,
}

impl RawFieldParser<KeepFlagValues> {
    pub fn new() -> Self {
        Self {
            flag_handler: KeepFlagValues,
        }
    }
}

impl Default for RawFieldParser<KeepFlagValues> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: FlagValueHandler> RawFieldParser<H> {
    pub fn with_flag_handler(flag_handler: H) -> Self {
        Self { flag_handler }
    }

    /// Parse one raw column into a flat array of `dtype`.
    ///
    /// Each row keeps at most `expected_bin_count` tokens. A trailing
    /// delimiter does not count as a token. Short rows are kept short.
    pub fn parse(
        &self,
        column: &[String],
        field: RawField,
        expected_bin_count: usize,
        dtype: Dtype,
    ) -> Result<ParsedFieldArray> {
        let (data, row_widths) = match dtype {
            Dtype::Float32 => self.parse_rows::<f32>(column, field, expected_bin_count)?,
            Dtype::Float64 => self.parse_rows::<f64>(column, field, expected_bin_count)?,
            Dtype::Int32 => self.parse_rows::<i32>(column, field, expected_bin_count)?,
            Dtype::Int64 => self.parse_rows::<i64>(column, field, expected_bin_count)?,
        };

        debug!(
            field = %field,
            rows = row_widths.len(),
            values = data.len(),
            "parsed raw field"
        );

        Ok(ParsedFieldArray {
            field,
            data,
            row_widths,
        })
    }

    fn parse_rows<T: RawValue>(
        &self,
        column: &[String],
        field: RawField,
        expected_bin_count: usize,
    ) -> Result<(ArrayData, Vec<usize>)> {
        let rows: Vec<Vec<T>> = column
            .par_iter()
            .enumerate()
            .map(|(row, raw)| {
                let mut values = split_row(raw, expected_bin_count)
                    .into_iter()
                    .map(|token| {
                        token
                            .parse::<T::Wide>()
                            .map_err(|_| invalid_value(field, row, token, T::DTYPE))
                    })
                    .collect::<Result<Vec<T::Wide>>>()?;

                T::apply_flags(&self.flag_handler, field, &mut values);

                values
                    .into_iter()
                    .map(|v| T::narrow(v).ok_or_else(|| invalid_value(field, row, &v.to_string(), T::DTYPE)))
                    .collect()
            })
            .collect::<Result<_>>()?;

        let row_widths: Vec<usize> = rows.iter().map(|r| r.len()).collect();
        let values: Vec<T> = rows.into_iter().flatten().collect();
        Ok((T::wrap(Array1::from(values).into_dyn()), row_widths))
    }
}

/// Tokens of one raw row: a trailing delimiter is dropped and at most
/// `expected_bin_count` tokens are kept.
fn split_row(raw: &str, expected_bin_count: usize) -> Vec<&str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut tokens: Vec<&str> = raw.split(RAW_FIELD_DELIMITER).map(str::trim).collect();
    if tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens.truncate(expected_bin_count);
    tokens
}

fn invalid_value(field: RawField, row: usize, token: &str, dtype: Dtype) -> ConversionError {
    ConversionError::InvalidRawValue {
        field: field.name().to_string(),
        row,
        token: token.to_string(),
        dtype: dtype.name().to_string(),
    }
}

/// Fail with every raw column of `profile` that `batch` lacks.
pub fn check_raw_fields_available(
    batch: &RawObservationBatch,
    profile: &SensorProfile,
) -> Result<()> {
    let missing: Vec<String> = profile
        .raw_fields
        .iter()
        .map(|spec| spec.field.name())
        .filter(|name| batch.raw_column(name).is_none())
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConversionError::MissingRawField {
            sensor: profile.sensor.to_string(),
            fields: missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::ott_parsivel_profile;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn column(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_parse_exact_token_count() {
        let parser = RawFieldParser::new();
        let parsed = parser
            .parse(
                &column(&["0.1,0.2,0.3", "1.5,2.5,3.5"]),
                RawField::FieldN,
                3,
                Dtype::Float64,
            )
            .unwrap();

        assert_eq!(parsed.row_widths, vec![3, 3]);
        assert_eq!(parsed.data.to_f64_vec(), vec![0.1, 0.2, 0.3, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_trailing_delimiter_is_dropped() {
        let parser = RawFieldParser::new();
        let parsed = parser
            .parse(&column(&["000,001,002,"]), RawField::RawData, 3, Dtype::Int64)
            .unwrap();

        assert_eq!(parsed.data.dtype(), Dtype::Int64);
        assert_eq!(parsed.data.to_f64_vec(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_rows_are_truncated_to_bin_count() {
        let parser = RawFieldParser::new();
        let parsed = parser
            .parse(&column(&["1,2,3,4,5"]), RawField::FieldV, 3, Dtype::Float32)
            .unwrap();

        assert_eq!(parsed.row_widths, vec![3]);
        assert_eq!(parsed.data.to_f64_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_short_rows_stay_short() {
        let parser = RawFieldParser::new();
        let parsed = parser
            .parse(&column(&["1,2,3", "1,2", ""]), RawField::FieldN, 3, Dtype::Float32)
            .unwrap();

        assert_eq!(parsed.row_widths, vec![3, 2, 0]);
        assert_eq!(parsed.len(), 5);
    }

    #[test]
    fn test_integer_field_rejects_fractional_token() {
        let parser = RawFieldParser::new();
        let err = parser
            .parse(&column(&["1,2", "3,4.5"]), RawField::RawData, 2, Dtype::Int64)
            .unwrap_err();

        match err {
            ConversionError::InvalidRawValue { field, row, token, .. } => {
                assert_eq!(field, "RawData");
                assert_eq!(row, 1);
                assert_eq!(token, "4.5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_flag_handler_runs_before_cast() {
        struct NegativeToZero;
        impl FlagValueHandler for NegativeToZero {
            fn apply_float(&self, _field: RawField, values: &mut [f64]) {
                for v in values.iter_mut().filter(|v| **v < 0.0) {
                    *v = 0.0;
                }
            }
        }

        let parser = RawFieldParser::with_flag_handler(NegativeToZero);
        let parsed = parser
            .parse(&column(&["-9.999,1.0"]), RawField::FieldN, 2, Dtype::Float32)
            .unwrap();

        assert_eq!(parsed.data.to_f64_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_large_integer_tokens_keep_precision() {
        let parser = RawFieldParser::new();
        let parsed = parser
            .parse(
                &column(&["9007199254740993,-9007199254740995"]),
                RawField::RawData,
                2,
                Dtype::Int64,
            )
            .unwrap();

        let values = parsed.data.as_array::<i64>().unwrap();
        assert_eq!(values[[0]], 9007199254740993);
        assert_eq!(values[[1]], -9007199254740995);
    }

    #[test]
    fn test_int32_field_rejects_out_of_range_token() {
        let parser = RawFieldParser::new();
        let err = parser
            .parse(&column(&["1", "4294967296"]), RawField::RawData, 1, Dtype::Int32)
            .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::InvalidRawValue { row: 1, ref dtype, .. } if dtype == "int32"
        ));
    }

    #[test]
    fn test_integer_flag_handler_sees_exact_counts() {
        struct CapCounts;
        impl FlagValueHandler for CapCounts {
            fn apply_integer(&self, _field: RawField, values: &mut [i64]) {
                for v in values.iter_mut().filter(|v| **v > 999) {
                    *v = 999;
                }
            }
        }

        let parser = RawFieldParser::with_flag_handler(CapCounts);
        let parsed = parser
            .parse(&column(&["12,9007199254740993"]), RawField::RawData, 2, Dtype::Int64)
            .unwrap();

        assert_eq!(parsed.data.as_array::<i64>().unwrap().as_slice().unwrap(), &[12, 999]);
    }

    #[test]
    fn test_missing_raw_fields_are_listed_together() {
        let time = vec![NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()];
        let batch = RawObservationBatch::builder(time)
            .raw_column("FieldV", vec!["0".to_string()])
            .build()
            .unwrap();

        let err = check_raw_fields_available(&batch, &ott_parsivel_profile()).unwrap_err();
        match err {
            ConversionError::MissingRawField { sensor, fields } => {
                assert_eq!(sensor, "OTT_Parsivel");
                assert_eq!(fields, vec!["FieldN".to_string(), "RawData".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
