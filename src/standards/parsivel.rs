use crate::models::{BinTable, Dtype, RawField, RawFieldSpec, SensorName, SensorProfile};

/// Number of diameter and velocity classes of the OTT Parsivel.
pub const PARSIVEL_N_CLASSES: usize = 32;

/// Rows per chunk along `time`.
pub const PARSIVEL_TIME_CHUNK: usize = 5000;

/// Diameter class centers in mm, as published by OTT.
pub const PARSIVEL_DIAMETER_CENTER: [f64; 32] = [
    0.062, 0.187, 0.312, 0.437, 0.562, 0.687, 0.812, 0.937, 1.062, 1.187, //
    1.375, 1.625, 1.875, 2.125, 2.375, //
    2.750, 3.250, 3.750, 4.250, 4.750, //
    5.500, 6.500, 7.500, 8.500, 9.500, //
    11.000, 13.000, 15.000, 17.000, 19.000, //
    21.500, 24.500,
];

/// Diameter class widths in mm.
pub const PARSIVEL_DIAMETER_WIDTH: [f64; 32] = [
    0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, //
    0.250, 0.250, 0.250, 0.250, 0.250, //
    0.500, 0.500, 0.500, 0.500, 0.500, //
    1.000, 1.000, 1.000, 1.000, 1.000, //
    2.000, 2.000, 2.000, 2.000, 2.000, //
    3.000, 3.000,
];

/// Velocity class centers in m/s.
pub const PARSIVEL_VELOCITY_CENTER: [f64; 32] = [
    0.050, 0.150, 0.250, 0.350, 0.450, 0.550, 0.650, 0.750, 0.850, 0.950, //
    1.100, 1.300, 1.500, 1.700, 1.900, //
    2.200, 2.600, 3.000, 3.400, 3.800, //
    4.400, 5.200, 6.000, 6.800, 7.600, //
    8.800, 10.400, 12.000, 13.600, 15.200, //
    17.600, 20.800,
];

/// Velocity class widths in m/s.
pub const PARSIVEL_VELOCITY_WIDTH: [f64; 32] = [
    0.100, 0.100, 0.100, 0.100, 0.100, 0.100, 0.100, 0.100, 0.100, 0.100, //
    0.200, 0.200, 0.200, 0.200, 0.200, //
    0.400, 0.400, 0.400, 0.400, 0.400, //
    0.800, 0.800, 0.800, 0.800, 0.800, //
    1.600, 1.600, 1.600, 1.600, 1.600, //
    3.200, 3.200,
];

pub fn ott_parsivel_profile() -> SensorProfile {
    let n = PARSIVEL_N_CLASSES;

    SensorProfile {
        sensor: SensorName::OttParsivel,
        raw_fields: vec![
            RawFieldSpec {
                field: RawField::FieldN,
                n_bins: n,
                dtype: Dtype::Float32,
                chunks: vec![PARSIVEL_TIME_CHUNK, n],
            },
            RawFieldSpec {
                field: RawField::FieldV,
                n_bins: n,
                dtype: Dtype::Float32,
                chunks: vec![PARSIVEL_TIME_CHUNK, n],
            },
            RawFieldSpec {
                field: RawField::RawData,
                n_bins: n * n,
                dtype: Dtype::Int64,
                chunks: vec![PARSIVEL_TIME_CHUNK, n, n],
            },
        ],
        diameter_bins: BinTable::from_centers_and_widths(
            &PARSIVEL_DIAMETER_CENTER,
            &PARSIVEL_DIAMETER_WIDTH,
        ),
        velocity_bins: BinTable::from_centers_and_widths(
            &PARSIVEL_VELOCITY_CENTER,
            &PARSIVEL_VELOCITY_WIDTH,
        ),
        time_chunk: PARSIVEL_TIME_CHUNK,
    }
}
