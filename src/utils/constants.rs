/// Separator of the values inside a raw spectrum string
pub const RAW_FIELD_DELIMITER: char = ',';

/// Time encoding of the L1 `time` coordinate
pub const TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";
pub const TIME_CALENDAR: &str = "proleptic_gregorian";

/// Name of the time column in L0 tables
pub const L0_TIME_COLUMN: &str = "time";

/// Accepted L0 time formats for CSV input
pub const L0_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// File extensions
pub const ZARR_EXTENSION: &str = "zarr";
pub const PARQUET_EXTENSION: &str = "parquet";
pub const CSV_EXTENSION: &str = "csv";

/// Zarr V3 node metadata document, present at the root of every store
pub const ZARR_METADATA_FILE: &str = "zarr.json";

/// Variable attribute listing the non-dimension coordinates of a data variable
pub const COORDINATES_ATTR: &str = "coordinates";

/// Compression defaults. Blosc accepts levels up to 9.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;
pub const MIN_COMPRESSION_LEVEL: i32 = 1;
pub const MAX_COMPRESSION_LEVEL: i32 = 9;

/// Parquet schema metadata keys
pub const META_SENSOR: &str = "disdro:sensor_name";
pub const META_ATTRS: &str = "disdro:attrs";
pub const META_COORDS: &str = "disdro:coordinates";
pub const META_DIMS: &str = "disdro:dims";
pub const META_CHUNKS: &str = "disdro:chunks";
