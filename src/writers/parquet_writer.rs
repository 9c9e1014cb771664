use crate::error::{ConversionError, Result};
use crate::models::{ArrayData, Dimension, Dtype, SensorName};
use crate::utils::constants::{META_ATTRS, META_CHUNKS, META_COORDS, META_DIMS, META_SENSOR};
use crate::models::Element;
use crate::utils::constants::COORDINATES_ATTR;
use crate::writers::chunking::{coordinates_attr, AlignedVariable};
use crate::writers::encoding_planner::EncodingProfile;
use arrow::array::*;
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Field, Float32Type, Float64Type, Int32Type, Int64Type, Schema, TimeUnit,
};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::schema::types::ColumnPath;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const FIELD_DIMENSIONS: &str = "dimensions";
const FIELD_TRAILING_SHAPE: &str = "trailing_shape";
const FIELD_ATTRS: &str = "attrs";

/// Writes a dataset as a single Parquet file, one row per time step.
///
/// Variables over `time` become columns, raw spectra as fixed size lists.
/// Coordinates without a time axis go to the schema metadata.
pub struct ParquetWriter {
    compression_level: i32,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new(compression_level: i32, row_group_size: usize) -> Self {
        Self {
            compression_level,
            row_group_size: row_group_size.max(1),
        }
    }

    pub fn from_encoding(encoding: &EncodingProfile) -> Self {
        Self::new(encoding.compression_level, encoding.time_chunk)
    }

    /// Write the aligned variables to `path`. An existing regular file is
    /// replaced; a failed write leaves no file behind.
    pub fn write_dataset(
        &self,
        sensor: SensorName,
        variables: &[AlignedVariable],
        global_attrs: &Map<String, Value>,
        path: &Path,
    ) -> Result<()> {
        if path.exists() {
            if !path.is_file() {
                return Err(ConversionError::destination(
                    path,
                    format!("{} exists and is not a parquet file", path.display()),
                ));
            }
            info!(path = %path.display(), "replacing existing parquet file");
            fs::remove_file(path).map_err(|e| ConversionError::destination(path, e))?;
        }

        let result = self.write_file(sensor, variables, global_attrs, path);
        if result.is_err() && path.is_file() {
            debug!(path = %path.display(), "removing partial parquet file");
            let _ = fs::remove_file(path);
        }
        result
    }

    fn write_file(
        &self,
        sensor: SensorName,
        variables: &[AlignedVariable],
        global_attrs: &Map<String, Value>,
        path: &Path,
    ) -> Result<()> {
        let file = File::create(path).map_err(|e| ConversionError::destination(path, e))?;
        self.write_to(file, path, sensor, variables, global_attrs)
    }

    /// Encode the variables into `sink`. Failures of the sink are reported
    /// as `DestinationWrite` on `destination`.
    fn write_to<W: Write + Send>(
        &self,
        sink: W,
        destination: &Path,
        sensor: SensorName,
        variables: &[AlignedVariable],
        global_attrs: &Map<String, Value>,
    ) -> Result<()> {
        let (columns, coords): (Vec<&AlignedVariable>, Vec<&AlignedVariable>) = variables
            .iter()
            .partition(|v| v.dims.first() == Some(&Dimension::Time));

        let n_time = columns.first().map(|v| v.shape()[0]).unwrap_or(0);
        let schema = self.create_schema(sensor, variables, &columns, &coords, global_attrs, n_time)?;
        let batch = self.variables_to_batch(&columns, schema.clone())?;

        let mut props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::try_new(self.compression_level)?))
            .set_max_row_group_size(self.row_group_size);
        // BYTE_STREAM_SPLIT is the Parquet byte shuffle, for floats and integers alike
        for column in columns.iter().filter(|v| v.encoding.shuffle) {
            let column_path = leaf_path(column);
            props = props
                .set_column_dictionary_enabled(column_path.clone(), false)
                .set_column_encoding(column_path, Encoding::BYTE_STREAM_SPLIT);
        }

        let sink_err = |e: parquet::errors::ParquetError| ConversionError::destination(destination, e);
        let mut writer = ArrowWriter::try_new(sink, schema, Some(props.build())).map_err(sink_err)?;

        // One row group per time chunk
        let mut start = 0;
        while start < n_time {
            let len = self.row_group_size.min(n_time - start);
            writer.write(&batch.slice(start, len)).map_err(sink_err)?;
            writer.flush().map_err(sink_err)?;
            start += len;
        }

        writer.close().map_err(sink_err)?;
        info!(
            path = %destination.display(),
            rows = n_time,
            columns = columns.len(),
            "parquet file written"
        );
        Ok(())
    }

    fn create_schema(
        &self,
        sensor: SensorName,
        variables: &[AlignedVariable],
        columns: &[&AlignedVariable],
        coords: &[&AlignedVariable],
        global_attrs: &Map<String, Value>,
        n_time: usize,
    ) -> Result<Arc<Schema>> {
        let fields = columns
            .iter()
            .map(|v| -> Result<Field> {
                let trailing = &v.shape()[1..];
                let mut attrs = v.attrs.clone();
                if let Some(coordinates) = coordinates_attr(v, variables) {
                    attrs.insert(COORDINATES_ATTR.to_string(), json!(coordinates));
                }
                let metadata = HashMap::from([
                    (
                        FIELD_DIMENSIONS.to_string(),
                        serde_json::to_string(&v.dims.iter().map(|d| d.name()).collect::<Vec<_>>())?,
                    ),
                    (FIELD_TRAILING_SHAPE.to_string(), serde_json::to_string(trailing)?),
                    (FIELD_ATTRS.to_string(), serde_json::to_string(&attrs)?),
                ]);
                Ok(Field::new(&v.name, column_type(v), false).with_metadata(metadata))
            })
            .collect::<Result<Vec<_>>>()?;

        let coordinates: Map<String, Value> = coords
            .iter()
            .map(|v| {
                (
                    v.name.clone(),
                    json!({
                        "dims": v.dims.iter().map(|d| d.name()).collect::<Vec<_>>(),
                        "values": v.data.to_f64_vec(),
                        "attrs": v.attrs,
                    }),
                )
            })
            .collect();

        let mut dims = Map::new();
        dims.insert(Dimension::Time.name().to_string(), json!(n_time));
        for v in variables {
            for (dim, len) in v.dims.iter().zip(v.shape()) {
                dims.entry(dim.name().to_string()).or_insert(json!(len));
            }
        }

        let chunks: Map<String, Value> = variables
            .iter()
            .map(|v| (v.name.clone(), json!(v.encoding.chunks)))
            .collect();

        let metadata = HashMap::from([
            (META_SENSOR.to_string(), sensor.to_string()),
            (META_ATTRS.to_string(), serde_json::to_string(global_attrs)?),
            (META_COORDS.to_string(), serde_json::to_string(&coordinates)?),
            (META_DIMS.to_string(), serde_json::to_string(&dims)?),
            (META_CHUNKS.to_string(), serde_json::to_string(&chunks)?),
        ]);

        Ok(Arc::new(Schema::new_with_metadata(fields, metadata)))
    }

    fn variables_to_batch(&self, columns: &[&AlignedVariable], schema: Arc<Schema>) -> Result<RecordBatch> {
        let arrays = columns
            .iter()
            .map(|v| column_array(v))
            .collect::<Result<Vec<ArrayRef>>>()?;

        if arrays.is_empty() {
            return Ok(RecordBatch::new_empty(schema));
        }
        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            Compression::ZSTD(ZstdLevel::try_new(self.compression_level)?)
        };

        let layout = Self::read_layout(path)?;

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            sensor: layout.sensor,
            chunks: layout.chunks,
        })
    }

    /// Dataset layout recorded in the schema metadata.
    pub fn read_layout(path: &Path) -> Result<ParquetLayout> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let metadata = builder.schema().metadata();

        let parse = |key: &str| -> Result<Value> {
            metadata
                .get(key)
                .map(|text| serde_json::from_str(text))
                .transpose()?
                .ok_or_else(|| ConversionError::InvalidFormat(format!("parquet metadata has no {}", key)))
        };

        let chunks = serde_json::from_value(parse(META_CHUNKS)?)?;
        let dims = serde_json::from_value(parse(META_DIMS)?)?;
        let attrs = match parse(META_ATTRS)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let coordinates = match parse(META_COORDS)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Ok(ParquetLayout {
            sensor: metadata.get(META_SENSOR).cloned(),
            dims,
            chunks,
            attrs,
            coordinates,
        })
    }

    /// Read one time-indexed variable back with its full shape.
    pub fn read_variable(path: &Path, name: &str) -> Result<ArrayData> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let field = schema
            .field_with_name(name)
            .map_err(|_| ConversionError::InvalidFormat(format!("no column {} in {}", name, path.display())))?;

        let trailing: Vec<usize> = field
            .metadata()
            .get(FIELD_TRAILING_SHAPE)
            .map(|text| serde_json::from_str(text))
            .transpose()?
            .unwrap_or_default();
        let dtype = match field.data_type() {
            DataType::FixedSizeList(item, _) => dtype_of(item.data_type())?,
            other => dtype_of(other)?,
        };
        let index = schema.index_of(name)?;

        let mut flats: Vec<ArrayRef> = Vec::new();
        let mut n_rows = 0;
        for batch in builder.build()? {
            let batch = batch?;
            n_rows += batch.num_rows();
            let column = batch.column(index);
            flats.push(match column.as_any().downcast_ref::<FixedSizeListArray>() {
                Some(list) => list.values().clone(),
                None => column.clone(),
            });
        }

        let flat = if flats.is_empty() {
            new_empty_array(&primitive_type(dtype))
        } else {
            arrow::compute::concat(&flats.iter().map(|a| a.as_ref()).collect::<Vec<_>>())?
        };

        let mut shape = vec![n_rows];
        shape.extend(trailing);
        match dtype {
            Dtype::Float32 => typed_values::<Float32Type>(&flat, &shape),
            Dtype::Float64 => typed_values::<Float64Type>(&flat, &shape),
            Dtype::Int32 => typed_values::<Int32Type>(&flat, &shape),
            Dtype::Int64 => typed_values::<Int64Type>(&flat, &shape),
        }
    }
}

/// Cast a flat column to `T` and shape it, without widening through `f64`.
fn typed_values<T>(flat: &ArrayRef, shape: &[usize]) -> Result<ArrayData>
where
    T: ArrowPrimitiveType,
    T::Native: Element,
{
    let cast = arrow::compute::cast(flat, &T::DATA_TYPE)?;
    let values = cast
        .as_primitive_opt::<T>()
        .ok_or_else(|| ConversionError::InvalidFormat("column is not numeric".to_string()))?
        .values()
        .to_vec();
    ArrayData::from_shape_vec(shape, values).map_err(|e| ConversionError::InvalidFormat(e.to_string()))
}

fn leaf_path(variable: &AlignedVariable) -> ColumnPath {
    if variable.dims.len() > 1 {
        ColumnPath::new(vec![variable.name.clone(), "list".to_string(), "item".to_string()])
    } else {
        ColumnPath::new(vec![variable.name.clone()])
    }
}

fn primitive_type(dtype: Dtype) -> DataType {
    match dtype {
        Dtype::Float32 => DataType::Float32,
        Dtype::Float64 => DataType::Float64,
        Dtype::Int32 => DataType::Int32,
        Dtype::Int64 => DataType::Int64,
    }
}

fn dtype_of(data_type: &DataType) -> Result<Dtype> {
    match data_type {
        DataType::Float32 => Ok(Dtype::Float32),
        DataType::Float64 => Ok(Dtype::Float64),
        DataType::Int32 => Ok(Dtype::Int32),
        DataType::Int64 | DataType::Timestamp(TimeUnit::Second, _) => Ok(Dtype::Int64),
        other => Err(ConversionError::InvalidFormat(format!(
            "unsupported parquet column type {}",
            other
        ))),
    }
}

fn column_type(variable: &AlignedVariable) -> DataType {
    if variable.name == Dimension::Time.name() {
        return DataType::Timestamp(TimeUnit::Second, None);
    }

    let primitive = primitive_type(variable.encoding.dtype);
    if variable.dims.len() > 1 {
        let size: usize = variable.shape()[1..].iter().product();
        DataType::FixedSizeList(Arc::new(Field::new("item", primitive, true)), size as i32)
    } else {
        primitive
    }
}

fn column_array(variable: &AlignedVariable) -> Result<ArrayRef> {
    let values: ArrayRef = match variable.data.as_ref() {
        ArrayData::Int64(arr) if variable.name == Dimension::Time.name() => {
            Arc::new(TimestampSecondArray::from(arr.iter().copied().collect::<Vec<_>>()))
        }
        ArrayData::Float32(arr) => Arc::new(Float32Array::from(arr.iter().copied().collect::<Vec<_>>())),
        ArrayData::Float64(arr) => Arc::new(Float64Array::from(arr.iter().copied().collect::<Vec<_>>())),
        ArrayData::Int32(arr) => Arc::new(Int32Array::from(arr.iter().copied().collect::<Vec<_>>())),
        ArrayData::Int64(arr) => Arc::new(Int64Array::from(arr.iter().copied().collect::<Vec<_>>())),
    };

    if variable.dims.len() == 1 {
        return Ok(values);
    }

    let size: usize = variable.shape()[1..].iter().product();
    let item = Arc::new(Field::new("item", values.data_type().clone(), true));
    Ok(Arc::new(FixedSizeListArray::try_new(item, size as i32, values, None)?))
}

/// Layout metadata of a written L1 Parquet file.
#[derive(Debug, Clone)]
pub struct ParquetLayout {
    pub sensor: Option<String>,
    pub dims: BTreeMap<String, usize>,
    pub chunks: BTreeMap<String, Vec<usize>>,
    pub attrs: Map<String, Value>,
    pub coordinates: Map<String, Value>,
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub sensor: Option<String>,
    pub chunks: BTreeMap<String, Vec<usize>>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        let mut summary = format!(
            "Parquet File Summary:\n\
            - Sensor: {}\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}\n",
            self.sensor.as_deref().unwrap_or("unknown"),
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        );
        for (name, chunks) in &self.chunks {
            summary.push_str(&format!("  {:<22} chunks {:?}\n", name, chunks));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::encoding_planner::{Codec, FillValuePolicy, VariableEncoding};
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use std::io;
    use tempfile::TempDir;

    fn aligned(name: &str, data: ArrayData, chunks: Vec<usize>, dims: Vec<Dimension>) -> AlignedVariable {
        let dtype = data.dtype();
        AlignedVariable {
            name: name.to_string(),
            is_coord: dims.first() != Some(&Dimension::Time),
            dims,
            data: Arc::new(data),
            encoding: VariableEncoding {
                dtype,
                chunks,
                codec: Codec::Blosc { level: 3 },
                shuffle: true,
                fill_value: FillValuePolicy::for_dtype(dtype),
            },
            attrs: Map::new(),
        }
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingSink {
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample_variables(n_time: usize) -> Vec<AlignedVariable> {
        let time: Vec<i64> = (0..n_time as i64).map(|t| t * 60).collect();
        let field: Vec<f32> = (0..n_time * 4).map(|v| v as f32 * 0.5).collect();
        let raw: Vec<i64> = (0..n_time as i64 * 4).collect();

        vec![
            aligned(
                "time",
                ArrayData::from_shape_vec(&[n_time], time).unwrap(),
                vec![2],
                vec![Dimension::Time],
            ),
            aligned(
                "diameter_bin_center",
                ArrayData::from_shape_vec(&[2], vec![0.062, 0.187]).unwrap(),
                vec![2],
                vec![Dimension::DiameterBinCenter],
            ),
            aligned(
                "FieldN",
                ArrayData::from_shape_vec(&[n_time, 4], field).unwrap(),
                vec![2, 4],
                vec![Dimension::Time, Dimension::DiameterBinCenter],
            ),
            aligned(
                "RawData",
                ArrayData::from_shape_vec(&[n_time, 2, 2], raw).unwrap(),
                vec![2, 2, 2],
                vec![
                    Dimension::Time,
                    Dimension::DiameterBinCenter,
                    Dimension::VelocityBinCenter,
                ],
            ),
        ]
    }

    #[test]
    fn test_row_groups_follow_time_chunk() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("L1.parquet");
        let writer = ParquetWriter::new(3, 2);

        writer.write_dataset(SensorName::OttParsivel, &sample_variables(5), &Map::new(), &path)?;

        let info = writer.get_file_info(&path)?;
        assert_eq!(info.total_rows, 5);
        assert_eq!(info.row_group_sizes, vec![2, 2, 1]);
        assert!(matches!(info.compression, Compression::ZSTD(_)));
        assert_eq!(info.sensor.as_deref(), Some("OTT_Parsivel"));
        assert_eq!(info.chunks["RawData"], vec![2, 2, 2]);
        Ok(())
    }

    #[test]
    fn test_read_variable_restores_shape() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("L1.parquet");
        let variables = sample_variables(3);

        ParquetWriter::new(3, 2).write_dataset(SensorName::OttParsivel, &variables, &Map::new(), &path)?;

        let raw = ParquetWriter::read_variable(&path, "RawData")?;
        assert_eq!(raw.shape(), &[3, 2, 2]);
        assert_eq!(raw.dtype(), Dtype::Int64);
        assert_eq!(raw, *variables[3].data);

        let time = ParquetWriter::read_variable(&path, "time")?;
        assert_eq!(time.to_f64_vec(), vec![0.0, 60.0, 120.0]);

        let layout = ParquetWriter::read_layout(&path)?;
        assert_eq!(layout.dims["time"], 3);
        assert_eq!(layout.dims["velocity_bin_center"], 2);
        assert!(layout.coordinates.contains_key("diameter_bin_center"));
        Ok(())
    }

    #[test]
    fn test_refuses_to_replace_directory() -> Result<()> {
        let dir = TempDir::new()?;
        let result = ParquetWriter::new(3, 2).write_dataset(
            SensorName::OttParsivel,
            &sample_variables(1),
            &Map::new(),
            dir.path(),
        );
        assert!(matches!(result, Err(ConversionError::DestinationWrite { .. })));
        Ok(())
    }

    #[test]
    fn test_shuffled_columns_use_byte_stream_split() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("L1.parquet");
        let mut variables = sample_variables(3);
        variables[2].encoding.shuffle = false;

        ParquetWriter::new(3, 2).write_dataset(SensorName::OttParsivel, &variables, &Map::new(), &path)?;

        let reader = SerializedFileReader::new(File::open(&path)?)?;
        let row_group = reader.metadata().row_group(0);
        let encodings = |column: &str| -> Vec<Encoding> {
            row_group
                .columns()
                .iter()
                .find(|c| c.column_path().string() == column)
                .map(|c| c.encodings().clone())
                .unwrap_or_default()
        };

        let raw = encodings("RawData.list.item");
        assert!(raw.contains(&Encoding::BYTE_STREAM_SPLIT), "{raw:?}");
        assert!(!raw.contains(&Encoding::RLE_DICTIONARY), "{raw:?}");
        assert!(encodings("time").contains(&Encoding::BYTE_STREAM_SPLIT));
        assert!(!encodings("FieldN.list.item").contains(&Encoding::BYTE_STREAM_SPLIT));
        Ok(())
    }

    #[test]
    fn test_large_counts_survive_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("L1.parquet");
        let big = 9007199254740993i64;
        let mut variables = sample_variables(1);
        variables[3].data = Arc::new(ArrayData::from_shape_vec(&[1, 2, 2], vec![0, 1, 2, big]).unwrap());

        ParquetWriter::new(3, 2).write_dataset(SensorName::OttParsivel, &variables, &Map::new(), &path)?;

        let raw = ParquetWriter::read_variable(&path, "RawData")?;
        assert_eq!(raw.as_array::<i64>().unwrap()[[0, 1, 1]], big);
        Ok(())
    }

    #[test]
    fn test_sink_failure_is_a_destination_error() {
        let destination = Path::new("L1.parquet");
        for budget in [0, 4] {
            let result = ParquetWriter::new(3, 2).write_to(
                FailingSink { budget },
                destination,
                SensorName::OttParsivel,
                &sample_variables(3),
                &Map::new(),
            );
            match result {
                Err(ConversionError::DestinationWrite { destination: failed, .. }) => {
                    assert_eq!(failed, destination, "budget {budget}");
                }
                other => panic!("budget {budget}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn test_failed_write_removes_partial_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("L1.parquet");

        // Level 99 is rejected after the file has been created
        let result =
            ParquetWriter::new(99, 2).write_dataset(SensorName::OttParsivel, &sample_variables(3), &Map::new(), &path);

        assert!(matches!(result, Err(ConversionError::Parquet(_))));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_data_columns_name_their_coordinates() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("L1.parquet");
        let mut variables = sample_variables(2);
        variables.push(aligned(
            "diameter_bin_width",
            ArrayData::from_shape_vec(&[2], vec![0.125, 0.125]).unwrap(),
            vec![2],
            vec![Dimension::DiameterBinCenter],
        ));

        ParquetWriter::new(3, 2).write_dataset(SensorName::OttParsivel, &variables, &Map::new(), &path)?;

        let file = File::open(&path)?;
        let schema = ParquetRecordBatchReaderBuilder::try_new(file)?.schema().clone();
        let attrs: Value = serde_json::from_str(&schema.field_with_name("FieldN")?.metadata()[FIELD_ATTRS])?;
        assert_eq!(attrs[COORDINATES_ATTR], json!("diameter_bin_width"));
        Ok(())
    }
}
