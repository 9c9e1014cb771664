use ndarray::ArrayD;
use rayon::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use zarrs::array::chunk_grid::ChunkGrid;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, ArrayError, DataType, ElementOwned, FillValue};
use zarrs::filesystem::FilesystemStore;
use zarrs::group::{Group, GroupBuilder};
use zarrs::storage::{ReadableWritableListableStorage, ReadableWritableListableStorageTraits};

use crate::error::{ConversionError, Result};
use crate::models::array::with_array;
use crate::models::{ArrayData, Dtype, Element};
use crate::utils::constants::{COORDINATES_ATTR, ZARR_METADATA_FILE};
use crate::writers::chunking::{coordinates_attr, validate_chunks, AlignedVariable};
use crate::writers::encoding_planner::{FillValuePolicy, VariableEncoding};

type StoreArray = Array<dyn ReadableWritableListableStorageTraits>;

fn zarr_err(e: impl Display) -> ConversionError {
    ConversionError::Zarr(e.to_string())
}

fn destination_err(path: &Path, e: impl Display) -> ConversionError {
    ConversionError::destination(path, e.to_string())
}

/// Writes datasets as Zarr V3 directory stores.
pub struct ZarrWriter;

impl ZarrWriter {
    /// Write a full store at `destination`. A store that fails half way is
    /// removed again.
    pub fn write(
        variables: &[AlignedVariable],
        global_attrs: &Map<String, Value>,
        destination: &Path,
    ) -> Result<()> {
        prepare_destination(destination)?;

        let result = write_store(variables, global_attrs, destination);
        if result.is_err() && destination.exists() {
            debug!(path = %destination.display(), "removing partial store");
            let _ = fs::remove_dir_all(destination);
        }
        result
    }

    /// Describe a store written by [`ZarrWriter::write`].
    pub fn store_info(path: &Path) -> Result<ZarrStoreInfo> {
        let store = open_store(path)?;
        let attrs = Group::open(store.clone(), "/")
            .map_err(zarr_err)?
            .attributes()
            .clone();

        let mut arrays = BTreeMap::new();
        let mut total_bytes = 0;
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let array_dir = entry.path();
            if !array_dir.join(ZARR_METADATA_FILE).is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let array = Array::open(store.clone(), &format!("/{}", name)).map_err(zarr_err)?;
            let metadata = serde_json::to_value(array.metadata())?;
            let (chunk_files, bytes) = chunk_stats(&array_dir)?;
            total_bytes += bytes;

            arrays.insert(
                name,
                ZarrArrayInfo {
                    dtype: dtype_of(array.data_type())?,
                    shape: array.shape().iter().map(|n| *n as usize).collect(),
                    chunks: metadata["chunk_grid"]["configuration"]["chunk_shape"]
                        .as_array()
                        .map(|c| c.iter().filter_map(Value::as_u64).map(|n| n as usize).collect())
                        .unwrap_or_default(),
                    dimensions: metadata["dimension_names"]
                        .as_array()
                        .map(|d| d.iter().filter_map(|n| n.as_str().map(str::to_string)).collect())
                        .unwrap_or_default(),
                    attrs: array.attributes().clone(),
                    chunk_files,
                },
            );
        }

        Ok(ZarrStoreInfo {
            path: path.to_path_buf(),
            attrs,
            arrays,
            total_bytes,
        })
    }

    /// Read one variable back into memory.
    pub fn read_variable(store: &Path, name: &str) -> Result<ArrayData> {
        let array = Array::open(open_store(store)?, &format!("/{}", name)).map_err(zarr_err)?;
        let shape: Vec<usize> = array.shape().iter().map(|n| *n as usize).collect();

        match dtype_of(array.data_type())? {
            Dtype::Float32 => retrieve::<f32>(&array, &shape),
            Dtype::Float64 => retrieve::<f64>(&array, &shape),
            Dtype::Int32 => retrieve::<i32>(&array, &shape),
            Dtype::Int64 => retrieve::<i64>(&array, &shape),
        }
    }
}

fn open_store(path: &Path) -> Result<ReadableWritableListableStorage> {
    if !path.join(ZARR_METADATA_FILE).is_file() {
        return Err(ConversionError::InvalidFormat(format!(
            "{} is not a zarr store",
            path.display()
        )));
    }
    Ok(Arc::new(FilesystemStore::new(path).map_err(zarr_err)?))
}

/// Only a previous zarr store may be replaced.
fn prepare_destination(destination: &Path) -> Result<()> {
    if !destination.exists() {
        return Ok(());
    }

    if destination.is_dir() && destination.join(ZARR_METADATA_FILE).is_file() {
        info!(path = %destination.display(), "replacing existing zarr store");
        fs::remove_dir_all(destination).map_err(|e| ConversionError::destination(destination, e))
    } else {
        Err(ConversionError::destination(
            destination,
            format!("{} exists and is not a zarr store", destination.display()),
        ))
    }
}

fn write_store(
    variables: &[AlignedVariable],
    global_attrs: &Map<String, Value>,
    destination: &Path,
) -> Result<()> {
    fs::create_dir_all(destination).map_err(|e| ConversionError::destination(destination, e))?;
    let store: ReadableWritableListableStorage =
        Arc::new(FilesystemStore::new(destination).map_err(|e| destination_err(destination, e))?);

    GroupBuilder::new()
        .attributes(global_attrs.clone())
        .build(store.clone(), "/")
        .map_err(|e| destination_err(destination, e))?
        .store_metadata()
        .map_err(|e| destination_err(destination, e))?;

    variables
        .par_iter()
        .try_for_each(|variable| write_array(&store, variable, variables, destination))?;

    info!(
        path = %destination.display(),
        variables = variables.len(),
        "zarr store written"
    );
    Ok(())
}

fn write_array(
    store: &ReadableWritableListableStorage,
    variable: &AlignedVariable,
    all: &[AlignedVariable],
    destination: &Path,
) -> Result<()> {
    let encoding = &variable.encoding;
    let path = destination.join(&variable.name);
    validate_chunks(&variable.name, variable.shape(), &encoding.chunks)?;

    let chunk_shape: Vec<NonZeroU64> = encoding
        .chunks
        .iter()
        .filter_map(|c| NonZeroU64::new(*c as u64))
        .collect();
    let mut attrs = variable.attrs.clone();
    if let Some(coordinates) = coordinates_attr(variable, all) {
        attrs.insert(COORDINATES_ATTR.to_string(), json!(coordinates));
    }
    let dims: Vec<&str> = variable.dims.iter().map(|d| d.name()).collect();

    let array = ArrayBuilder::new(
        variable.shape().iter().map(|n| *n as u64).collect(),
        data_type(encoding.dtype),
        ChunkGrid::from(chunk_shape),
        fill_value(encoding),
    )
    .bytes_to_bytes_codecs(vec![Arc::new(blosc_codec(encoding)?)])
    .dimension_names(Some(dims))
    .attributes(attrs)
    .build(store.clone(), &format!("/{}", variable.name))
    .map_err(|e| destination_err(&path, e))?;
    array.store_metadata().map_err(|e| destination_err(&path, e))?;

    if !variable.data.is_empty() {
        with_array!(variable.data.as_ref(), arr => store_elements(&array, arr))
            .map_err(|e| destination_err(&path, e))?;
    }

    debug!(variable = %variable.name, shape = ?variable.shape(), "array written");
    Ok(())
}

fn store_elements<T: Element + zarrs::array::Element>(
    array: &StoreArray,
    values: &ArrayD<T>,
) -> std::result::Result<(), ArrayError> {
    match values.as_slice() {
        Some(slice) => array.store_array_subset_elements::<T>(&array.subset_all(), slice),
        None => {
            let owned: Vec<T> = values.iter().copied().collect();
            array.store_array_subset_elements::<T>(&array.subset_all(), &owned)
        }
    }
}

fn retrieve<T: Element + ElementOwned>(array: &StoreArray, shape: &[usize]) -> Result<ArrayData> {
    let values = if shape.iter().product::<usize>() == 0 {
        Vec::new()
    } else {
        array
            .retrieve_array_subset_elements::<T>(&array.subset_all())
            .map_err(zarr_err)?
    };
    ArrayData::from_shape_vec(shape, values).map_err(|e| ConversionError::InvalidFormat(e.to_string()))
}

/// Blosc around zstd, byte shuffled at the dtype width when the encoding
/// asks for it.
fn blosc_codec(encoding: &VariableEncoding) -> Result<BloscCodec> {
    let level = encoding.codec.level();
    let clevel = u8::try_from(level)
        .ok()
        .and_then(|l| BloscCompressionLevel::try_from(l).ok())
        .ok_or_else(|| ConversionError::Settings(format!("blosc compression level {} outside 0..=9", level)))?;
    let shuffle = if encoding.shuffle {
        BloscShuffleMode::Shuffle
    } else {
        BloscShuffleMode::NoShuffle
    };

    BloscCodec::new(
        BloscCompressor::Zstd,
        clevel,
        None,
        shuffle,
        Some(encoding.dtype.size_of()),
    )
    .map_err(|e| ConversionError::Settings(e.to_string()))
}

fn data_type(dtype: Dtype) -> DataType {
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
        DataType::Int64 => Ok(Dtype::Int64),
        other => Err(ConversionError::InvalidFormat(format!(
            "unsupported zarr data type {:?}",
            other
        ))),
    }
}

fn fill_value(encoding: &VariableEncoding) -> FillValue {
    match (encoding.dtype, encoding.fill_value) {
        (Dtype::Float32, FillValuePolicy::NaN) => FillValue::from(f32::NAN),
        (Dtype::Float64, FillValuePolicy::NaN) => FillValue::from(f64::NAN),
        (Dtype::Float32, FillValuePolicy::Zero) => FillValue::from(0.0f32),
        (Dtype::Float64, FillValuePolicy::Zero) => FillValue::from(0.0f64),
        (Dtype::Int32, _) => FillValue::from(0i32),
        (Dtype::Int64, _) => FillValue::from(0i64),
    }
}

/// Number and total size of the chunk files below an array directory.
fn chunk_stats(dir: &Path) -> std::io::Result<(usize, u64)> {
    let mut files = 0;
    let mut bytes = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            let (f, b) = chunk_stats(&entry.path())?;
            files += f;
            bytes += b;
        } else if entry.file_name() != ZARR_METADATA_FILE {
            files += 1;
            bytes += metadata.len();
        }
    }
    Ok((files, bytes))
}

/// Layout of one array in a store.
#[derive(Debug, Clone, PartialEq)]
pub struct ZarrArrayInfo {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    pub dimensions: Vec<String>,
    pub attrs: Map<String, Value>,
    pub chunk_files: usize,
}

#[derive(Debug, Clone)]
pub struct ZarrStoreInfo {
    pub path: PathBuf,
    pub attrs: Map<String, Value>,
    pub arrays: BTreeMap<String, ZarrArrayInfo>,
    pub total_bytes: u64,
}

impl ZarrStoreInfo {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Zarr Store Summary:\n\
            - Path: {}\n\
            - Arrays: {}\n\
            - Stored chunk bytes: {:.2} MB\n",
            self.path.display(),
            self.arrays.len(),
            self.total_bytes as f64 / 1_048_576.0,
        );

        for (name, array) in &self.arrays {
            summary.push_str(&format!(
                "  {:<22} {:<8} shape {:?} chunks {:?} ({})\n",
                name,
                array.dtype.name(),
                array.shape,
                array.chunks,
                array.dimensions.join(", ")
            ));
        }
        for (key, value) in &self.attrs {
            summary.push_str(&format!("  @{} = {}\n", key, value));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dimension;
    use crate::writers::encoding_planner::Codec;
    use tempfile::TempDir;

    fn aligned(name: &str, data: ArrayData, chunks: Vec<usize>, dims: Vec<Dimension>) -> AlignedVariable {
        let dtype = data.dtype();
        AlignedVariable {
            name: name.to_string(),
            dims,
            data: Arc::new(data),
            encoding: VariableEncoding {
                dtype,
                chunks,
                codec: Codec::Blosc { level: 3 },
                shuffle: true,
                fill_value: FillValuePolicy::for_dtype(dtype),
            },
            is_coord: false,
            attrs: Map::new(),
        }
    }

    fn coord(name: &str, values: Vec<f64>) -> AlignedVariable {
        let len = values.len();
        let mut variable = aligned(
            name,
            ArrayData::from_shape_vec(&[len], values).unwrap(),
            vec![len],
            vec![Dimension::DiameterBinCenter],
        );
        variable.is_coord = true;
        variable
    }

    #[test]
    fn test_write_store_layout() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("L1.zarr");
        let big = 9007199254740993i64;
        let data = ArrayData::from_shape_vec(&[3, 2], vec![1i64, 2, 3, 4, 5, big]).unwrap();
        let variables = vec![aligned(
            "RawData",
            data,
            vec![2, 2],
            vec![Dimension::Time, Dimension::DiameterBinCenter],
        )];

        let mut attrs = Map::new();
        attrs.insert("sensor_name".to_string(), json!("OTT_Parsivel"));
        ZarrWriter::write(&variables, &attrs, &store)?;

        assert!(store.join("zarr.json").is_file());
        let meta: Value = serde_json::from_str(&fs::read_to_string(store.join("RawData/zarr.json"))?)?;
        assert_eq!(meta["data_type"], json!("int64"));
        assert_eq!(meta["fill_value"], json!(0));
        assert_eq!(meta["dimension_names"], json!(["time", "diameter_bin_center"]));
        let blosc = meta["codecs"]
            .as_array()
            .and_then(|codecs| codecs.iter().find(|c| c["name"] == json!("blosc")))
            .cloned()
            .unwrap();
        assert_eq!(blosc["configuration"]["cname"], json!("zstd"));
        assert_eq!(blosc["configuration"]["clevel"], json!(3));
        assert_eq!(blosc["configuration"]["shuffle"], json!("shuffle"));
        assert_eq!(blosc["configuration"]["typesize"], json!(8));

        let info = ZarrWriter::store_info(&store)?;
        assert_eq!(info.arrays["RawData"].shape, vec![3, 2]);
        assert_eq!(info.arrays["RawData"].chunks, vec![2, 2]);
        assert_eq!(info.arrays["RawData"].dimensions, vec!["time", "diameter_bin_center"]);
        assert_eq!(info.arrays["RawData"].chunk_files, 2);
        assert_eq!(info.attrs["sensor_name"], json!("OTT_Parsivel"));

        let read = ZarrWriter::read_variable(&store, "RawData")?;
        assert_eq!(read.shape(), &[3, 2]);
        assert_eq!(
            read.as_array::<i64>().unwrap().iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, big]
        );
        Ok(())
    }

    #[test]
    fn test_float_arrays_declare_nan_fill() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("L1.zarr");
        let data = ArrayData::from_shape_vec(&[2], vec![1.0f32, 2.0]).unwrap();
        ZarrWriter::write(&[aligned("FieldN", data, vec![4], vec![Dimension::Time])], &Map::new(), &store)?;

        let meta: Value = serde_json::from_str(&fs::read_to_string(store.join("FieldN/zarr.json"))?)?;
        assert_eq!(meta["fill_value"], json!("NaN"));
        Ok(())
    }

    #[test]
    fn test_data_variables_name_their_coordinates() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("L1.zarr");
        let field_n = ArrayData::from_shape_vec(&[1, 2], vec![0.5f64, 1.5]).unwrap();
        let variables = vec![
            coord("diameter_bin_center", vec![0.1, 0.2]),
            coord("diameter_bin_width", vec![0.125, 0.125]),
            aligned(
                "FieldN",
                field_n,
                vec![5000, 2],
                vec![Dimension::Time, Dimension::DiameterBinCenter],
            ),
        ];

        ZarrWriter::write(&variables, &Map::new(), &store)?;

        let info = ZarrWriter::store_info(&store)?;
        assert_eq!(info.arrays["FieldN"].attrs[COORDINATES_ATTR], json!("diameter_bin_width"));
        assert!(!info.arrays["diameter_bin_width"].attrs.contains_key(COORDINATES_ATTR));
        assert!(!info.arrays["diameter_bin_center"].attrs.contains_key(COORDINATES_ATTR));
        Ok(())
    }

    #[test]
    fn test_failed_write_removes_partial_store() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("L1.zarr");
        let good = ArrayData::from_shape_vec(&[2], vec![1.0f64, 2.0]).unwrap();
        let bad = ArrayData::from_shape_vec(&[2, 2], vec![1i64, 2, 3, 4]).unwrap();
        let variables = vec![
            aligned("FieldN", good, vec![2], vec![Dimension::Time]),
            aligned(
                "RawData",
                bad,
                vec![0, 2],
                vec![Dimension::Time, Dimension::DiameterBinCenter],
            ),
        ];

        let result = ZarrWriter::write(&variables, &Map::new(), &store);
        assert!(matches!(result, Err(ConversionError::Settings(_))));
        assert!(!store.exists());
        Ok(())
    }

    #[test]
    fn test_refuses_to_replace_foreign_directory() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("not_a_store");
        fs::create_dir_all(&store)?;
        fs::write(store.join("keep.txt"), "data")?;

        let result = ZarrWriter::write(&[], &Map::new(), &store);
        assert!(matches!(result, Err(ConversionError::DestinationWrite { .. })));
        assert!(store.join("keep.txt").is_file());
        Ok(())
    }

    #[test]
    fn test_replaces_previous_store() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("L1.zarr");
        let data = ArrayData::from_shape_vec(&[2], vec![1.0f32, 2.0]).unwrap();
        let variables = vec![aligned("FieldN", data, vec![4], vec![Dimension::Time])];

        ZarrWriter::write(&variables, &Map::new(), &store)?;
        ZarrWriter::write(&variables, &Map::new(), &store)?;

        let read = ZarrWriter::read_variable(&store, "FieldN")?;
        assert_eq!(read.shape(), &[2]);
        assert_eq!(read.to_f64_vec(), vec![1.0, 2.0]);
        Ok(())
    }
}
