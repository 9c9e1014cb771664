use ndarray::{ArrayD, IxDyn, ShapeError};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::models::sensor::Dtype;

/// Scalar types an L1 array can hold.
pub trait Element: Copy + Default + PartialEq + Send + Sync + fmt::Debug + 'static {
    const DTYPE: Dtype;

    fn from_f64(value: f64) -> Self;
    fn from_i64(value: i64) -> Self;
    fn to_f64(self) -> f64;
    fn to_i64(self) -> i64;
    fn wrap(array: ArrayD<Self>) -> ArrayData;
    fn unwrap_ref(data: &ArrayData) -> Option<&ArrayD<Self>>;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: Dtype = $dtype;

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            fn from_i64(value: i64) -> Self {
                value as $ty
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn to_i64(self) -> i64 {
                self as i64
            }

            fn wrap(array: ArrayD<Self>) -> ArrayData {
                ArrayData::$variant(array)
            }

            fn unwrap_ref(data: &ArrayData) -> Option<&ArrayD<Self>> {
                match data {
                    ArrayData::$variant(array) => Some(array),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(f32, Dtype::Float32, Float32);
impl_element!(f64, Dtype::Float64, Float64);
impl_element!(i32, Dtype::Int32, Int32);
impl_element!(i64, Dtype::Int64, Int64);

/// A materialised, typed n-dimensional array in C order.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
}

/// Run `$body` with `$arr` bound to the typed array inside an [`ArrayData`].
macro_rules! with_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            $crate::models::array::ArrayData::Float32($arr) => $body,
            $crate::models::array::ArrayData::Float64($arr) => $body,
            $crate::models::array::ArrayData::Int32($arr) => $body,
            $crate::models::array::ArrayData::Int64($arr) => $body,
        }
    };
}
pub(crate) use with_array;

impl ArrayData {
    pub fn from_shape_vec<T: Element>(shape: &[usize], values: Vec<T>) -> std::result::Result<Self, ShapeError> {
        ArrayD::from_shape_vec(IxDyn(shape), values).map(T::wrap)
    }

    /// Cast `values` to `dtype` as a one dimensional array.
    pub fn from_f64_values(dtype: Dtype, values: &[f64]) -> Self {
        fn cast<T: Element>(values: &[f64]) -> ArrayData {
            let cast: Vec<T> = values.iter().map(|v| T::from_f64(*v)).collect();
            T::wrap(ndarray::Array1::from(cast).into_dyn())
        }

        match dtype {
            Dtype::Float32 => cast::<f32>(values),
            Dtype::Float64 => cast::<f64>(values),
            Dtype::Int32 => cast::<i32>(values),
            Dtype::Int64 => cast::<i64>(values),
        }
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            ArrayData::Float32(_) => Dtype::Float32,
            ArrayData::Float64(_) => Dtype::Float64,
            ArrayData::Int32(_) => Dtype::Int32,
            ArrayData::Int64(_) => Dtype::Int64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, arr => arr.shape())
    }

    pub fn len(&self) -> usize {
        with_array!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_shape(self, shape: &[usize]) -> std::result::Result<Self, ShapeError> {
        match self {
            ArrayData::Float32(arr) => arr.into_shape(IxDyn(shape)).map(ArrayData::Float32),
            ArrayData::Float64(arr) => arr.into_shape(IxDyn(shape)).map(ArrayData::Float64),
            ArrayData::Int32(arr) => arr.into_shape(IxDyn(shape)).map(ArrayData::Int32),
            ArrayData::Int64(arr) => arr.into_shape(IxDyn(shape)).map(ArrayData::Int64),
        }
    }

    pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::unwrap_ref(self)
    }

    /// Convert to `dtype`, keeping the shape. Same-dtype casts are clones.
    /// Integer to integer casts never pass through `f64`.
    pub fn cast(&self, dtype: Dtype) -> Self {
        fn convert<S: Element, T: Element>(arr: &ArrayD<S>) -> ArrayData {
            if S::DTYPE.is_float() || T::DTYPE.is_float() {
                T::wrap(arr.mapv(|v| T::from_f64(v.to_f64())))
            } else {
                T::wrap(arr.mapv(|v| T::from_i64(v.to_i64())))
            }
        }

        if self.dtype() == dtype {
            return self.clone();
        }
        match dtype {
            Dtype::Float32 => with_array!(self, arr => convert::<_, f32>(arr)),
            Dtype::Float64 => with_array!(self, arr => convert::<_, f64>(arr)),
            Dtype::Int32 => with_array!(self, arr => convert::<_, i32>(arr)),
            Dtype::Int64 => with_array!(self, arr => convert::<_, i64>(arr)),
        }
    }

    /// Values in logical (C) order, widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_array!(self, arr => arr.iter().map(|v| *v as f64).collect())
    }
}

type PendingOp = Arc<dyn Fn() -> Result<ArrayData> + Send + Sync>;

#[derive(Clone)]
enum ArrayState {
    Materialized(Arc<ArrayData>),
    Pending(PendingOp),
}

/// An array that is either already in memory or described by a pending
/// computation. Shape and dtype are always known without computing.
#[derive(Clone)]
pub struct FieldArray {
    shape: Vec<usize>,
    dtype: Dtype,
    state: ArrayState,
}

impl FieldArray {
    pub fn from_data(data: ArrayData) -> Self {
        Self {
            shape: data.shape().to_vec(),
            dtype: data.dtype(),
            state: ArrayState::Materialized(Arc::new(data)),
        }
    }

    pub fn pending<F>(shape: Vec<usize>, dtype: Dtype, op: F) -> Self
    where
        F: Fn() -> Result<ArrayData> + Send + Sync + 'static,
    {
        Self {
            shape,
            dtype,
            state: ArrayState::Pending(Arc::new(op)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.state, ArrayState::Materialized(_))
    }

    /// Materialise the array. Pending arrays are recomputed on every call.
    pub fn compute(&self) -> Result<Arc<ArrayData>> {
        match &self.state {
            ArrayState::Materialized(data) => Ok(Arc::clone(data)),
            ArrayState::Pending(op) => op().map(Arc::new),
        }
    }

    pub fn materialize(self) -> Result<Self> {
        match self.state {
            ArrayState::Materialized(_) => Ok(self),
            ArrayState::Pending(ref op) => {
                let data = op()?;
                Ok(Self {
                    shape: data.shape().to_vec(),
                    dtype: data.dtype(),
                    state: ArrayState::Materialized(Arc::new(data)),
                })
            }
        }
    }
}

impl fmt::Debug for FieldArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldArray")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

/// How the parse, reshape and assemble stages treat their arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Every array is computed as soon as it is described.
    #[default]
    Eager,
    /// Arrays stay pending until validation or writing computes them.
    Deferred,
}

impl ExecutionMode {
    pub fn realize(&self, array: FieldArray) -> Result<FieldArray> {
        match self {
            ExecutionMode::Eager => array.materialize(),
            ExecutionMode::Deferred => Ok(array),
        }
    }
}
