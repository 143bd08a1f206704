use std::collections::HashMap;

use ndarray::{Array1, Array2, s};

#[derive(Clone, Copy, Debug)]
pub enum WeightType { I64, F64 }

/// Named node weight series stored as type-separated matrices.
#[derive(Clone, Debug)]
pub struct WeightMatrix {
    series: HashMap<String, (WeightType, usize)>, // len = k_i + k_f
    i64: Array2<i64>, // (n, k_i)
    f64: Array2<f64>, // (n, k_f)
}

impl WeightMatrix {
    /// Construct a weight matrix from per-series column vectors.
    pub fn new(
        num_rows: usize,
        weights_i64: HashMap<String, Vec<i64>>,
        weights_f64: HashMap<String, Vec<f64>>,
    ) -> Self {
        weights_i64.iter().for_each(|(name, values)| {
            assert!(values.len() == num_rows, "weights_i64[{name}].len() must equal num_rows");
        });
        weights_f64.iter().for_each(|(name, values)| {
            assert!(values.len() == num_rows, "weights_f64[{name}].len() must equal num_rows");
            assert!(!weights_i64.contains_key(name), "series '{name}' appears in both weight maps");
        });

        let mut matrix = Self {
            series: HashMap::new(),
            i64: Array2::<i64>::zeros((num_rows, weights_i64.len())),
            f64: Array2::<f64>::zeros((num_rows, weights_f64.len())),
        };

        weights_i64.into_iter().enumerate().for_each(|(i, (name, values))| {
            matrix.i64.slice_mut(s![.., i]).assign(&Array1::from(values));
            matrix.series.insert(name, (WeightType::I64, i));
        });
        weights_f64.into_iter().enumerate().for_each(|(i, (name, values))| {
            matrix.f64.slice_mut(s![.., i]).assign(&Array1::from(values));
            matrix.series.insert(name, (WeightType::F64, i));
        });

        matrix
    }

    /// Construct a weight matrix with no series.
    pub fn empty(num_rows: usize) -> Self {
        Self::new(num_rows, HashMap::new(), HashMap::new())
    }

    /// Number of rows (nodes) in the matrix.
    #[inline] pub fn num_rows(&self) -> usize { self.i64.nrows() }

    /// Number of named series in the matrix.
    #[inline] pub fn num_series(&self) -> usize { self.series.len() }

    /// Whether a named series is present.
    #[inline] pub fn contains(&self, series: &str) -> bool { self.series.contains_key(series) }

    /// Iterator over the names of all series.
    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|name| name.as_str())
    }

    /// Get a single weight as f64, regardless of the backing type.
    pub fn get_as_f64(&self, series: &str, row: usize) -> Option<f64> {
        match self.series.get(series)? {
            (WeightType::I64, col) => Some(self.i64[[row, *col]] as f64),
            (WeightType::F64, col) => Some(self.f64[[row, *col]]),
        }
    }

    /// Sum of a series over all rows.
    pub fn column_sum(&self, series: &str) -> Option<f64> {
        match self.series.get(series)? {
            (WeightType::I64, col) => Some(self.i64.column(*col).sum() as f64),
            (WeightType::F64, col) => Some(self.f64.column(*col).sum()),
        }
    }
}
