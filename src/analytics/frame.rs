//! Date-indexed tables of search interest
//!
//! [`TrendFrame`] holds one `f64` column per search term over a strictly
//! increasing date index. [`Series`] is a single named column, used for the
//! composite index and for per-term results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by frame construction and alignment
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("Date index is not strictly increasing at position {0}")]
    UnsortedIndex(usize),

    #[error("Column '{name}' has {got} values, index has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Cannot append: columns differ ({0})")]
    ColumnsDiffer(String),
}

/// Result type for frame operations
pub type FrameResult<T> = Result<T, FrameError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Column {
    name: String,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct FrameRepr {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// Date-indexed table with one column per search term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRepr")]
pub struct TrendFrame {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TryFrom<FrameRepr> for TrendFrame {
    type Error = FrameError;

    fn try_from(repr: FrameRepr) -> Result<Self, Self::Error> {
        Self::from_columns(
            repr.index,
            repr.columns.into_iter().map(|c| (c.name, c.values)).collect(),
        )
    }
}

impl Default for TrendFrame {
    fn default() -> Self {
        Self::empty()
    }
}

impl TrendFrame {
    /// Frame with no rows and no columns
    #[must_use]
    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Create a frame with an index and no columns
    pub fn new(index: Vec<NaiveDate>) -> FrameResult<Self> {
        Self::from_columns(index, Vec::new())
    }

    /// Create a frame from an index and named columns
    ///
    /// # Errors
    ///
    /// Fails if the index is not strictly increasing, a column length differs
    /// from the index length, or a column name repeats.
    pub fn from_columns(
        index: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> FrameResult<Self> {
        if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(FrameError::UnsortedIndex(pos + 1));
        }
        let mut frame = Self {
            index,
            columns: Vec::with_capacity(columns.len()),
        };
        for (name, values) in columns {
            if frame.has_column(&name) {
                return Err(FrameError::DuplicateColumn(name));
            }
            frame.insert_column(name, values)?;
        }
        Ok(frame)
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index.first().copied()
    }

    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.values.as_slice()))
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Column as an owned [`Series`]
    pub fn series(&self, name: &str) -> FrameResult<Series> {
        let values = self
            .column(name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
        Ok(Series {
            name: name.to_string(),
            index: self.index.clone(),
            values: values.to_vec(),
        })
    }

    /// Insert a column, replacing one with the same name
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> FrameResult<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(FrameError::LengthMismatch {
                name,
                expected: self.index.len(),
                got: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Copy of the frame without the named column
    #[must_use]
    pub fn without_column(&self, name: &str) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
        }
    }

    /// Copy of the frame holding only `names`, in that order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> FrameResult<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let values = self
                .column(name)
                .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
            columns.push(Column {
                name: name.to_string(),
                values: values.to_vec(),
            });
        }
        Ok(Self {
            index: self.index.clone(),
            columns,
        })
    }

    /// Apply `f` to every value of one column
    pub fn map_column<F>(&mut self, name: &str, f: F) -> FrameResult<()>
    where
        F: Fn(f64) -> f64,
    {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
        for v in &mut col.values {
            *v = f(*v);
        }
        Ok(())
    }

    /// Multiply one column by a constant
    pub fn scale_column(&mut self, name: &str, factor: f64) -> FrameResult<()> {
        self.map_column(name, |v| v * factor)
    }

    /// Multiply every column by a constant
    pub fn scale_all(&mut self, factor: f64) {
        for col in &mut self.columns {
            for v in &mut col.values {
                *v *= factor;
            }
        }
    }

    /// Rebuild every column through `f(name, values)`
    pub fn map_columns<F>(&self, mut f: F) -> FrameResult<Self>
    where
        F: FnMut(&str, &[f64]) -> Vec<f64>,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), f(&c.name, &c.values)))
            .collect();
        Self::from_columns(self.index.clone(), columns)
    }

    /// Keep the rows for which `keep(position, date)` is true
    #[must_use]
    pub fn filter_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(usize, NaiveDate) -> bool,
    {
        let positions: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(i, d)| keep(*i, **d))
            .map(|(i, _)| i)
            .collect();
        self.take_rows(&positions)
    }

    /// Rows dated strictly after `date`
    #[must_use]
    pub fn rows_after(&self, date: NaiveDate) -> Self {
        self.filter_rows(|_, d| d > date)
    }

    fn take_rows(&self, positions: &[usize]) -> Self {
        Self {
            index: positions.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: positions.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// Row positions `(self, other)` sharing a date, in date order
    #[must_use]
    pub fn aligned_rows(&self, other: &TrendFrame) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.index.len() && j < other.index.len() {
            match self.index[i].cmp(&other.index[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    pairs.push((i, j));
                    i += 1;
                    j += 1;
                }
            }
        }
        pairs
    }

    /// Inner join on dates, adding `other`'s columns to this frame's
    pub fn join_columns(&self, other: &TrendFrame) -> FrameResult<Self> {
        let pairs = self.aligned_rows(other);
        let left: Vec<usize> = pairs.iter().map(|(i, _)| *i).collect();
        let right: Vec<usize> = pairs.iter().map(|(_, j)| *j).collect();

        let mut joined = self.take_rows(&left);
        for col in &other.columns {
            if joined.has_column(&col.name) {
                return Err(FrameError::DuplicateColumn(col.name.clone()));
            }
            joined.columns.push(Column {
                name: col.name.clone(),
                values: right.iter().map(|&j| col.values[j]).collect(),
            });
        }
        Ok(joined)
    }

    /// Append the rows of `other` dated after this frame's last date
    ///
    /// Both frames must carry the same column names.
    pub fn append_after(&mut self, other: &TrendFrame) -> FrameResult<usize> {
        if self.width() != other.width() || !other.column_names().all(|n| self.has_column(n)) {
            return Err(FrameError::ColumnsDiffer(
                other.column_names().collect::<Vec<_>>().join(", "),
            ));
        }
        let tail = match self.last_date() {
            Some(last) => other.rows_after(last),
            None => other.clone(),
        };
        self.index.extend_from_slice(&tail.index);
        for col in &mut self.columns {
            let extra = tail.column(&col.name).unwrap_or_default();
            col.values.extend_from_slice(extra);
        }
        Ok(tail.len())
    }

    /// Sum across columns for every row
    #[must_use]
    pub fn row_sums(&self, name: impl Into<String>) -> Series {
        let values = (0..self.len())
            .map(|i| self.columns.iter().map(|c| c.values[i]).sum())
            .collect();
        Series {
            name: name.into(),
            index: self.index.clone(),
            values,
        }
    }
}

/// Named date-indexed series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub index: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl Series {
    #[must_use]
    pub fn new(name: impl Into<String>, index: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            index,
            values,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same index and name, new values
    #[must_use]
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values,
        }
    }

    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }
}
