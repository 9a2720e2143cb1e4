use num_traits::ToPrimitive;

use crate::error::Error;

/// Append-only time series kept as parallel value and timestamp columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History<T> {
    values: Vec<T>,
    times: Vec<f64>,
}

impl<T: Copy> History<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            times: Vec::new(),
        }
    }

    /// Checks that a sample stamped `ts` could be appended.
    pub fn accepts(&self, ts: f64) -> Result<(), Error> {
        if !ts.is_finite() || ts < 0.0 {
            return Err(Error::InvalidTimestamp(ts));
        }

        match self.times.last() {
            Some(&last) if ts < last => Err(Error::NonMonotonicTime { last, next: ts }),
            _ => Ok(()),
        }
    }

    /// Rejects negative or non-finite timestamps and timestamps older than the
    /// last one.
    pub fn push(&mut self, ts: f64, value: T) -> Result<(), Error> {
        self.accepts(ts)?;

        self.values.push(value);
        self.times.push(ts);

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<(f64, T)> {
        Some((*self.times.first()?, *self.values.first()?))
    }

    #[inline]
    pub fn last(&self) -> Option<(f64, T)> {
        Some((*self.times.last()?, *self.values.last()?))
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (f64, T)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

impl<T: Copy + ToPrimitive> History<T> {
    /// Truncated integer mean over the whole series.
    pub fn integer_mean(&self) -> Option<u64> {
        if self.values.is_empty() {
            return None;
        }

        let sum: u64 = self.values.iter().filter_map(|v| v.to_u64()).sum();

        Some(sum / self.values.len() as u64)
    }
}
