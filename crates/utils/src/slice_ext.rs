use crate::error::{Error, Result};

/// Extends functionality for slices of float arrays
pub trait SliceExt<T> {
    /// Find the minimum value in float arrays
    ///
    /// `NaN` values are skipped, infinities are ordered as usual. A slice that
    /// is empty or holds nothing but `NaN` returns an error.
    ///
    /// ```rust
    /// # use amrtools_utils::SliceExt;
    /// # use amrtools_utils::Error;
    /// // Successful cases
    /// assert_eq!([1.1, 0.5, 2.2].try_min(), Ok(0.5));
    /// assert_eq!([1.1, f64::MIN, 2.2].try_min(), Ok(f64::MIN));
    /// assert_eq!([1.1, f64::NAN, 2.2].try_min(), Ok(1.1));
    /// assert_eq!([1.1, f64::NEG_INFINITY].try_min(), Ok(f64::NEG_INFINITY));
    ///
    /// // Error cases
    /// assert_eq!([f64::NAN].try_min(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!(Vec::<f64>::new().try_min(), Err(Error::SliceContainsNoValues));
    /// ```
    ///
    /// The float primitives do not implement `Ord` due to `NaN` being
    /// incomparable, so this uses `total_cmp` over the values that are not
    /// `NaN`.
    fn try_min(&self) -> Result<T>;

    /// Find the maximum value in float arrays
    ///
    /// `NaN` values are skipped, infinities are ordered as usual.
    ///
    /// ```rust
    /// # use amrtools_utils::SliceExt;
    /// # use amrtools_utils::Error;
    /// // Successful cases
    /// assert_eq!([1.1, 0.5, 2.2].try_max(), Ok(2.2));
    /// assert_eq!([f64::NEG_INFINITY, 0.5].try_max(), Ok(0.5));
    /// assert_eq!([1.1, f64::INFINITY, f64::NAN].try_max(), Ok(f64::INFINITY));
    ///
    /// // Error cases
    /// assert_eq!([f64::NAN; 2].try_max(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!(Vec::<f64>::new().try_max(), Err(Error::SliceContainsNoValues));
    /// ```
    fn try_max(&self) -> Result<T>;

    /// Index of the smallest value, the first one found if there are ties
    ///
    /// ```rust
    /// # use amrtools_utils::SliceExt;
    /// assert_eq!([3.0, 0.5, 2.2, 0.5].try_argmin(), Ok(1));
    /// assert_eq!([f64::NAN, 0.5, f64::NEG_INFINITY].try_argmin(), Ok(2));
    /// assert!(Vec::<f64>::new().try_argmin().is_err());
    /// ```
    fn try_argmin(&self) -> Result<usize>;

    /// Index of the largest value, the first one found if there are ties
    ///
    /// ```rust
    /// # use amrtools_utils::SliceExt;
    /// assert_eq!([3.0, 0.5, 7.2, 7.2].try_argmax(), Ok(2));
    /// assert_eq!([f64::NEG_INFINITY, 0.5, f64::NAN].try_argmax(), Ok(1));
    /// assert!(Vec::<f64>::new().try_argmax().is_err());
    /// ```
    fn try_argmax(&self) -> Result<usize>;

    /// Arithmetic mean of the values where `mask` is true
    ///
    /// ```rust
    /// # use amrtools_utils::SliceExt;
    /// # use amrtools_utils::Error;
    /// let values = [1.0, 2.0, 3.0, 4.0];
    /// assert_eq!(values.try_masked_mean(&[true, false, true, false]), Ok(2.0));
    ///
    /// // Nothing selected
    /// assert_eq!(
    ///     values.try_masked_mean(&[false; 4]),
    ///     Err(Error::SliceContainsNoValues)
    /// );
    /// ```
    fn try_masked_mean(&self, mask: &[bool]) -> Result<T>;
}

impl SliceExt<f64> for [f64] {
    fn try_min(&self) -> Result<f64> {
        let idx = self.try_argmin()?;
        Ok(self[idx])
    }

    fn try_max(&self) -> Result<f64> {
        let idx = self.try_argmax()?;
        Ok(self[idx])
    }

    fn try_argmin(&self) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::SliceContainsNoValues);
        };

        self.iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx)
            .ok_or(Error::SliceContainsUndefinedValues)
    }

    fn try_argmax(&self) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::SliceContainsNoValues);
        };

        // max_by returns the last of equal elements, so reverse the order
        self.iter()
            .enumerate()
            .rev()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx)
            .ok_or(Error::SliceContainsUndefinedValues)
    }

    fn try_masked_mean(&self, mask: &[bool]) -> Result<f64> {
        if mask.len() != self.len() {
            return Err(Error::MaskLengthMismatch {
                values: self.len(),
                mask: mask.len(),
            });
        }

        let (sum, count) = self
            .iter()
            .zip(mask)
            .filter(|(_, m)| **m)
            .fold((0.0, 0usize), |(s, n), (v, _)| (s + v, n + 1));

        if count == 0 {
            Err(Error::SliceContainsNoValues)
        } else {
            Ok(sum / count as f64)
        }
    }
}
