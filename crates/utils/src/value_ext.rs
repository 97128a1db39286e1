use crate::f;

/// Extends primitives with more specific formatting options
pub trait ValueExt {
    /// Scientific number formatting with a signed, padded exponent
    ///
    /// The `{:e}` output of the standard library drops the exponent sign and
    /// padding, which makes columns of field summaries ragged.
    ///
    /// ```rust
    /// # use amrtools_utils::ValueExt;
    /// assert_eq!((-1.0).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!(1.5e-12.sci(3, 2), "1.500e-12".to_string());
    /// assert_eq!(2.0e33.sci(2, 3), "2.00e+033".to_string());
    /// ```
    ///
    /// Non-finite values are passed through as their `Display` output.
    ///
    /// ```rust
    /// # use amrtools_utils::ValueExt;
    /// assert_eq!(f64::NAN.sci(3, 2), "NaN".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl ValueExt for f64 {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        if !self.is_finite() {
            return f!("{self}");
        }

        let mut num = f!("{:.precision$e}", self, precision = precision);
        let exp = match num.find('e') {
            Some(idx) => num.split_off(idx),
            None => return num,
        };

        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };

        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }
}
