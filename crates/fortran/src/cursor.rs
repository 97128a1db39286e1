/// Running count of everything that precedes a value in a record stream
///
/// Fortran sequential unformatted files are a flat sequence of records, each
/// bracketed by a 4-byte length marker before and after the payload.
///
/// ```text
/// <4 byte length> <payload> <4 byte length>
/// ```
///
/// The cursor counts what has already been consumed so that the absolute byte
/// offset of the next payload can be computed directly:
///
/// | Field    | Size per unit | Meaning                                   |
/// | -------- | ------------- | ----------------------------------------- |
/// | `ninteg` | 4 bytes       | 32-bit integers                           |
/// | `nfloat` | 8 bytes       | 64-bit floats                             |
/// | `nlines` | 8 bytes       | complete records, i.e. pairs of markers   |
/// | `nstrin` | 1 byte        | characters of string payloads             |
/// | `nquadr` | 16 bytes      | quad precision values                     |
///
/// ```rust
/// # use amrtools_fortran::RecordCursor;
/// // Two records of one integer each have been passed
/// let cursor = RecordCursor {
///     ninteg: 2,
///     nlines: 2,
///     ..Default::default()
/// };
/// // 4*2 + 8*2 + 4 for the leading marker of the third record
/// assert_eq!(cursor.offset(), 28);
/// ```
///
/// Readers of multi-part files keep one cursor per file and thread it forward
/// through their loops. A cursor is plain data, so a fresh one is created for
/// every file scanned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordCursor {
    /// 4-byte integers already consumed
    pub ninteg: usize,
    /// 8-byte floats already consumed
    pub nfloat: usize,
    /// Complete records already consumed (8 bytes of markers each)
    pub nlines: usize,
    /// String bytes already consumed
    pub nstrin: usize,
    /// 16-byte quad precision values already consumed
    pub nquadr: usize,
}

impl RecordCursor {
    /// Cursor positioned at the first payload of a file
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute byte offset of the current payload
    ///
    /// `4*ninteg + 8*(nlines + nfloat) + nstrin + 16*nquadr + 4`
    pub fn offset(&self) -> usize {
        4 * self.ninteg + 8 * (self.nlines + self.nfloat) + self.nstrin + 16 * self.nquadr + 4
    }

    /// Step over `records` records holding `len` integers each
    ///
    /// ```rust
    /// # use amrtools_fortran::RecordCursor;
    /// let mut cursor = RecordCursor::new();
    /// cursor.skip_int_records(3, 1);
    /// assert_eq!(cursor, RecordCursor { ninteg: 3, nlines: 3, ..Default::default() });
    /// ```
    pub fn skip_int_records(&mut self, records: usize, len: usize) -> &mut Self {
        self.ninteg += records * len;
        self.nlines += records;
        self
    }

    /// Step over `records` records holding `len` floats each
    pub fn skip_float_records(&mut self, records: usize, len: usize) -> &mut Self {
        self.nfloat += records * len;
        self.nlines += records;
        self
    }

    /// Step over `records` records holding `len` characters each
    pub fn skip_string_records(&mut self, records: usize, len: usize) -> &mut Self {
        self.nstrin += records * len;
        self.nlines += records;
        self
    }

    /// Step over `records` records holding `len` quad precision values each
    pub fn skip_quad_records(&mut self, records: usize, len: usize) -> &mut Self {
        self.nquadr += records * len;
        self.nlines += records;
        self
    }
}
