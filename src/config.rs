/// Capacity and formatting limits for a session.
///
/// The binding store enforces the capacity fields; services read
/// `max_dimension` before building a matrix; output rounds to `decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of plain matrices in the binding store
    pub max_matrices: usize,

    /// Maximum number of tables (dataframes) in the binding store
    pub max_tables: usize,

    /// Maximum length of a binding name
    pub max_name_length: usize,

    /// Maximum row or column count of a matrix created by a function
    pub max_dimension: usize,

    /// Decimal places shown when printing numbers
    pub decimals: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_matrices: 16,
            max_tables: 4,
            max_name_length: 64,
            max_dimension: 64,
            decimals: 6,
        }
    }
}
