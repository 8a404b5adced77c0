pub mod csv;
pub mod export;

pub use crate::csv::{
    apply_type_sign, canonicalize, import_csv, parse_amount, read_raw_rows, ColumnMap, CsvError,
    CsvReadOptions, RawRow,
};
pub use export::{to_csv_string, write_csv, CSV_TEMPLATE, EXPORT_HEADER};
