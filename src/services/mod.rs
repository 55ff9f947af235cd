pub mod csv_sink;
pub mod field_extractor;
pub mod pacing;

pub use csv_sink::CsvSink;
pub use field_extractor::FieldExtractor;
pub use pacing::Pacer;
