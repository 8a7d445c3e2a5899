pub mod aggregate;
pub mod config;
pub mod display;
pub mod pipeline;
pub mod record;
pub mod source;

pub use aggregate::{
    aggregate, aggregate_records, AggregateOptions, Aggregation, DailyPoint, MonthlySummary,
    SkippedRow,
};
pub use config::{ColorScheme, Config, ConfigError};
pub use display::{temperature_range, years, DisplayMode};
pub use pipeline::{load_and_aggregate, run, PipelineError, Render};
pub use record::{DailyRecord, RawRow, RecordError};
pub use source::{read_rows, CsvBuffer, CsvFile, DataSource, LoadError};
