pub mod field_spec;
pub mod loaders;
pub mod request;
pub mod row;
pub mod run;

pub use field_spec::{FieldKind, FieldSpec};
pub use loaders::{load_job_files, load_run_request};
pub use request::{AppendConfig, NavConfig, RunOptions, RunRequest, SearchConfig};
pub use row::ExtractionRow;
pub use run::{Run, RunStats, RunStatus};
