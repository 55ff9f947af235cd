pub mod toml_loader;

pub use toml_loader::{load_job_files, load_run_request};
