#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

pub mod analysis;
pub mod config;
pub mod doctor;
pub mod gateway;
pub mod health;
pub mod media;
pub mod prompt;
pub mod providers;
pub mod reports;
pub mod session;
pub mod wire;

pub use config::Config;
