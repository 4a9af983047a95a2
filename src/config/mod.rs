pub mod schema;

pub use schema::{
    AvatarConfig, Config, GenerativeConfig, MediaConfig, ReportsConfig, ServerConfig,
    SessionConfig, SynthesisConfig, TranscriptionConfig,
};
