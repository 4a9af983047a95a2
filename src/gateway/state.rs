use std::sync::Arc;

use crate::config::Config;
use crate::media::ArtifactStore;
use crate::providers::{AvatarClient, SpeechSynthesizer, TextGenerator, Transcriber};
use crate::reports::ReportArchive;
use crate::session::SessionStore;

/// Shared handles cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub avatar: Arc<AvatarClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub media: Arc<ArtifactStore>,
    pub reports: Arc<ReportArchive>,
}
