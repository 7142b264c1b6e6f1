//! External collaborators the concierge calls around the core: QR rendering
//! after a confirmed booking and speech transcription before routing.

use anyhow::{Context, Result};
use bml_core::{BookingRecord, Language, QrArtifact};

pub trait QrRenderer: Send + Sync {
    fn render(&self, record: &BookingRecord) -> Result<QrArtifact>;
}

/// Hands the flat booking payload back as JSON; a transport turns it into an
/// image.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadQrRenderer;

impl QrRenderer for JsonPayloadQrRenderer {
    fn render(&self, record: &BookingRecord) -> Result<QrArtifact> {
        let handle = record
            .qr_json()
            .with_context(|| format!("failed encoding qr payload for {}", record.booking_id))?;

        Ok(QrArtifact {
            handle,
            media_type: "application/json".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language: Language,
}

pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &[u8]) -> Result<Transcript>;
}
