//! The asynchronous recognition boundary.
//!
//! Each capture request gets a [`CaptureTicket`]. Only the most recent
//! outstanding ticket may apply its result to the session; a result that
//! arrives after a newer request was made is discarded (last request wins).
//! There is no timeout: a recognition that never resolves leaves the capture
//! pending.

use anyhow::{Context, Result};

use crate::session::DigitizationSession;
use crate::traits::{ImageHandle, SheetRecognizer};

/// Identifies one capture request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket(u64);

impl CaptureTicket {
    pub(crate) fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// What happened to a recognition result handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The result became the in-flight sheet.
    Applied,
    /// The request had been superseded or already completed.
    Discarded,
}

/// Recognize `image` and make the result the session's in-flight sheet.
///
/// The session is borrowed mutably for the whole call, so no other session
/// operation can run while recognition is in progress.
pub async fn capture_sheet(
    session: &mut DigitizationSession,
    recognizer: &dyn SheetRecognizer,
    image: &ImageHandle,
) -> Result<CaptureOutcome> {
    let ticket = session.request_capture();
    tracing::debug!(
        recognizer = recognizer.name(),
        %image,
        ticket = ticket.sequence(),
        "capture requested"
    );
    let result = match recognizer.recognize(image).await {
        Ok(result) => result,
        Err(err) => {
            session.cancel_capture(ticket);
            return Err(err)
                .with_context(|| format!("{} failed to read {image}", recognizer.name()));
        }
    };
    Ok(session.complete_capture(ticket, result))
}
