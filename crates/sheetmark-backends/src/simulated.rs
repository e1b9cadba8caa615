//! Stand-in recognizer that fabricates plausible sheets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sheetmark_core::model::{mark_keys, EntryStatus, Question};
use sheetmark_core::session::{roll_suffix, DigitizationSession};
use sheetmark_core::traits::{ImageHandle, RecognitionResult, SheetRecognizer};

/// Latency of one simulated recognition.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

/// Recognizer that waits, then reports the next queued roll suffix with
/// random marks.
///
/// Suffixes are handed out round robin. Each mark key gets a value in
/// `0..=max` for its slot, drawn from a seeded RNG so runs are repeatable.
pub struct SimulatedRecognizer {
    keys: Vec<(String, u32)>,
    suffixes: Vec<String>,
    next: AtomicUsize,
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedRecognizer {
    pub fn new(questions: &[Question], suffixes: Vec<String>) -> Self {
        Self {
            keys: mark_keys(questions),
            suffixes,
            next: AtomicUsize::new(0),
            delay: DEFAULT_DELAY,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Queue the roll suffixes of every student still pending in `session`.
    pub fn for_session(session: &DigitizationSession) -> Self {
        let suffixes = session
            .entries()
            .iter()
            .filter(|e| e.status == EntryStatus::Pending)
            .map(|e| roll_suffix(&e.ktu_id))
            .collect();
        Self::new(&session.config().questions, suffixes)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn next_suffix(&self) -> String {
        if self.suffixes.is_empty() {
            return String::new();
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.suffixes.len();
        self.suffixes[index].clone()
    }
}

#[async_trait]
impl SheetRecognizer for SimulatedRecognizer {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn recognize(&self, image: &ImageHandle) -> anyhow::Result<RecognitionResult> {
        tokio::time::sleep(self.delay).await;

        let detected_roll_suffix = self.next_suffix();
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("simulated recognizer rng poisoned"))?;
        let marks = self
            .keys
            .iter()
            .map(|(key, max)| (key.clone(), i64::from(rng.gen_range(0..=*max))))
            .collect();

        tracing::debug!(%image, suffix = %detected_roll_suffix, "simulated recognition");
        Ok(RecognitionResult {
            detected_roll_suffix,
            marks,
        })
    }
}
