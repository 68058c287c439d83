/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct AnalyticsOptions {
    pub top_k: usize,                   // entries returned by each ranking query
    pub batch_size: usize,              // rows per decoded/read Arrow batch
    pub progress: bool,                 // show progress bars
    pub progress_label: Option<String>, // optional prefix for progress labels

    // IO tuning
    pub read_buffer_bytes: usize, // BufReader capacity for the JSONL source
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            batch_size: 8 * 1024,
            progress: true,
            progress_label: None,
            read_buffer_bytes: 256 * 1024,
        }
    }
}

impl AnalyticsOptions {
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }
    pub fn with_batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }

    /// Compose the label shown on a progress bar for one phase.
    pub(crate) fn label_for(&self, phase: &str) -> String {
        match &self.progress_label {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}: {phase}"),
            _ => phase.to_string(),
        }
    }
}
