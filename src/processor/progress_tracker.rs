use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressTracker {
    pb: ProgressBar,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);

        Self {
            pb,
            start_time: Instant::now(),
        }
    }

    pub fn start(&mut self, msg: &str) {
        self.pb.set_message(msg.to_string());
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    pub fn update(&mut self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn log_fetched(&mut self, count: usize) {
        self.pb
            .set_message(format!("Fetched {count} ratings, writing CSV..."));
    }

    pub fn complete(&self, msg: &str) {
        self.pb.finish_with_message(format!(
            "{msg} in {:.2} seconds",
            self.start_time.elapsed().as_secs_f32()
        ));
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
