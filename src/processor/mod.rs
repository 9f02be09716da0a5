pub mod csv_generator;
pub mod progress_tracker;

pub use csv_generator::CsvGenerator;
pub use progress_tracker::ProgressTracker;
