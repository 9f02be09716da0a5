use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use csv::Writer;

use crate::config::OutputConfig;
use crate::error::AppError;
use crate::session::RatingItem;

pub struct CsvGenerator {
    output_path: PathBuf,
}

impl CsvGenerator {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            output_path: config.path,
        }
    }

    pub fn generate(&self, items: &[RatingItem]) -> Result<(), AppError> {
        let file = File::create(&self.output_path)?;
        write_ratings(file, items)
    }
}

fn write_ratings<W: Write>(writer: W, items: &[RatingItem]) -> Result<(), AppError> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(["title", "movie_id", "rating_type", "your_rating", "date"])?;

    for item in items {
        wtr.write_record([
            item.title.clone().unwrap_or_default(),
            item.movie_id.map(|id| id.to_string()).unwrap_or_default(),
            item.rating_type.clone().unwrap_or_default(),
            item.your_rating.map(|r| r.to_string()).unwrap_or_default(),
            item.date.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
