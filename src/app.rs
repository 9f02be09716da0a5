use tracing::info;

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::processor::{CsvGenerator, ProgressTracker};
use crate::session::{Credentials, Netflix};

pub struct App {
    config: AppConfig,
    profile: Option<String>,
    progress: ProgressTracker,
    generator: CsvGenerator,
}

impl App {
    pub fn new(config: AppConfig, cli_args: &CliArgs) -> Self {
        let generator = CsvGenerator::new(config.output.clone());
        Self {
            config,
            profile: cli_args.profile.clone(),
            progress: ProgressTracker::new(),
            generator,
        }
    }

    pub async fn run(&mut self) -> Result<(), AppError> {
        let mut netflix = Netflix::with_base_url(self.config.netflix.base_url.clone())?;

        self.progress.start("Logging in");
        let credentials = Credentials {
            email: self.config.netflix.email.clone(),
            password: self.config.netflix.password.clone(),
        };
        netflix.login(Some(credentials)).await?;

        if let Some(name) = &self.profile {
            self.progress.update(&format!("Switching to profile {name}"));
            let profiles = netflix.get_profiles()?;
            let profile = profiles
                .iter()
                .find(|p| p.first_name.as_deref() == Some(name.as_str()))
                .ok_or_else(|| AppError::UnknownProfile(name.clone()))?;
            netflix.switch_profile(&profile.guid).await?;
        }

        self.progress.update("Fetching rating history");
        let ratings = netflix.get_rating_history().await?;
        self.progress.log_fetched(ratings.len());
        info!(count = ratings.len(), "rating history fetched");

        self.generator.generate(&ratings)?;
        self.progress.complete("Export complete");
        Ok(())
    }
}
