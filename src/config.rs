use config::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::cli::CliArgs;
use crate::error::AppError;
use crate::session;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub netflix: NetflixConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NetflixConfig {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

fn default_base_url() -> String {
    session::BASE_URL.to_string()
}

impl AppConfig {
    pub fn load_with_cli_args(cli_args: &CliArgs) -> Result<Self, AppError> {
        let mut builder =
            Config::builder().add_source(config::File::with_name("config").required(false));

        if let Some(config_path) = &cli_args.config {
            builder = builder.add_source(config::File::from(config_path.as_path()));
        }
        if let Some(output_path) = &cli_args.output {
            builder =
                builder.set_override("output.path", output_path.to_string_lossy().as_ref())?;
        }

        let app_config: AppConfig = builder.build()?.try_deserialize()?;

        app_config.validate().map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Configuration validation failed: {e}"
            )))
        })?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        Validate::validate(self)
    }
}
