use std::str::FromStr;

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

use crate::store::MAX_BATCH_OPS;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub verification: VerificationSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub name: String,
    pub app_url: String,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct StoreSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub notification_page_size: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_batch_ops: usize,
    pub rollback_on_failure: bool,
}

#[derive(Deserialize, Clone)]
pub struct VerificationSettings {
    pub secret: String,
}

impl StoreSettings {
    /// Migration batches stay at 98% of the store's hard batch limit;
    /// running flush against the exact maximum invites off-by-one
    /// rejections.
    pub fn migration_batch_cap(&self) -> usize {
        let cap = self.max_batch_ops * 98 / 100;
        cap.clamp(1, MAX_BATCH_OPS)
    }
}

impl Settings {
    /// In-process defaults for the demo binary and tests, where no
    /// config directory exists.
    pub fn for_demo() -> Self {
        Self {
            application: ApplicationSettings {
                name: "hourlog".to_string(),
                app_url: "http://localhost:3000".to_string(),
            },
            store: StoreSettings {
                notification_page_size: 50,
                max_batch_ops: MAX_BATCH_OPS,
                rollback_on_failure: false,
            },
            verification: VerificationSettings {
                secret: "demo-secret-do-not-ship".to_string(),
            },
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .expect("Failed to parse APP_ENVIRONMENT");
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("HOURLOG")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
