use polaris::{Application, ConfigSource, FrameworkError, IniConfig, PolarisConfig};
use std::path::Path;

/// INI configuration plus this application's routes
pub struct AppConfig {
    ini: IniConfig,
}

impl AppConfig {
    pub fn new(path: &Path) -> Self {
        Self {
            ini: IniConfig::new(path),
        }
    }
}

impl ConfigSource for AppConfig {
    fn load_config(&mut self) -> Result<(), FrameworkError> {
        self.ini.load_config()
    }

    fn basic_config(&self) -> &PolarisConfig {
        self.ini.basic_config()
    }

    fn route_map(&self, app: &mut Application) -> Result<(), FrameworkError> {
        crate::routes::register(app);
        Ok(())
    }
}
