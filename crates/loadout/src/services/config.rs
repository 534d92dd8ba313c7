use super::types::SiteConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

/// File name of the site configuration, at the project root
pub const CONFIG_FILE: &str = "loadout.toml";

/// Service for configuration management
pub struct ConfigService {
    project_root: PathBuf,
    config_path: PathBuf,
}

impl ConfigService {
    /// Create a new config service
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: project_root.join(CONFIG_FILE),
        }
    }

    /// Initialize configuration with defaults
    pub fn init(&self) -> Result<SiteConfig> {
        let config = SiteConfig::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Load configuration from file, with env var overrides (LOADOUT_ prefix, __ separator).
    /// A missing file is not an error: defaults apply.
    pub fn load(&self) -> Result<SiteConfig> {
        let mut figment = Figment::from(Serialized::defaults(SiteConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment = figment.merge(Env::prefixed("LOADOUT_").split("__"));

        let config: SiteConfig = figment.extract().context("Failed to load configuration")?;
        Ok(config)
    }

    /// Serialize a configuration the way it is stored on disk
    pub fn render(&self, config: &SiteConfig) -> Result<String> {
        toml::to_string_pretty(config).context("Failed to serialize config")
    }

    /// Save configuration to file
    pub fn save(&self, config: &SiteConfig) -> Result<()> {
        let content = self.render(config)?;

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        std::fs::write(&self.config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Get a configuration value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.load()?;
        match key {
            "content.root" => Ok(config.content.root),
            "client.base_url" => Ok(config.client.base_url.unwrap_or_default()),
            "client.page_size" => Ok(config.client.page_size.to_string()),
            "client.batch_size" => Ok(config.client.batch_size.to_string()),
            "views.endpoint" => Ok(config.views.endpoint.unwrap_or_default()),
            _ => Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
    }

    /// Set a configuration value by dotted key
    pub fn set(&self, key: &str, value: String) -> Result<()> {
        let mut config = self.load()?;
        match key {
            "content.root" => config.content.root = value,
            "client.base_url" => config.client.base_url = Some(value),
            "client.page_size" => config.client.page_size = parse_size(key, &value)?,
            "client.batch_size" => config.client.batch_size = parse_size(key, &value)?,
            "views.endpoint" => config.views.endpoint = Some(value),
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
        self.save(&config)?;
        Ok(())
    }

    /// Resolve the content directory from config
    pub fn resolve_content_root(&self) -> Result<PathBuf> {
        let config = self.load()?;
        Ok(self.project_root.join(&config.content.root))
    }

    /// Check if configuration exists
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }
}

fn parse_size(key: &str, value: &str) -> Result<usize> {
    let size: usize = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive integer", key))?;
    if size == 0 {
        return Err(anyhow::anyhow!("{} must be greater than zero", key));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());

        let config = service.init().unwrap();
        assert_eq!(config.content.root, "content");
        assert_eq!(config.client.page_size, 3);
    }

    #[test]
    fn init_creates_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        service.init().unwrap();

        assert!(service.exists());
        assert!(temp_dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn load_without_init_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        let config = service.load().unwrap();
        assert_eq!(config.content.root, "content");
        assert_eq!(config.client.batch_size, 12);
        assert!(config.views.endpoint.is_none());
    }

    #[test]
    fn load_merges_partial_file_over_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[client]\npage_size = 6\n",
        )
        .unwrap();
        let service = ConfigService::new(temp_dir.path());

        let config = service.load().unwrap();
        assert_eq!(config.client.page_size, 6);
        assert_eq!(config.client.batch_size, 12);
        assert_eq!(config.content.root, "content");
    }

    #[test]
    fn set_and_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        service.init().unwrap();

        service
            .set("views.endpoint", "https://views.example.com/hits".to_string())
            .unwrap();
        service.set("client.batch_size", "24".to_string()).unwrap();

        assert_eq!(
            service.get("views.endpoint").unwrap(),
            "https://views.example.com/hits"
        );
        assert_eq!(service.get("client.batch_size").unwrap(), "24");
    }

    #[test]
    fn set_rejects_zero_size() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        assert!(service.set("client.page_size", "0".to_string()).is_err());
        assert!(service.set("client.page_size", "many".to_string()).is_err());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        assert!(service.get("model.name").is_err());
        assert!(service.set("model.name", "x".to_string()).is_err());
    }

    #[test]
    fn resolve_content_root_joins_project_root() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        service.set("content.root", "site/content".to_string()).unwrap();

        let root = service.resolve_content_root().unwrap();
        assert_eq!(root, temp_dir.path().join("site/content"));
    }

    #[test]
    fn exists_returns_false_before_init() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path());
        assert!(!service.exists());
    }
}
