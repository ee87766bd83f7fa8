use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub server_name: String,
    pub motd: String,
    pub max_players: usize,
    pub level_name: String,
    pub level_width: u16,
    pub level_height: u16,
    pub level_length: u16,
    /// Interval between position sync passes.
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 25565,
            server_name: "A Cobble Server".into(),
            motd: "Welcome!".into(),
            max_players: 32,
            level_name: "main".into(),
            level_width: 128,
            level_height: 64,
            level_length: 128,
            tick_interval_ms: 100,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ServerConfig = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.level_width == 0 || self.level_height == 0 || self.level_length == 0 {
            anyhow::bail!(
                "level dimensions must be non-zero, got {}x{}x{}",
                self.level_width,
                self.level_height,
                self.level_length
            );
        }
        // 255 is reserved for the player itself
        if self.max_players > 255 {
            anyhow::bail!("max_players is at most 255, got {}", self.max_players);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("server.toml")).unwrap();
        assert_eq!(config.port, 25565);
        assert_eq!(config.max_players, 32);
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 25570\nmotd = \"Hello there\"\nlevel_height = 32").unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 25570);
        assert_eq!(config.motd, "Hello there");
        assert_eq!(config.level_height, 32);
        assert_eq!(config.level_width, 128);
        assert_eq!(config.bind, "0.0.0.0");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "level_width = 0").unwrap();
        assert!(ServerConfig::load(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_players = 300").unwrap();
        assert!(ServerConfig::load(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        assert!(ServerConfig::load(file.path()).is_err());
    }
}
