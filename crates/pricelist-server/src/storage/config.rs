use std::env;
use std::path::PathBuf;

/// Default directory accepted uploads are written to.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";

/// Default upload size limit (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    /// Largest accepted upload in bytes
    pub max_file_size: usize,
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_file_size: env::var("UPLOAD_MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upload_dir.as_os_str().is_empty() {
            anyhow::bail!("UPLOAD_DIR cannot be empty");
        }
        if self.max_file_size == 0 {
            anyhow::bail!("UPLOAD_MAX_FILE_SIZE must be greater than 0");
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default() {
        let config = StorageConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("UPLOAD_DIR", "/var/lib/pricelist/uploads");
        env::set_var("UPLOAD_MAX_FILE_SIZE", "1024");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/var/lib/pricelist/uploads"));
        assert_eq!(config.max_file_size, 1024);

        env::remove_var("UPLOAD_DIR");
        env::remove_var("UPLOAD_MAX_FILE_SIZE");
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let config = StorageConfig {
            max_file_size: 0,
            ..StorageConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
