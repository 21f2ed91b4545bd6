//! Runtime configuration for the Leibniz server.
//!
//! Every flag can also be set from the environment, so a bare `PORT=8080`
//! works the same as `--port 8080`. A `.env` file in the working directory
//! fills in variables the environment does not already set.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

pub const DEFAULT_PORT: u16 = 5000;
pub const TERMS_FILE: &str = "terms.db";
pub const PI_FILE: &str = "pi.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "leibniz-web", version, about = "Memoized Gregory-Leibniz pi server")]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "LEIBNIZ_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory holding terms.db and pi.db
    #[arg(long, env = "LEIBNIZ_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Keep everything in memory (nothing survives a restart)
    #[arg(long, env = "LEIBNIZ_IN_MEMORY")]
    pub in_memory: bool,

    #[arg(long, env = "LEIBNIZ_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    /// Parse the process arguments after loading `./.env`. Exits on bad flags.
    pub fn load() -> Self {
        Self::load_from(Path::new(".env"), std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Load `env_file` (if it exists) into the environment, then parse `args`.
    pub fn load_from<I, T>(env_file: &Path, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        // Missing file is the normal case; variables already set win.
        let _ = dotenvy::from_path(env_file);
        Self::try_parse_from(args)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn terms_path(&self) -> PathBuf {
        self.data_dir.join(TERMS_FILE)
    }

    pub fn pi_path(&self) -> PathBuf {
        self.data_dir.join(PI_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
            data_dir: PathBuf::from("data"),
            in_memory: false,
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["leibniz-web"]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(!config.in_memory);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "leibniz-web",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--data-dir",
            "/tmp/pi",
            "--in-memory",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.terms_path(), PathBuf::from("/tmp/pi/terms.db"));
        assert_eq!(config.pi_path(), PathBuf::from("/tmp/pi/pi.db"));
        assert!(config.in_memory);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_env_file_supplies_port() {
        let preset = std::env::var("PORT").ok();
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "PORT=6123\n").unwrap();

        let config = Config::load_from(&env_file, ["leibniz-web"]).unwrap();
        match preset {
            Some(port) => assert_eq!(config.port.to_string(), port),
            None => assert_eq!(config.port, 6123),
        }

        // Flags still override the file.
        let config = Config::load_from(&env_file, ["leibniz-web", "--port", "7000"]).unwrap();
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join(".env"), ["leibniz-web", "--port", "5001"]);
        assert_eq!(config.unwrap().port, 5001);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Config::try_parse_from(["leibniz-web", "--port", "not-a-port"]).is_err());
    }
}
