use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelThreshold {
    /// Leave a level after a fixed number of correct answers.
    Fixed(u32),
    /// Half of the level's questions, rounded up.
    Auto,
}

impl LevelThreshold {
    pub fn for_level(&self, questions_at_level: usize) -> u32 {
        match *self {
            LevelThreshold::Fixed(n) => n.max(1),
            LevelThreshold::Auto => {
                let half = questions_at_level.div_ceil(2) as u32;
                half.max(1)
            }
        }
    }
}

impl Default for LevelThreshold {
    fn default() -> Self {
        LevelThreshold::Fixed(3)
    }
}

impl FromStr for LevelThreshold {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        if raw == "auto" {
            return Ok(LevelThreshold::Auto);
        }
        let number = raw.strip_prefix("fixed:").unwrap_or(&raw);
        match number.trim().parse::<u32>() {
            Ok(0) => Err("threshold must be at least 1".to_string()),
            Ok(n) => Ok(LevelThreshold::Fixed(n)),
            Err(_) => Err(format!("expected a number, fixed:N or auto, got '{}'", s)),
        }
    }
}

impl std::fmt::Display for LevelThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelThreshold::Fixed(n) => write!(f, "fixed:{}", n),
            LevelThreshold::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected text or json, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriveConfig {
    pub folder_id: String,
    pub service_account_file: Option<PathBuf>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub questions_file: PathBuf,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub admin_token_ttl_minutes: i64,
    pub level_threshold: LevelThreshold,
    pub points_per_correct: u32,
    pub passing_percentage: f64,
    pub public_rps: u32,
    pub reports_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub drive: Option<DriveConfig>,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:8080".to_string(),
            questions_file: PathBuf::from("questions.xlsx"),
            jwt_secret: String::new(),
            admin_username: "admin".to_string(),
            admin_password_hash: String::new(),
            admin_token_ttl_minutes: 480,
            level_threshold: LevelThreshold::default(),
            points_per_correct: 10,
            passing_percentage: 70.0,
            public_rps: 50,
            reports_dir: PathBuf::from("reports"),
            archive_dir: PathBuf::from("evaluations"),
            drive: None,
            cors_origins: Vec::new(),
            log_format: LogFormat::default(),
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Config::default();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            questions_file: PathBuf::from(get_env("QUESTIONS_FILE")?),
            jwt_secret: get_env("JWT_SECRET")?,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password_hash: get_env("ADMIN_PASSWORD_HASH")?,
            admin_token_ttl_minutes: get_env_parse_or(
                "ADMIN_TOKEN_TTL_MINUTES",
                defaults.admin_token_ttl_minutes,
            )?,
            level_threshold: get_env_parse_or("LEVEL_THRESHOLD", defaults.level_threshold)?,
            points_per_correct: get_env_parse_or("POINTS_PER_CORRECT", defaults.points_per_correct)?,
            passing_percentage: get_env_parse_or("PASSING_PERCENTAGE", defaults.passing_percentage)?,
            public_rps: get_env_parse_or("PUBLIC_RPS", defaults.public_rps)?,
            reports_dir: env::var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reports_dir),
            archive_dir: env::var("ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.archive_dir),
            drive: drive_from_env()?,
            cors_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_format: get_env_parse_or("LOG_FORMAT", defaults.log_format)?,
        })
    }
}

pub fn drive_from_env() -> Result<Option<DriveConfig>> {
    let Ok(folder_id) = env::var("DRIVE_FOLDER_ID") else {
        return Ok(None);
    };
    let service_account_file = env::var("GOOGLE_SERVICE_ACCOUNT_FILE").ok().map(PathBuf::from);
    let access_token = env::var("DRIVE_ACCESS_TOKEN").ok();
    if service_account_file.is_none() && access_token.is_none() {
        return Err(Error::Config(
            "DRIVE_FOLDER_ID is set but neither GOOGLE_SERVICE_ACCOUNT_FILE nor DRIVE_ACCESS_TOKEN is"
                .to_string(),
        ));
    }
    Ok(Some(DriveConfig {
        folder_id,
        service_account_file,
        access_token,
    }))
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_threshold_forms() {
        assert_eq!("3".parse::<LevelThreshold>().unwrap(), LevelThreshold::Fixed(3));
        assert_eq!("fixed:5".parse::<LevelThreshold>().unwrap(), LevelThreshold::Fixed(5));
        assert_eq!("AUTO".parse::<LevelThreshold>().unwrap(), LevelThreshold::Auto);
        assert!("0".parse::<LevelThreshold>().is_err());
        assert!("often".parse::<LevelThreshold>().is_err());
    }

    #[test]
    fn auto_threshold_is_half_rounded_up() {
        assert_eq!(LevelThreshold::Auto.for_level(0), 1);
        assert_eq!(LevelThreshold::Auto.for_level(1), 1);
        assert_eq!(LevelThreshold::Auto.for_level(5), 3);
        assert_eq!(LevelThreshold::Auto.for_level(8), 4);
        assert_eq!(LevelThreshold::Fixed(3).for_level(100), 3);
    }

    #[test]
    fn parses_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
