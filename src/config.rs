use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
    pub poll: PollConfig,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// `HOST:DPY`; по умолчанию берётся `$DISPLAY`
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Как часто запоминать положение окон
    pub interval_secs: i64,
    /// Сколько ждать, пока оконный менеджер отработает смену мониторов
    pub settle_secs: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1) as u64)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            settle_secs: 4,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "warn".to_string(),
                format: "compact".to_string(),
            },
            display: DisplayConfig::default(),
            poll: PollConfig::default(),
            dry_run: false,
        }
    }
}

/// Значения из командной строки, перекрывающие файл и окружение
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub display: Option<String>,
    pub interval_secs: Option<i64>,
    pub dry_run: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P, overrides: Overrides) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл ничего не добавляет
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("WINRECALL_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.apply(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(display) = overrides.display {
            self.display.name = Some(display);
        }
        if let Some(interval) = overrides.interval_secs {
            self.poll.interval_secs = interval;
        }
        if overrides.dry_run {
            self.dry_run = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.poll.interval_secs < 1 {
            anyhow::bail!("Интервал опроса должен быть не меньше 1 секунды");
        }

        Ok(())
    }
}
