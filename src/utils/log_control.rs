use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::{reload, EnvFilter, Registry};

pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Уровни логирования, выбранные по количеству флагов `-v`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verbosity {
    /// Уровень при запуске
    pub initial: String,
    /// Уровень, к которому возвращает выключение отладки по SIGUSR1
    pub base: String,
    pub debug: bool,
}

impl Verbosity {
    pub fn from_count(count: u8, configured: &str) -> Self {
        let (initial, base) = match count {
            0 => (configured, configured),
            1 => ("info", "info"),
            2 => ("debug", "info"),
            _ => ("trace", "info"),
        };
        Self {
            initial: initial.to_string(),
            base: base.to_string(),
            debug: matches!(initial, "debug" | "trace"),
        }
    }
}

/// Переключение отладочного логирования во время работы
pub struct LogControl {
    handle: FilterHandle,
    base: String,
    debug_enabled: AtomicBool,
}

impl LogControl {
    pub fn new(handle: FilterHandle, verbosity: Verbosity) -> Self {
        Self {
            handle,
            base: verbosity.base,
            debug_enabled: AtomicBool::new(verbosity.debug),
        }
    }

    /// Возвращает `true`, если отладка теперь включена
    pub fn toggle_debug(&self) -> Result<bool, reload::Error> {
        let enable = !self.debug_enabled.load(Ordering::Relaxed);
        let directive = if enable { "debug" } else { self.base.as_str() };

        self.handle.reload(EnvFilter::new(directive))?;
        self.debug_enabled.store(enable, Ordering::Relaxed);
        Ok(enable)
    }

    /// SIGUSR1 включает и выключает отладочное логирование
    pub fn listen_for_toggle(self) -> std::io::Result<()> {
        let mut usr1 = signal(SignalKind::user_defined1())?;

        tokio::spawn(async move {
            while usr1.recv().await.is_some() {
                match self.toggle_debug() {
                    Ok(true) => info!("Отладочное логирование включено"),
                    Ok(false) => info!("Отладочное логирование выключено"),
                    Err(e) => warn!("Не удалось переключить уровень логирования: {}", e),
                }
            }
        });

        Ok(())
    }
}
