use crate::config::PollConfig;
use crate::error::Result;
use crate::services::change_detector::{ChangeDetector, DetectorState};
use crate::services::config_store::ConfigStore;
use crate::services::display_server::DisplayServer;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Ведущий цикл: опрос хранилища, ожидание событий, пауза после смены мониторов.
///
/// Владеет соединением единолично; хранилище и детектор получают его по ссылке.
pub struct Daemon<S> {
    server: S,
    store: ConfigStore,
    detector: ChangeDetector,
    interval: Duration,
    settle: Duration,
}

impl<S: DisplayServer> Daemon<S> {
    /// Без подписки на события RandR работать бессмысленно, поэтому ошибка фатальна
    pub fn new(server: S, poll: &PollConfig) -> Result<Self> {
        let detector = ChangeDetector::subscribe(&server)?;
        Ok(Self {
            server,
            store: ConfigStore::new(),
            detector,
            interval: poll.interval(),
            settle: poll.settle(),
        })
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    #[allow(dead_code)]
    pub fn server(&self) -> &S {
        &self.server
    }

    /// Работает до `Terminated` или до завершения `shutdown`
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Отслеживание окон запущено (интервал {} сек, пауза после смены мониторов {} сек)",
            self.interval.as_secs(),
            self.settle.as_secs()
        );

        let mut changes_pending = true;
        loop {
            if self.detector.state() == DetectorState::Terminated {
                debug!("Детектор завершён, выходим из цикла");
                break;
            }

            if let Err(e) = self.store.poll(&self.server, changes_pending) {
                if e.is_fatal() {
                    error!("Цикл опроса прерван: {}", e);
                } else {
                    warn!("Цикл опроса завершён с ошибкой: {}", e);
                }
            }
            changes_pending = false;

            let state = tokio::select! {
                state = self.detector.wait(&self.server, self.interval) => Some(state),
                _ = &mut shutdown => None,
            };
            let Some(state) = state else {
                info!("Получен сигнал завершения");
                self.detector.terminate();
                break;
            };

            if state == DetectorState::LayoutChanged {
                debug!("Ожидаются изменения конфигурации мониторов");
                changes_pending = true;

                // Даём оконному менеджеру самому разобраться с новыми мониторами
                let settled = tokio::select! {
                    _ = tokio::time::sleep(self.settle) => true,
                    _ = &mut shutdown => false,
                };
                if !settled {
                    info!("Получен сигнал завершения");
                    self.detector.terminate();
                    break;
                }

                // Полный опрос уже запланирован: события, пришедшие во время паузы, не нужны
                self.detector.poll(&self.server).take();
            }
        }

        info!(
            "Отслеживание окон остановлено (запомнено расстановок мониторов: {})",
            self.store.layout_count()
        );
    }
}
