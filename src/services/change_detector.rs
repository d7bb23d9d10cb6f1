use crate::error::Result;
use crate::services::display_server::{DisplayServer, ServerEvent};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    LayoutChanged,
    /// Поглощающее состояние: сбросить его нельзя
    Terminated,
}

/// Следит за уведомлениями RandR и закрытием соединения.
///
/// Задержку на "успокоение" оконного менеджера держит ведущий цикл, а не детектор.
#[derive(Debug)]
pub struct ChangeDetector {
    state: DetectorState,
}

impl ChangeDetector {
    /// Подписывается на события CRTC/Output
    pub fn subscribe<S: DisplayServer + ?Sized>(server: &S) -> Result<Self> {
        server.select_layout_events()?;
        Ok(Self {
            state: DetectorState::Idle,
        })
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn terminate(&mut self) {
        self.state = DetectorState::Terminated;
    }

    /// Ждёт смены состояния не дольше `timeout`.
    ///
    /// Пробуждение без событий нужного класса не прерывает ожидание.
    /// Возвращает достигнутое состояние и сбрасывает его (кроме `Terminated`).
    pub async fn wait<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        timeout: Duration,
    ) -> DetectorState {
        let deadline = Instant::now() + timeout;

        // В буфере соединения могли остаться события после предыдущих запросов
        self.poll(server);

        while self.state == DetectorState::Idle {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            trace!("Ожидаем события {:.2} сек", remaining.as_secs_f64());
            match server.wait_readable(remaining).await {
                Ok(true) => {
                    self.poll(server);
                }
                Ok(false) => break,
                Err(e) => {
                    error!("Ошибка ожидания событий: {}", e);
                    self.state = DetectorState::Terminated;
                }
            }
        }

        self.take()
    }

    /// Неблокирующе вычитывает и классифицирует все накопившиеся события
    pub fn poll<S: DisplayServer + ?Sized>(&mut self, server: &S) -> &mut Self {
        while self.state != DetectorState::Terminated {
            match server.poll_event() {
                Ok(Some(event)) => self.apply(&event),
                Ok(None) => break,
                Err(e) => {
                    error!("Соединение с X-сервером потеряно: {}", e);
                    self.state = DetectorState::Terminated;
                }
            }
        }
        self
    }

    /// Возвращает текущее состояние и сбрасывает его в `Idle`, если это не `Terminated`
    pub fn take(&mut self) -> DetectorState {
        let previous = self.state;
        if self.state != DetectorState::Terminated {
            self.state = DetectorState::Idle;
        }
        previous
    }

    fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Destroyed => {
                debug!("Получено DestroyNotify");
                self.transition(DetectorState::Terminated);
            }
            ServerEvent::CrtcChanged => {
                debug!("Событие изменения CRTC");
                self.transition(DetectorState::LayoutChanged);
            }
            ServerEvent::OutputChanged => {
                debug!("Событие изменения выхода");
                self.transition(DetectorState::LayoutChanged);
            }
            ServerEvent::WindowGone(window) => {
                warn!("Окно 0x{:x} исчезло до обработки запроса", window);
            }
            ServerEvent::ProtocolError(details) => {
                warn!("Ошибка протокола X11: {}", details);
            }
            ServerEvent::Other => {
                trace!("Пропускаем событие");
            }
        }
    }

    fn transition(&mut self, next: DetectorState) {
        if self.state == DetectorState::Terminated {
            return;
        }
        self.state = next;
    }
}
