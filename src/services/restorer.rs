use crate::error::{ErrorKind, Result};
use crate::model::WindowSnapshot;
use crate::services::display_server::DisplayServer;
use tracing::{debug, error, warn};

/// Итог одного прохода восстановления
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    /// Отправленные запросы; подтверждения оконный менеджер не присылает
    pub repositioned: usize,
    /// Панели, липкие и полноэкранные окна
    pub ineligible: usize,
    /// Окна, исчезновение которых обнаружено при отправке запроса.
    ///
    /// X-сервер принимает запрос к несуществующему окну и присылает BadWindow
    /// позже, событием `ServerEvent::WindowGone`; такое окно считается в
    /// `repositioned`, а предупреждение пишет детектор изменений.
    pub vanished: usize,
    /// Прочие ошибки для отдельных окон
    pub failed: usize,
}

/// Отправляет запрос на возврат окна в сохранённую геометрию.
///
/// Не проверяет `should_reposition`; после пачки запросов нужен `flush`.
pub fn reposition<S: DisplayServer + ?Sized>(server: &S, snapshot: &WindowSnapshot) -> Result<()> {
    let request = snapshot.moveresize_request();
    debug!("_NET_MOVERESIZE_WINDOW {:?} для {}", request.data, snapshot);
    server.send_move_resize(&request)
}

/// Восстанавливает все подходящие окна в сохранённом порядке.
///
/// Ошибка одного окна не прерывает проход, ошибка соединения прерывает его.
/// Соединение сбрасывается ровно один раз.
pub fn restore<S: DisplayServer + ?Sized>(
    server: &S,
    snapshots: &[WindowSnapshot],
) -> Result<RestoreReport> {
    let mut report = RestoreReport::default();

    for snapshot in snapshots {
        if !snapshot.should_reposition() {
            debug!("Пропускаем окно {}", snapshot);
            report.ineligible += 1;
            continue;
        }

        match reposition(server, snapshot) {
            Ok(()) => report.repositioned += 1,
            Err(e) if e.kind() == ErrorKind::TransientWindow => {
                warn!("Окна {} больше нет: {}", snapshot, e);
                report.vanished += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Внутренняя ошибка при перемещении окна {}: {}", snapshot, e);
                report.failed += 1;
            }
        }
    }

    server.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutputGeometry, WindowGeometry, WindowState, ALL_DESKTOPS};
    use crate::services::display_server::fake::FakeServer;
    use crate::services::display_server::ServerEvent;

    fn server_with(windows: &[WindowSnapshot]) -> FakeServer {
        let server = FakeServer::with_layout(&[OutputGeometry::new("eDP", 0, 0, 1920, 1080)]);
        for window in windows {
            // Живое окно стоит в другом месте, чем сохранённое
            let mut live = window.clone();
            live.geometry = WindowGeometry::new(500, 500, 10, 10);
            server.add_window(live);
        }
        server
    }

    #[test]
    fn test_round_trip_geometry() {
        let stored = vec![WindowSnapshot::new(0x10, WindowGeometry::new(10, 20, 800, 600))];
        let server = server_with(&stored);

        let report = restore(&server, &stored).unwrap();

        assert_eq!(report.repositioned, 1);
        let sent = server.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].window, 0x10);
        assert_eq!(sent[0].geometry(), WindowGeometry::new(10, 20, 800, 600));
        assert_eq!(server.flushes(), 1);
    }

    #[test]
    fn test_negative_origin_is_clamped() {
        let stored = vec![WindowSnapshot::new(0x10, WindowGeometry::new(-5, 3, 800, 600))];
        let server = server_with(&stored);

        restore(&server, &stored).unwrap();

        assert_eq!(server.sent()[0].geometry(), WindowGeometry::new(0, 3, 800, 600));
    }

    #[test]
    fn test_ineligible_windows_are_never_sent() {
        let geom = WindowGeometry::new(0, 0, 300, 300);
        let stored = vec![
            WindowSnapshot::new(1, geom).with_desktop(ALL_DESKTOPS),
            WindowSnapshot::new(2, geom).with_state(WindowState::Sticky),
            WindowSnapshot::new(3, geom).with_state(WindowState::Fullscreen),
            WindowSnapshot::new(4, geom).with_desktop(1),
        ];
        let server = server_with(&stored);

        let report = restore(&server, &stored).unwrap();

        assert_eq!(report.ineligible, 3);
        assert_eq!(report.repositioned, 1);
        let sent: Vec<_> = server.sent().iter().map(|r| r.window).collect();
        assert_eq!(sent, vec![4]);
    }

    #[test]
    fn test_per_window_failures_do_not_abort_batch() {
        let geom = WindowGeometry::new(0, 0, 300, 300);
        let stored = vec![
            WindowSnapshot::new(1, geom),
            WindowSnapshot::new(2, geom),
            WindowSnapshot::new(3, geom),
            WindowSnapshot::new(4, geom),
        ];
        let server = server_with(&stored);
        server.vanish_window(2);
        server.break_window(3);

        let report = restore(&server, &stored).unwrap();

        assert_eq!(
            report,
            RestoreReport {
                repositioned: 2,
                ineligible: 0,
                vanished: 1,
                failed: 1,
            }
        );
        let sent: Vec<_> = server.sent().iter().map(|r| r.window).collect();
        assert_eq!(sent, vec![1, 4]);
        assert_eq!(server.flushes(), 1);
    }

    #[test]
    fn test_lost_connection_aborts_batch() {
        let geom = WindowGeometry::new(0, 0, 300, 300);
        let stored = vec![
            WindowSnapshot::new(1, geom),
            WindowSnapshot::new(2, geom),
            WindowSnapshot::new(3, geom),
        ];
        let server = server_with(&stored);
        server.disconnect();

        let err = restore(&server, &stored).unwrap_err();

        assert!(err.is_fatal());
        assert!(server.sent().is_empty());
        assert_eq!(server.flushes(), 0);
    }

    #[test]
    fn test_async_window_errors_are_reported_as_events() {
        let geom = WindowGeometry::new(0, 0, 300, 300);
        let stored = vec![WindowSnapshot::new(1, geom), WindowSnapshot::new(2, geom)];
        let server = server_with(&stored);
        server.report_errors_async();
        server.vanish_window(2);

        let report = restore(&server, &stored).unwrap();

        assert_eq!(report.repositioned, 2);
        assert_eq!(report.vanished, 0);
        assert_eq!(server.poll_event().unwrap(), Some(ServerEvent::WindowGone(2)));
    }
}
