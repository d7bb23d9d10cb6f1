use crate::error::{ErrorKind, Result, WinError};
use crate::model::{WindowId, WindowSnapshot};
use crate::services::display_server::DisplayServer;
use tracing::{debug, error, warn};

/// Возвращает снимки всех клиентских окон в порядке `_NET_CLIENT_LIST`.
///
/// Порядок важен: повторное применение снимков в том же порядке
/// восстанавливает относительное расположение окон.
pub fn enumerate<S: DisplayServer + ?Sized>(server: &S) -> Result<Vec<WindowSnapshot>> {
    let client_list = server
        .client_list()?
        .ok_or(WinError::ClientListUnavailable)?;

    let mut windows = Vec::with_capacity(client_list.len());
    for &window in &client_list {
        match capture(server, window) {
            Ok(snapshot) => windows.push(snapshot),
            Err(e) => match e.kind() {
                ErrorKind::TransientWindow => {
                    warn!(
                        "Окно 0x{:x} есть в списке оконного менеджера, но отсутствует: {}",
                        window, e
                    );
                }
                ErrorKind::UnexpectedPerWindow => {
                    error!("Не удалось прочитать окно 0x{:x}: {}", window, e);
                }
                ErrorKind::ConnectionFatal => return Err(e),
            },
        }
    }

    debug!(
        "Найдено клиентских окон: {} (записей в списке: {})",
        windows.len(),
        client_list.len()
    );
    Ok(windows)
}

/// Снимок одного окна; отсутствующие свойства дают пустые поля
pub fn capture<S: DisplayServer + ?Sized>(server: &S, window: WindowId) -> Result<WindowSnapshot> {
    let geometry = server.window_geometry(window)?;

    Ok(WindowSnapshot {
        id: window,
        geometry,
        desktop: server.window_desktop(window)?,
        state: server.window_state(window)?,
        title: server.window_title(window)?,
        class: server.window_class(window)?,
    })
}
