use crate::error::{Result, WinError};
use crate::services::display_server::{Capabilities, DisplayServer};
use tracing::debug;

/// Минимальная версия RandR с событиями CRTC/Output
pub const MIN_RANDR_VERSION: (u32, u32) = (1, 2);

/// Проверяет при запуске, что сервер и оконный менеджер умеют всё необходимое
pub fn check_support<S: DisplayServer + ?Sized>(server: &S) -> Result<()> {
    let capabilities = server.capabilities()?;
    debug!("Возможности сервера: {:?}", capabilities);

    evaluate(&capabilities)
}

/// Остальные свойства необязательны
pub fn evaluate(capabilities: &Capabilities) -> Result<()> {
    let Some(version) = capabilities.randr_version else {
        return Err(WinError::Unsupported(
            "на сервере нет расширения RandR".to_string(),
        ));
    };
    if version < MIN_RANDR_VERSION {
        return Err(WinError::Unsupported(format!(
            "требуется RandR не ниже {}.{}, сервер поддерживает {}.{}",
            MIN_RANDR_VERSION.0, MIN_RANDR_VERSION.1, version.0, version.1
        )));
    }

    let Some(supported) = capabilities.supported else {
        return Err(WinError::Unsupported(
            "оконный менеджер не поддерживает _NET_SUPPORTED".to_string(),
        ));
    };
    if !supported.client_list {
        return Err(WinError::Unsupported(
            "оконный менеджер не поддерживает _NET_CLIENT_LIST".to_string(),
        ));
    }
    if !supported.moveresize_window {
        return Err(WinError::Unsupported(
            "оконный менеджер не поддерживает _NET_MOVERESIZE_WINDOW".to_string(),
        ));
    }

    Ok(())
}
