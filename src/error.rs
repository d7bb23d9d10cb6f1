use crate::model::WindowId;
use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::ErrorKind as X11ErrorKind;

#[derive(Error, Debug)]
pub enum WinError {
    #[error("Сервер или оконный менеджер не поддерживает необходимые функции: {0}")]
    Unsupported(String),

    #[error("Ошибка соединения с X-сервером: {0}")]
    Connection(String),

    #[error("Оконный менеджер не предоставляет _NET_CLIENT_LIST")]
    ClientListUnavailable,

    #[error("Окно 0x{0:x} больше не существует")]
    WindowGone(WindowId),

    #[error("Непредвиденная ошибка для окна 0x{window:x}: {reason}")]
    WindowUnexpected { window: WindowId, reason: String },

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),
}

/// Класс ошибки с точки зрения цикла опроса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Прерывает запуск или текущий цикл опроса
    ConnectionFatal,
    /// Окно исчезло между перечислением и использованием
    TransientWindow,
    /// Любая другая ошибка при работе с одним окном
    UnexpectedPerWindow,
}

impl WinError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WinError::WindowGone(_) => ErrorKind::TransientWindow,
            WinError::WindowUnexpected { .. } => ErrorKind::UnexpectedPerWindow,
            WinError::Unsupported(_)
            | WinError::Connection(_)
            | WinError::ClientListUnavailable
            | WinError::Io(_) => ErrorKind::ConnectionFatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::ConnectionFatal
    }

    /// Классифицирует ошибку ответа на запрос, адресованный конкретному окну
    pub fn for_window(window: WindowId, err: ReplyError) -> Self {
        match err {
            ReplyError::X11Error(e)
                if matches!(e.error_kind, X11ErrorKind::Window | X11ErrorKind::Drawable) =>
            {
                WinError::WindowGone(window)
            }
            ReplyError::X11Error(e) => WinError::WindowUnexpected {
                window,
                reason: format!("{:?}", e.error_kind),
            },
            ReplyError::ConnectionError(e) => e.into(),
        }
    }
}

impl From<ConnectError> for WinError {
    fn from(e: ConnectError) -> Self {
        WinError::Connection(e.to_string())
    }
}

impl From<ConnectionError> for WinError {
    fn from(e: ConnectionError) -> Self {
        WinError::Connection(e.to_string())
    }
}

impl From<ReplyError> for WinError {
    fn from(e: ReplyError) -> Self {
        WinError::Connection(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WinError>;
