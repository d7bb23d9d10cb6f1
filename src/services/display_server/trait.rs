use crate::error::Result;
use crate::model::{MoveResizeRequest, WindowGeometry, WindowId, WindowState};
use std::time::Duration;

pub type OutputId = u32;
pub type CrtcId = u32;
pub type Timestamp = u32;

/// Список выходов RandR вместе с меткой времени конфигурации
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenResources {
    pub config_timestamp: Timestamp,
    pub outputs: Vec<OutputId>,
}

/// Сведения о выходе; `crtc == 0` означает, что выход не привязан к контроллеру
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub name: String,
    pub connected: bool,
    pub crtc: CrtcId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrtcGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Какие из обязательных свойств перечислены в `_NET_SUPPORTED`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedHints {
    pub client_list: bool,
    pub moveresize_window: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `None`, если расширение RandR отсутствует
    pub randr_version: Option<(u32, u32)>,
    /// `None`, если оконный менеджер не публикует `_NET_SUPPORTED`
    pub supported: Option<SupportedHints>,
}

/// Событие, прочитанное из соединения
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    Destroyed,
    CrtcChanged,
    OutputChanged,
    /// Асинхронная ошибка BadWindow/BadDrawable, обычно ответ на запрос к исчезнувшему окну
    WindowGone(WindowId),
    ProtocolError(String),
    Other,
}

/// Доступ к дисплейному серверу.
///
/// Все запросы синхронные; единственная точка ожидания это `wait_readable`.
#[async_trait::async_trait]
pub trait DisplayServer: Send + Sync {
    fn capabilities(&self) -> Result<Capabilities>;

    fn screen_resources(&self) -> Result<ScreenResources>;
    fn output_info(&self, output: OutputId, config_timestamp: Timestamp) -> Result<OutputInfo>;
    fn crtc_geometry(&self, crtc: CrtcId, config_timestamp: Timestamp) -> Result<CrtcGeometry>;

    /// `_NET_CLIENT_LIST` в порядке оконного менеджера, `None` если свойства нет
    fn client_list(&self) -> Result<Option<Vec<WindowId>>>;
    fn window_geometry(&self, window: WindowId) -> Result<WindowGeometry>;
    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>>;
    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>>;
    fn window_title(&self, window: WindowId) -> Result<Option<String>>;
    fn window_class(&self, window: WindowId) -> Result<Option<String>>;

    /// Без подтверждения; вступает в силу после `flush`
    fn send_move_resize(&self, request: &MoveResizeRequest) -> Result<()>;
    fn flush(&self) -> Result<()>;

    fn select_layout_events(&self) -> Result<()>;
    /// Неблокирующее чтение одного события
    fn poll_event(&self) -> Result<Option<ServerEvent>>;
    /// `true`, если соединение стало читаемым до истечения `timeout`
    async fn wait_readable(&self, timeout: Duration) -> Result<bool>;
}
