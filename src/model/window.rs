use std::fmt;
use std::hash::{Hash, Hasher};

/// Идентификатор окна X11
pub type WindowId = u32;

/// Значение `_NET_WM_DESKTOP` для окон, видимых на всех рабочих столах
pub const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// `StaticGravity | x,y,w,h присутствуют | источник "pager"`
///
/// https://specifications.freedesktop.org/wm-spec/latest/ar01s04.html
pub const MOVERESIZE_FLAGS: u32 = 10 | 0xf << 8 | 0x2 << 12;

/// Геометрия окна в координатах корневого окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

impl fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Классификация по `_NET_WM_STATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowState {
    Sticky,
    Fullscreen,
    Other,
}

/// Снимок управляемого окна на момент опроса.
///
/// Равенство и хеширование только по идентификатору: снимок каждый цикл
/// создаётся заново, а в хранилище важна лишь принадлежность окна.
#[derive(Debug, Clone)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub geometry: WindowGeometry,
    pub desktop: Option<u32>,
    pub state: Option<WindowState>,
    pub title: Option<String>,
    pub class: Option<String>,
}

impl WindowSnapshot {
    #[allow(dead_code)]
    pub fn new(id: WindowId, geometry: WindowGeometry) -> Self {
        Self {
            id,
            geometry,
            desktop: None,
            state: None,
            title: None,
            class: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_desktop(mut self, desktop: u32) -> Self {
        self.desktop = Some(desktop);
        self
    }

    #[allow(dead_code)]
    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = Some(state);
        self
    }

    #[allow(dead_code)]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Можно ли двигать окно автоматически.
    ///
    /// Окна на всех рабочих столах (скорее всего панели), липкие и
    /// полноэкранные окна не трогаем. Проверяется сохранённая классификация.
    pub fn should_reposition(&self) -> bool {
        if self.desktop == Some(ALL_DESKTOPS) {
            return false;
        }

        !matches!(self.state, Some(WindowState::Sticky | WindowState::Fullscreen))
    }

    /// Запрос `_NET_MOVERESIZE_WINDOW`, возвращающий окно в сохранённую геометрию
    pub fn moveresize_request(&self) -> MoveResizeRequest {
        MoveResizeRequest::new(self.id, self.geometry)
    }
}

impl PartialEq for WindowSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WindowSnapshot {}

impl Hash for WindowSnapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:x} {:?} ({}) {}",
            self.id,
            self.title.as_deref().unwrap_or(""),
            self.class.as_deref().unwrap_or("?"),
            self.geometry
        )
    }
}

/// Полезная нагрузка клиентского сообщения `_NET_MOVERESIZE_WINDOW`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResizeRequest {
    pub window: WindowId,
    pub data: [u32; 5],
}

impl MoveResizeRequest {
    /// x и y прижимаются к нулю, ширина и высота передаются как есть
    pub fn new(window: WindowId, geometry: WindowGeometry) -> Self {
        Self {
            window,
            data: [
                MOVERESIZE_FLAGS,
                geometry.x.max(0) as u32,
                geometry.y.max(0) as u32,
                geometry.width,
                geometry.height,
            ],
        }
    }

    pub fn geometry(&self) -> WindowGeometry {
        WindowGeometry::new(
            self.data[1] as i32,
            self.data[2] as i32,
            self.data[3],
            self.data[4],
        )
    }
}

/// Разбирает `WM_CLASS` формата `instance\0class\0`.
///
/// Возвращает класс, а если его нет, то имя экземпляра.
pub fn parse_wm_class(raw: &[u8]) -> Option<String> {
    let mut parts = raw
        .split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned());

    let instance = parts.next();
    parts.next().or(instance)
}
