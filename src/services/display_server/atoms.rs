use crate::model::WindowState;

// Атомы интернируются одной пачкой сразу после подключения
// https://specifications.freedesktop.org/wm-spec/latest/
x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_SUPPORTED,
        _NET_CLIENT_LIST,
        _NET_WM_DESKTOP,
        _NET_WM_STATE,
        _NET_WM_STATE_STICKY,
        _NET_WM_STATE_FULLSCREEN,
        _NET_MOVERESIZE_WINDOW,
        _NET_WM_NAME,
        WM_NAME,
        WM_CLASS,
        UTF8_STRING,
    }
}

impl Atoms {
    /// Классифицирует список `_NET_WM_STATE`: fullscreen важнее sticky
    pub fn classify_state<I>(&self, states: I) -> Option<WindowState>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut result = None;
        for state in states {
            if state == self._NET_WM_STATE_FULLSCREEN {
                return Some(WindowState::Fullscreen);
            }
            if state == self._NET_WM_STATE_STICKY {
                result = Some(WindowState::Sticky);
            } else if result.is_none() {
                result = Some(WindowState::Other);
            }
        }
        result
    }
}
