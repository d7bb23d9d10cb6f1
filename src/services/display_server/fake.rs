//! Scripted in-memory display server for unit tests.

use crate::error::{Result, WinError};
use crate::model::{
    MoveResizeRequest, OutputGeometry, WindowGeometry, WindowId, WindowSnapshot, WindowState,
};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

use super::r#trait::{
    Capabilities, CrtcGeometry, CrtcId, DisplayServer, OutputId, OutputInfo, ScreenResources,
    ServerEvent, SupportedHints, Timestamp,
};

/// Что произойдёт при очередном `wait_readable`
#[derive(Debug, Clone)]
pub enum Wakeup {
    /// Сразу; `now` читаются ближайшим опросом, `later` появляются только после него
    Events {
        now: Vec<ServerEvent>,
        later: Vec<ServerEvent>,
    },
    /// Через `delay` по часам tokio; если `delay` не укладывается в таймаут,
    /// ожидание истекает, а пробуждение переносится на следующее
    After {
        delay: Duration,
        events: Vec<ServerEvent>,
    },
    /// Истекает весь переданный таймаут
    Timeout,
}

impl Wakeup {
    pub fn events(now: Vec<ServerEvent>) -> Self {
        Wakeup::Events { now, later: Vec::new() }
    }

    pub fn spurious() -> Self {
        Self::events(Vec::new())
    }

    pub fn after(delay: Duration, events: Vec<ServerEvent>) -> Self {
        Wakeup::After { delay, events }
    }
}

struct FakeOutput {
    id: OutputId,
    info: OutputInfo,
    crtc: Option<CrtcGeometry>,
}

pub struct FakeState {
    capabilities: Capabilities,
    outputs: Vec<FakeOutput>,
    client_list: Option<Vec<WindowId>>,
    windows: HashMap<WindowId, WindowSnapshot>,
    broken: HashSet<WindowId>,
    sent: Vec<MoveResizeRequest>,
    flushes: usize,
    probe_times: Vec<Instant>,
    waits: Vec<Duration>,
    select_fails: bool,
    disconnected: bool,
    async_errors: bool,
    pending: VecDeque<ServerEvent>,
    deferred: Vec<ServerEvent>,
    wakeups: VecDeque<Wakeup>,
}

pub struct FakeServer {
    state: Mutex<FakeState>,
}

impl FakeServer {
    pub fn with_layout(outputs: &[OutputGeometry]) -> Self {
        let server = Self {
            state: Mutex::new(FakeState {
                capabilities: Capabilities {
                    randr_version: Some((1, 5)),
                    supported: Some(SupportedHints {
                        client_list: true,
                        moveresize_window: true,
                    }),
                },
                outputs: Vec::new(),
                client_list: Some(Vec::new()),
                windows: HashMap::new(),
                broken: HashSet::new(),
                sent: Vec::new(),
                flushes: 0,
                probe_times: Vec::new(),
                waits: Vec::new(),
                select_fails: false,
                disconnected: false,
                async_errors: false,
                pending: VecDeque::new(),
                deferred: Vec::new(),
                wakeups: VecDeque::new(),
            }),
        };
        server.set_layout(outputs);
        server
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock()
    }

    /// Все выходы подключены и привязаны к собственным контроллерам
    pub fn set_layout(&self, outputs: &[OutputGeometry]) {
        let raw = outputs
            .iter()
            .map(|o| {
                let crtc = CrtcGeometry {
                    x: o.x,
                    y: o.y,
                    width: o.width,
                    height: o.height,
                };
                (o.name.clone(), true, Some(crtc))
            })
            .collect();
        self.set_raw_outputs(raw);
    }

    /// `(имя, подключён, геометрия контроллера)`; `None` означает `crtc == 0`
    pub fn set_raw_outputs(&self, outputs: Vec<(String, bool, Option<CrtcGeometry>)>) {
        let mut state = self.state();
        state.outputs = outputs
            .into_iter()
            .enumerate()
            .map(|(i, (name, connected, crtc))| FakeOutput {
                id: 0x40 + i as u32,
                info: OutputInfo {
                    name,
                    connected,
                    crtc: if crtc.is_some() { 0x60 + i as u32 } else { 0 },
                },
                crtc,
            })
            .collect();
    }

    pub fn set_capabilities(&self, capabilities: Capabilities) {
        self.state().capabilities = capabilities;
    }

    pub fn add_window(&self, snapshot: WindowSnapshot) {
        let mut state = self.state();
        if let Some(list) = state.client_list.as_mut() {
            list.push(snapshot.id);
        }
        state.windows.insert(snapshot.id, snapshot);
    }

    pub fn move_window(&self, window: WindowId, geometry: WindowGeometry) {
        if let Some(snapshot) = self.state().windows.get_mut(&window) {
            snapshot.geometry = geometry;
        }
    }

    /// Окно остаётся в `_NET_CLIENT_LIST`, но любые запросы к нему падают
    pub fn vanish_window(&self, window: WindowId) {
        self.state().windows.remove(&window);
    }

    pub fn break_window(&self, window: WindowId) {
        self.state().broken.insert(window);
    }

    pub fn drop_client_list(&self) {
        self.state().client_list = None;
    }

    pub fn fail_event_selection(&self) {
        self.state().select_fails = true;
    }

    /// Отправка запросов падает с ошибкой соединения
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    /// Как у настоящего сервера: запрос к исчезнувшему окну принимается,
    /// а BadWindow приходит позже событием
    pub fn report_errors_async(&self) {
        self.state().async_errors = true;
    }

    pub fn push_event(&self, event: ServerEvent) {
        self.state().pending.push_back(event);
    }

    pub fn push_wakeup(&self, wakeup: Wakeup) {
        self.state().wakeups.push_back(wakeup);
    }

    pub fn sent(&self) -> Vec<MoveResizeRequest> {
        self.state().sent.clone()
    }

    pub fn flushes(&self) -> usize {
        self.state().flushes
    }

    pub fn probes(&self) -> usize {
        self.state().probe_times.len()
    }

    pub fn probe_times(&self) -> Vec<Instant> {
        self.state().probe_times.clone()
    }

    /// Таймауты, с которыми вызывался `wait_readable`
    pub fn waits(&self) -> Vec<Duration> {
        self.state().waits.clone()
    }

    fn live_window(&self, window: WindowId) -> Result<WindowSnapshot> {
        self.state()
            .windows
            .get(&window)
            .cloned()
            .ok_or(WinError::WindowGone(window))
    }
}

#[async_trait::async_trait]
impl DisplayServer for FakeServer {
    fn capabilities(&self) -> Result<Capabilities> {
        Ok(self.state().capabilities)
    }

    fn screen_resources(&self) -> Result<ScreenResources> {
        let mut state = self.state();
        state.probe_times.push(Instant::now());
        Ok(ScreenResources {
            config_timestamp: state.probe_times.len() as u32,
            outputs: state.outputs.iter().map(|o| o.id).collect(),
        })
    }

    fn output_info(&self, output: OutputId, _config_timestamp: Timestamp) -> Result<OutputInfo> {
        self.state()
            .outputs
            .iter()
            .find(|o| o.id == output)
            .map(|o| o.info.clone())
            .ok_or_else(|| WinError::Connection(format!("BadOutput 0x{:x}", output)))
    }

    fn crtc_geometry(&self, crtc: CrtcId, _config_timestamp: Timestamp) -> Result<CrtcGeometry> {
        self.state()
            .outputs
            .iter()
            .find(|o| o.info.crtc == crtc)
            .and_then(|o| o.crtc)
            .ok_or_else(|| WinError::Connection(format!("BadCrtc 0x{:x}", crtc)))
    }

    fn client_list(&self) -> Result<Option<Vec<WindowId>>> {
        Ok(self.state().client_list.clone())
    }

    fn window_geometry(&self, window: WindowId) -> Result<WindowGeometry> {
        Ok(self.live_window(window)?.geometry)
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>> {
        Ok(self.live_window(window)?.desktop)
    }

    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>> {
        Ok(self.live_window(window)?.state)
    }

    fn window_title(&self, window: WindowId) -> Result<Option<String>> {
        Ok(self.live_window(window)?.title)
    }

    fn window_class(&self, window: WindowId) -> Result<Option<String>> {
        Ok(self.live_window(window)?.class)
    }

    fn send_move_resize(&self, request: &MoveResizeRequest) -> Result<()> {
        let mut state = self.state();
        if state.disconnected {
            return Err(WinError::Connection("broken pipe".to_string()));
        }
        if state.broken.contains(&request.window) {
            return Err(WinError::WindowUnexpected {
                window: request.window,
                reason: "BadValue".to_string(),
            });
        }
        let Some(snapshot) = state.windows.get_mut(&request.window) else {
            if state.async_errors {
                state.pending.push_back(ServerEvent::WindowGone(request.window));
                return Ok(());
            }
            return Err(WinError::WindowGone(request.window));
        };
        snapshot.geometry = request.geometry();
        state.sent.push(*request);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.state().flushes += 1;
        Ok(())
    }

    fn select_layout_events(&self) -> Result<()> {
        if self.state().select_fails {
            return Err(WinError::Connection("RRSelectInput failed".to_string()));
        }
        Ok(())
    }

    fn poll_event(&self) -> Result<Option<ServerEvent>> {
        let mut state = self.state();
        match state.pending.pop_front() {
            Some(event) => Ok(Some(event)),
            None => {
                let deferred = std::mem::take(&mut state.deferred);
                state.pending.extend(deferred);
                Ok(None)
            }
        }
    }

    async fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        let wakeup = {
            let mut state = self.state();
            state.waits.push(timeout);
            state.wakeups.pop_front()
        };

        match wakeup {
            Some(Wakeup::Events { now, later }) => {
                let mut state = self.state();
                state.pending.extend(now);
                state.deferred.extend(later);
                Ok(true)
            }
            Some(Wakeup::After { delay, events }) if delay >= timeout => {
                self.state().wakeups.push_front(Wakeup::After {
                    delay: delay - timeout,
                    events,
                });
                tokio::time::sleep(timeout).await;
                Ok(false)
            }
            Some(Wakeup::After { delay, events }) => {
                tokio::time::sleep(delay).await;
                self.state().pending.extend(events);
                Ok(true)
            }
            Some(Wakeup::Timeout) => {
                tokio::time::sleep(timeout).await;
                Ok(false)
            }
            // Сценарий исчерпан: сервер "уходит", чтобы циклы в тестах завершались
            None => {
                self.state().pending.push_back(ServerEvent::Destroyed);
                Ok(true)
            }
        }
    }
}
