use crate::error::{Result, WinError};
use crate::model::{parse_wm_class, MoveResizeRequest, WindowGeometry, WindowId, WindowState};
use std::collections::HashSet;
use std::io;
use std::os::unix::io::{AsFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, info, trace};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::ReplyError;
use x11rb::protocol::randr::{self, ConnectionExt as RandrConnectionExt};
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConnectionExt as XprotoConnectionExt, EventMask,
    GetPropertyReply, Window,
};
use x11rb::protocol::{ErrorKind as X11ErrorKind, Event};
use x11rb::rust_connection::RustConnection;

use super::atoms::Atoms;
use super::r#trait::{
    Capabilities, CrtcGeometry, CrtcId, DisplayServer, OutputId, OutputInfo, ScreenResources,
    ServerEvent, SupportedHints, Timestamp,
};

// Ограничения на длину читаемых свойств, в 32-битных словах
const LIST_MAX_LEN: u32 = 4096;
const TEXT_MAX_LEN: u32 = 64;

pub struct X11Server {
    // Дубликат сокета соединения, только для ожидания готовности
    readiness: AsyncFd<OwnedFd>,
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    // GetScreenResourcesCurrent появился в RandR 1.3
    resources_current: AtomicBool,
}

impl X11Server {
    /// Подключается к дисплею (`None` означает `$DISPLAY`) и разрешает атомы
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display_name)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| WinError::Connection(format!("экран {} не найден", screen_num)))?;

        let atoms = Atoms::new(&conn)?.reply()?;
        let socket = conn.stream().as_fd().try_clone_to_owned()?;
        // SAFETY: дескриптор принадлежит AsyncFd и закрывается только вместе с ним
        let readiness = unsafe { AsyncFd::register_with_interest(socket, Interest::READABLE) }
            .map_err(io::Error::from)?;

        let target = display_name.unwrap_or("$DISPLAY");
        info!(
            "Подключено к X-серверу {}, корневое окно 0x{:x}",
            target, root
        );

        Ok(Self {
            readiness,
            conn,
            root,
            atoms,
            resources_current: AtomicBool::new(false),
        })
    }

    fn get_property(
        &self,
        window: Window,
        property: u32,
        type_: impl Into<u32>,
        long_length: u32,
    ) -> std::result::Result<Option<GetPropertyReply>, ReplyError> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, long_length)?
            .reply()?;

        if reply.type_ == x11rb::NONE || reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(reply))
    }

    fn window_property(
        &self,
        window: WindowId,
        property: u32,
        type_: impl Into<u32>,
        long_length: u32,
    ) -> Result<Option<GetPropertyReply>> {
        self.get_property(window, property, type_, long_length)
            .map_err(|e| WinError::for_window(window, e))
    }

    fn text_property(
        &self,
        window: WindowId,
        property: u32,
        type_: impl Into<u32>,
    ) -> Result<Option<String>> {
        Ok(self
            .window_property(window, property, type_, TEXT_MAX_LEN)?
            .map(|reply| {
                String::from_utf8_lossy(&reply.value)
                    .trim_end_matches('\0')
                    .to_string()
            })
            .filter(|text| !text.is_empty()))
    }
}

#[async_trait::async_trait]
impl DisplayServer for X11Server {
    fn capabilities(&self) -> Result<Capabilities> {
        let randr_version = match self.conn.extension_information(randr::X11_EXTENSION_NAME)? {
            Some(_) => {
                let version = self.conn.randr_query_version(1, 5)?.reply()?;
                debug!(
                    "Версия RandR {}.{}",
                    version.major_version, version.minor_version
                );
                self.resources_current.store(
                    (version.major_version, version.minor_version) >= (1, 3),
                    Ordering::Relaxed,
                );
                Some((version.major_version, version.minor_version))
            }
            None => None,
        };

        let supported = self
            .get_property(self.root, self.atoms._NET_SUPPORTED, AtomEnum::ATOM, LIST_MAX_LEN)?
            .and_then(|reply| reply.value32().map(|atoms| atoms.collect::<HashSet<u32>>()))
            .map(|atoms| SupportedHints {
                client_list: atoms.contains(&self.atoms._NET_CLIENT_LIST),
                moveresize_window: atoms.contains(&self.atoms._NET_MOVERESIZE_WINDOW),
            });

        Ok(Capabilities {
            randr_version,
            supported,
        })
    }

    fn screen_resources(&self) -> Result<ScreenResources> {
        if self.resources_current.load(Ordering::Relaxed) {
            let resources = self
                .conn
                .randr_get_screen_resources_current(self.root)?
                .reply()?;
            return Ok(ScreenResources {
                config_timestamp: resources.config_timestamp,
                outputs: resources.outputs,
            });
        }

        let resources = self.conn.randr_get_screen_resources(self.root)?.reply()?;
        Ok(ScreenResources {
            config_timestamp: resources.config_timestamp,
            outputs: resources.outputs,
        })
    }

    fn output_info(&self, output: OutputId, config_timestamp: Timestamp) -> Result<OutputInfo> {
        let info = self
            .conn
            .randr_get_output_info(output, config_timestamp)?
            .reply()?;
        Ok(OutputInfo {
            name: String::from_utf8_lossy(&info.name).into_owned(),
            connected: info.connection == randr::Connection::CONNECTED,
            crtc: info.crtc,
        })
    }

    fn crtc_geometry(&self, crtc: CrtcId, config_timestamp: Timestamp) -> Result<CrtcGeometry> {
        let info = self.conn.randr_get_crtc_info(crtc, config_timestamp)?.reply()?;
        Ok(CrtcGeometry {
            x: info.x.into(),
            y: info.y.into(),
            width: info.width.into(),
            height: info.height.into(),
        })
    }

    fn client_list(&self) -> Result<Option<Vec<WindowId>>> {
        let reply = self.get_property(
            self.root,
            self.atoms._NET_CLIENT_LIST,
            AtomEnum::WINDOW,
            LIST_MAX_LEN,
        )?;
        Ok(reply.and_then(|reply| reply.value32().map(|windows| windows.collect())))
    }

    fn window_geometry(&self, window: WindowId) -> Result<WindowGeometry> {
        // Оба запроса уходят до первого ответа
        let geometry = self.conn.get_geometry(window)?;
        let coords = self.conn.translate_coordinates(window, self.root, 0, 0)?;

        let geometry = geometry.reply().map_err(|e| WinError::for_window(window, e))?;
        let coords = coords.reply().map_err(|e| WinError::for_window(window, e))?;

        Ok(WindowGeometry::new(
            coords.dst_x.into(),
            coords.dst_y.into(),
            geometry.width.into(),
            geometry.height.into(),
        ))
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>> {
        Ok(self
            .window_property(window, self.atoms._NET_WM_DESKTOP, AtomEnum::CARDINAL, 1)?
            .and_then(|reply| reply.value32().and_then(|mut values| values.next())))
    }

    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>> {
        Ok(self
            .window_property(window, self.atoms._NET_WM_STATE, AtomEnum::ATOM, 32)?
            .and_then(|reply| {
                reply
                    .value32()
                    .and_then(|states| self.atoms.classify_state(states))
            }))
    }

    fn window_title(&self, window: WindowId) -> Result<Option<String>> {
        if let Some(title) =
            self.text_property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?
        {
            return Ok(Some(title));
        }
        self.text_property(window, self.atoms.WM_NAME, AtomEnum::ANY)
    }

    fn window_class(&self, window: WindowId) -> Result<Option<String>> {
        Ok(self
            .window_property(window, self.atoms.WM_CLASS, AtomEnum::STRING, TEXT_MAX_LEN)?
            .and_then(|reply| parse_wm_class(&reply.value)))
    }

    fn send_move_resize(&self, request: &MoveResizeRequest) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            request.window,
            self.atoms._NET_MOVERESIZE_WINDOW,
            request.data,
        );
        trace!("Отправляем _NET_MOVERESIZE_WINDOW: {:?}", event);

        // Ошибка для исчезнувшего окна придёт позже как событие;
        // синхронно здесь может упасть только само соединение
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn select_layout_events(&self) -> Result<()> {
        self.conn
            .randr_select_input(
                self.root,
                randr::NotifyMask::CRTC_CHANGE | randr::NotifyMask::OUTPUT_CHANGE,
            )?
            .check()?;
        debug!("Маска событий RandR установлена");
        Ok(())
    }

    fn poll_event(&self) -> Result<Option<ServerEvent>> {
        let Some(event) = self.conn.poll_for_event()? else {
            return Ok(None);
        };

        Ok(Some(classify(event)))
    }

    async fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        match tokio::time::timeout(timeout, self.readiness.readable()).await {
            Ok(guard) => {
                guard?.clear_ready();
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

/// Сводит событие x11rb к тому, что важно детектору
fn classify(event: Event) -> ServerEvent {
    match event {
        Event::DestroyNotify(_) => ServerEvent::Destroyed,
        Event::RandrNotify(notify) if notify.sub_code == randr::Notify::CRTC_CHANGE => {
            ServerEvent::CrtcChanged
        }
        Event::RandrNotify(notify) if notify.sub_code == randr::Notify::OUTPUT_CHANGE => {
            ServerEvent::OutputChanged
        }
        Event::Error(e)
            if matches!(e.error_kind, X11ErrorKind::Window | X11ErrorKind::Drawable) =>
        {
            ServerEvent::WindowGone(e.bad_value)
        }
        Event::Error(e) => ServerEvent::ProtocolError(format!("{:?}", e)),
        _ => ServerEvent::Other,
    }
}
