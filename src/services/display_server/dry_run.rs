use crate::error::Result;
use crate::model::{MoveResizeRequest, WindowGeometry, WindowId, WindowState};
use std::time::Duration;
use tracing::info;

use super::r#trait::{
    Capabilities, CrtcGeometry, CrtcId, DisplayServer, OutputId, OutputInfo, ScreenResources,
    ServerEvent, Timestamp,
};

/// Обёртка для режима сухого запуска: все запросы чтения проходят насквозь,
/// а перемещение окон только логируется.
pub struct DryRunServer<S> {
    inner: S,
}

impl<S: DisplayServer> DryRunServer<S> {
    pub fn new(inner: S) -> Self {
        info!("Dry-run режим - окна перемещаться не будут");
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<S: DisplayServer> DisplayServer for DryRunServer<S> {
    fn capabilities(&self) -> Result<Capabilities> {
        self.inner.capabilities()
    }

    fn screen_resources(&self) -> Result<ScreenResources> {
        self.inner.screen_resources()
    }

    fn output_info(&self, output: OutputId, config_timestamp: Timestamp) -> Result<OutputInfo> {
        self.inner.output_info(output, config_timestamp)
    }

    fn crtc_geometry(&self, crtc: CrtcId, config_timestamp: Timestamp) -> Result<CrtcGeometry> {
        self.inner.crtc_geometry(crtc, config_timestamp)
    }

    fn client_list(&self) -> Result<Option<Vec<WindowId>>> {
        self.inner.client_list()
    }

    fn window_geometry(&self, window: WindowId) -> Result<WindowGeometry> {
        self.inner.window_geometry(window)
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>> {
        self.inner.window_desktop(window)
    }

    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>> {
        self.inner.window_state(window)
    }

    fn window_title(&self, window: WindowId) -> Result<Option<String>> {
        self.inner.window_title(window)
    }

    fn window_class(&self, window: WindowId) -> Result<Option<String>> {
        self.inner.window_class(window)
    }

    fn send_move_resize(&self, request: &MoveResizeRequest) -> Result<()> {
        info!(
            "Dry-run: окно 0x{:x} было бы перемещено в {}",
            request.window,
            request.geometry()
        );
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn select_layout_events(&self) -> Result<()> {
        self.inner.select_layout_events()
    }

    fn poll_event(&self) -> Result<Option<ServerEvent>> {
        self.inner.poll_event()
    }

    async fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        self.inner.wait_readable(timeout).await
    }
}
