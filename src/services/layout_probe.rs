use crate::error::Result;
use crate::model::{DisplayLayout, OutputGeometry};
use crate::services::display_server::DisplayServer;
use tracing::{debug, trace};

/// Снимает текущую расстановку мониторов.
///
/// Учитываются только подключённые выходы с активным контроллером.
/// Любая ошибка протокола фатальна для текущего цикла опроса.
pub fn probe<S: DisplayServer + ?Sized>(server: &S) -> Result<DisplayLayout> {
    let resources = server.screen_resources()?;
    let timestamp = resources.config_timestamp;

    let mut active = Vec::with_capacity(resources.outputs.len());
    for output in resources.outputs {
        let info = server.output_info(output, timestamp)?;
        if !info.connected {
            trace!("Выход {} не подключён", info.name);
            continue;
        }
        if info.crtc == 0 {
            trace!("Выход {} подключён, но не активен", info.name);
            continue;
        }

        let crtc = server.crtc_geometry(info.crtc, timestamp)?;
        active.push(OutputGeometry::new(info.name, crtc.x, crtc.y, crtc.width, crtc.height));
    }

    let layout = DisplayLayout::from_outputs(active);
    debug!("Все мониторы: {}", layout);
    Ok(layout)
}
