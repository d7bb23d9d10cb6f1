use crate::error::Result;
use crate::model::{DisplayLayout, WindowId, WindowSnapshot};
use crate::services::display_server::DisplayServer;
use crate::services::restorer::{self, RestoreReport};
use crate::services::{layout_probe, window_enumerator};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// Хранит расположение окон для каждой увиденной расстановки мониторов.
///
/// Записи живут всё время работы процесса и не вытесняются; каждая отражает
/// последнее наблюдавшееся расположение окон при своей расстановке.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: Option<DisplayLayout>,
    stored: HashMap<DisplayLayout, Vec<WindowSnapshot>>,
    last_report: Option<RestoreReport>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn current_layout(&self) -> Option<&DisplayLayout> {
        self.current.as_ref()
    }

    #[allow(dead_code)]
    pub fn stored(&self, layout: &DisplayLayout) -> Option<&[WindowSnapshot]> {
        self.stored.get(layout).map(Vec::as_slice)
    }

    pub fn layout_count(&self) -> usize {
        self.stored.len()
    }

    /// Итог последнего прохода восстановления
    #[allow(dead_code)]
    pub fn last_report(&self) -> Option<RestoreReport> {
        self.last_report
    }

    /// Один цикл опроса. Возвращает `true`, если расстановка мониторов сменилась.
    ///
    /// Зондирование мониторов дорогое, поэтому выполняется только при
    /// `layout_may_have_changed` или если расстановка ещё неизвестна.
    /// Перечисление окон выполняется каждый цикл.
    pub fn poll<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        layout_may_have_changed: bool,
    ) -> Result<bool> {
        debug!(
            "Опрос состояния мониторов, layout_may_have_changed={}",
            layout_may_have_changed
        );

        if !layout_may_have_changed {
            if let Some(current) = self.current.clone() {
                self.update_windows(server, current)?;
                return Ok(false);
            }
        }

        let layout = layout_probe::probe(server)?;
        if self.current.as_ref() == Some(&layout) {
            trace!("Расстановка мониторов не изменилась: {}", layout);
            self.update_windows(server, layout)?;
            return Ok(false);
        }

        let first_run = self.current.is_none();
        self.current = Some(layout.clone());

        if !self.stored.contains_key(&layout) {
            if first_run {
                debug!("Начальная расстановка мониторов: {}", layout);
            } else {
                info!(
                    "Расстановка мониторов изменилась: {} (сохранённого расположения окон нет)",
                    layout
                );
            }
            self.update_windows(server, layout)?;
            return Ok(true);
        }

        let snapshots = &self.stored[&layout];
        let report = restorer::restore(server, snapshots)?;
        info!(
            "Расстановка мониторов изменилась: {} (перемещено окон: {} из {})",
            layout,
            report.repositioned,
            snapshots.len()
        );
        self.last_report = Some(report);

        Ok(true)
    }

    fn update_windows<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        layout: DisplayLayout,
    ) -> Result<()> {
        let fresh = window_enumerator::enumerate(server)?;

        if let Some(previous) = self.stored.get(&layout) {
            log_moves(previous, &fresh);
        }

        self.stored.insert(layout, fresh);
        Ok(())
    }
}

/// Диагностика ручных перемещений между циклами
fn log_moves(previous: &[WindowSnapshot], fresh: &[WindowSnapshot]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let by_id: HashMap<WindowId, &WindowSnapshot> = fresh.iter().map(|w| (w.id, w)).collect();
    for old in previous {
        let Some(new) = by_id.get(&old.id) else {
            continue;
        };
        if old.geometry != new.geometry {
            debug!(
                "Окно {:?} ({}) перемещено: {} -> {}",
                old.title.as_deref().unwrap_or(""),
                old.class.as_deref().unwrap_or("?"),
                old.geometry,
                new.geometry
            );
        }
    }
}
