//! Per-step progress callbacks.

use tracing::info;

use crate::cells::Cell;

/// Receives the events of one `progress` call.
///
/// `on_progress_start` fires before any cell event and `on_progress_finish`
/// after the grid was updated. Cell events are delivered on the thread that
/// called `progress`, chunk by chunk in row-major order.
pub trait ProgressListener {
    fn on_progress_start(&mut self) {}

    fn on_cell_spawned(&mut self, _cell: Cell) {}

    fn on_cell_died(&mut self, _cell: Cell) {}

    fn on_progress_finish(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl ProgressListener for NoopListener {}

/// Logs every event at `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingListener;

impl ProgressListener for LoggingListener {
    fn on_progress_start(&mut self) {
        info!("progress started");
    }

    fn on_cell_spawned(&mut self, cell: Cell) {
        info!("cell at ({},{}) becomes alive", cell.row, cell.col);
    }

    fn on_cell_died(&mut self, cell: Cell) {
        info!("cell at ({},{}) becomes dead", cell.row, cell.col);
    }

    fn on_progress_finish(&mut self) {
        info!("progress finished");
    }
}
