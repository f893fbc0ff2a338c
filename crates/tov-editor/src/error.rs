use thiserror::Error;
use tov_render::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to {action}")]
    Unavailable { action: &'static str },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there is no text to export")]
    NothingToExport,

    #[error("the canvas is not ready yet")]
    NotReady,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("the export was not saved")]
    NotSaved,
}
