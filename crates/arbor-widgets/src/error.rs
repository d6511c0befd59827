use thiserror::Error;

/// Invalid widget input the caller can recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("selector should have at least one available value")]
    NoOptions,
}
