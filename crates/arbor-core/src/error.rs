use thiserror::Error;

/// Contract violations raised while rendering.
///
/// These point at a defect in the calling code rather than a runtime
/// condition, so the runtime never retries or swallows them: they travel out
/// of [`Runtime::frame`](crate::Runtime::frame) to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("hook #{index} used outside of the rendering process; call evaluate() first")]
    HookNotEvaluated { index: usize },

    #[error("hook #{index} holds a value of a different type")]
    HookTypeMismatch { index: usize },

    #[error("[{widget}]: no widget factory; call widget(), cache() or persist() first")]
    FactoryNotConfigured { widget: String },

    #[error("[{widget}]: inner widget is not available before the first render")]
    NotRendered { widget: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
