/// Boxed source error carried by adapter-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for the read-later bot.
///
/// Adapter crates (storage backends, Telegram transport) map their library
/// errors into `Storage` / `Transport` so the consumer loop can log every
/// failure the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[source] BoxError),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("unknown event type")]
    UnknownEventType,

    #[error("unknown meta type")]
    UnknownMetaType,

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn storage(e: impl Into<BoxError>) -> Self {
        Self::Storage(e.into())
    }

    pub fn transport(e: impl Into<BoxError>) -> Self {
        Self::Transport(e.into())
    }

    /// Wrap `self` with a short stage label.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error below any number of `Context` layers.
    pub fn root(&self) -> &Error {
        let mut cur = self;
        while let Error::Context { source, .. } = cur {
            cur = source;
        }
        cur
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// `.context("stage")` for results crossing a component boundary.
pub trait ResultExt<T> {
    fn context(self, context: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| e.into().wrap(context))
    }
}
