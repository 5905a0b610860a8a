use crate::{
    Catalog, Controller, ModelBuilder, PHI_ACCESS_LOG_TAG, PhiAccessError, PhiConfig, PhiModel,
    Request, Translator,
};
use parking_lot::Mutex;
use phi_access_log::{AuditLog, FileSink, LogSink, TracingSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The process-wide PHI environment: configuration, audit log, reason
/// translations and the registry of guarded types.
///
/// Cloning is cheap and every clone shares the same registry. Grants never
/// live here; they are held by a [`Request`] or by individual records.
#[derive(Debug, Clone)]
pub struct Phi {
    inner: Arc<PhiInner>,
}

#[derive(Debug)]
struct PhiInner {
    config: PhiConfig,
    log: AuditLog,
    translator: Arc<dyn Translator>,
    models: Mutex<HashMap<String, Arc<PhiModel>>>,
    next_object_id: AtomicU64,
}

impl Phi {
    /// Build an environment that logs to `config.log_path`, or to `tracing`
    /// when no path is configured.
    pub fn new(config: PhiConfig) -> Result<Self, PhiAccessError> {
        Self::builder(config).build()
    }

    /// Start building an environment with a custom sink or translator.
    pub fn builder(config: PhiConfig) -> PhiBuilder {
        PhiBuilder {
            config,
            sink: None,
            translator: None,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PhiConfig {
        &self.inner.config
    }

    /// Untagged audit log.
    pub fn log(&self) -> &AuditLog {
        &self.inner.log
    }

    /// Record PHI access that happened outside guarded reads, such as an
    /// export, on behalf of `user`.
    pub fn log_phi_access(&self, user: &str, message: &str) {
        self.log().tagged([PHI_ACCESS_LOG_TAG, user]).info(message);
    }

    /// Reason translations.
    pub fn translator(&self) -> &dyn Translator {
        self.inner.translator.as_ref()
    }

    /// Register a record type, or merge new configuration into an already
    /// registered one. Members that do not exist are skipped with a warning;
    /// extending through an undefined relation is an error.
    pub fn register(&self, builder: ModelBuilder) -> Result<Arc<PhiModel>, PhiAccessError> {
        let (model, missing) = {
            let mut models = self.inner.models.lock();
            let (model, registered) = match models.get(builder.name()) {
                Some(model) => (model.clone(), true),
                // The primary key is fixed by the first registration.
                None => (
                    Arc::new(PhiModel::new(builder.name(), builder.key_attribute())),
                    false,
                ),
            };
            let missing = model.apply(&builder)?;
            if !registered {
                models.insert(builder.name().to_owned(), model.clone());
            }
            (model, missing)
        };

        for member in missing {
            self.log().warn(format!(
                "{} tried to wrap non-existent method ({member})",
                model.name()
            ));
        }

        Ok(model)
    }

    /// The registered type called `name`.
    pub fn model(&self, name: &str) -> Option<Arc<PhiModel>> {
        self.inner.models.lock().get(name).cloned()
    }

    /// A request with no controller context. Grants made through it must
    /// name their grantor and reason.
    pub fn request(&self) -> Request {
        Request::new(self.clone())
    }

    /// A request handled by `controller`. Its name and action select default
    /// reasons, and when `current_user_method` is configured the controller
    /// supplies the default grantor.
    pub fn begin_request(&self, controller: &impl Controller) -> Request {
        let current_user = self
            .config()
            .current_user_method
            .as_deref()
            .and_then(|accessor| controller.current_user(accessor));

        Request::with_context(
            self.clone(),
            controller.name().to_owned(),
            controller.action().to_owned(),
            current_user,
        )
    }

    pub(crate) fn next_object_id(&self) -> u64 {
        self.inner.next_object_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Assembles a [`Phi`] environment.
#[derive(Debug)]
pub struct PhiBuilder {
    config: PhiConfig,
    sink: Option<Arc<dyn LogSink>>,
    translator: Option<Arc<dyn Translator>>,
}

impl PhiBuilder {
    /// Send audit lines to `sink` instead of the configured destination.
    pub fn log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Translate default reasons with `translator`.
    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    /// Finish, opening the log file if one is configured and no sink was
    /// given.
    pub fn build(self) -> Result<Phi, PhiAccessError> {
        let sink: Arc<dyn LogSink> = match (self.sink, &self.config.log_path) {
            (Some(sink), _) => sink,
            (None, Some(path)) => Arc::new(FileSink::open(path, self.config.rotation())?),
            (None, None) => Arc::new(TracingSink),
        };
        let translator = self
            .translator
            .unwrap_or_else(|| Arc::new(Catalog::new(self.config.locale.clone())));

        Ok(Phi {
            inner: Arc::new(PhiInner {
                log: AuditLog::from_shared(sink),
                translator,
                config: self.config,
                models: Mutex::new(HashMap::new()),
                next_object_id: AtomicU64::new(1),
            }),
        })
    }
}
