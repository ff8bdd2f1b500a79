// Watermark pipeline - derives, renders, stores and applies the project watermark
//
// Steps 1-6 of a run (load configuration, pick text, render, write, reconcile)
// happen on the calling worker; applying the result and repainting is handed to
// the host's interactive thread. A failing run is logged and discarded.

pub mod dispatch;

pub use dispatch::{
    interactive_channel, InlineDispatcher, InteractiveDispatcher, InteractiveQueue,
    InteractiveTask, QueueDispatcher,
};

use crate::background::{BackgroundDisplay, BackgroundProperties};
use crate::config::ConfigStore;
use crate::constants::log_preview;
use crate::error::PipelineError;
use crate::identifier;
use crate::reload::ConfigurationChanged;
use crate::storage::{self, resolve_or_fallback, DirectoryResolver};
use crate::watermark::ImageRenderer;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// What started a run; only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Startup,
    ConfigurationChanged,
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::ConfigurationChanged => "configuration_changed",
            Trigger::Manual => "manual",
        }
    }
}

/// Result of steps 1 to 6: a written image and the properties to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBackground {
    /// Text drawn into the image
    pub identifier: String,
    /// Absolute path of the written PNG
    pub path: PathBuf,
    /// Reconciled background properties pointing at `path`
    pub properties: BackgroundProperties,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `enabled` is false; nothing was touched
    Disabled,
    /// The image was written and handed to the interactive thread
    Applied(PathBuf),
    /// The run was aborted; the reason has been logged
    Failed,
}

struct Inner {
    project_name: String,
    config_store: Arc<dyn ConfigStore>,
    renderer: ImageRenderer,
    directories: Arc<dyn DirectoryResolver>,
    display: Arc<dyn BackgroundDisplay>,
    dispatcher: Arc<dyn InteractiveDispatcher>,
}

/// Per-project watermark orchestrator.
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct WatermarkPipeline {
    inner: Arc<Inner>,
}

impl fmt::Debug for WatermarkPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatermarkPipeline")
            .field("project_name", &self.inner.project_name)
            .finish_non_exhaustive()
    }
}

impl WatermarkPipeline {
    pub fn builder(project_name: impl Into<String>) -> WatermarkPipelineBuilder {
        WatermarkPipelineBuilder::new(project_name)
    }

    pub fn project_name(&self) -> &str {
        &self.inner.project_name
    }

    /// Steps 1 to 6. `Ok(None)` means the watermark is disabled and nothing
    /// was written.
    pub fn prepare(&self) -> Result<Option<PreparedBackground>, PipelineError> {
        let inner = &self.inner;

        let config = inner.config_store.load()?;
        if !config.enabled() {
            tracing::info!("Watermark disabled; skipping run");
            return Ok(None);
        }

        let text = match config.identifier_override() {
            Some(text) => text.to_string(),
            None => identifier::generate(&inner.project_name),
        };
        tracing::debug!(
            text = %log_preview(&text),
            overridden = config.identifier_override().is_some(),
            "Identifier selected"
        );

        let rendered = inner.renderer.render(&text, &config.text_render_options());

        let directory = resolve_or_fallback(inner.directories.as_ref(), &inner.project_name);
        let path = storage::write(&directory, &inner.project_name, &text, &rendered.png)?;

        let existing = inner.display.current_composite();
        let properties = BackgroundProperties::parse(existing.as_deref())
            .with_path(path.to_string_lossy());
        tracing::debug!(composite = %properties, "Background properties reconciled");

        Ok(Some(PreparedBackground {
            identifier: text,
            path,
            properties,
        }))
    }

    /// One complete run on the calling worker. Never fails; see [`RunOutcome`].
    pub fn run(&self) -> RunOutcome {
        self.run_for(Trigger::Manual)
    }

    fn run_for(&self, trigger: Trigger) -> RunOutcome {
        let span = tracing::info_span!(
            "watermark_run",
            project = %log_preview(&self.inner.project_name),
            trigger = trigger.as_str()
        );
        let _enter = span.enter();

        match self.prepare() {
            Ok(Some(prepared)) => {
                let path = prepared.path.clone();
                self.apply(prepared.properties);
                tracing::info!(path = %path.display(), "Watermark run complete");
                RunOutcome::Applied(path)
            }
            Ok(None) => RunOutcome::Disabled,
            Err(e) => {
                tracing::warn!(error = %e, "Watermark run failed; keeping previous background");
                RunOutcome::Failed
            }
        }
    }

    /// Step 7 on the interactive thread.
    fn apply(&self, properties: BackgroundProperties) {
        let display = Arc::clone(&self.inner.display);
        self.inner.dispatcher.dispatch(Box::new(move || {
            guard_host_call("apply background", || {
                display.set_image(&properties);
                display.repaint();
            });
        }));
    }

    /// Restore opacity, fill and anchor defaults for the current image.
    pub fn reset_background(&self) {
        let display = Arc::clone(&self.inner.display);
        self.inner.dispatcher.dispatch(Box::new(move || {
            guard_host_call("reset background", || {
                display.reset_to_defaults();
                display.repaint();
            });
        }));
    }

    /// Start a run on the blocking pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_startup(&self) -> JoinHandle<RunOutcome> {
        self.spawn_run(Trigger::Startup)
    }

    /// Start an independent run for a configuration change. Earlier runs are
    /// neither cancelled nor coalesced.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_configuration_changed(&self) -> JoinHandle<RunOutcome> {
        self.spawn_run(Trigger::ConfigurationChanged)
    }

    fn spawn_run(&self, trigger: Trigger) -> JoinHandle<RunOutcome> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.run_for(trigger))
    }

    /// Trigger a run for every change received, in order, until the sender
    /// side closes.
    pub fn listen(
        &self,
        mut receiver: broadcast::Receiver<ConfigurationChanged>,
    ) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(ConfigurationChanged(config)) => {
                        tracing::debug!(
                            enabled = config.enabled(),
                            identifier_override = ?config.identifier_override().map(log_preview),
                            "Configuration change received"
                        );
                        supervise(pipeline.on_configuration_changed());
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped = skipped,
                            "Configuration listener lagged; running with latest configuration"
                        );
                        supervise(pipeline.on_configuration_changed());
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Configuration change channel closed");
                        break;
                    }
                }
            }
        })
    }

    /// [`listen`](Self::listen) to this pipeline's own configuration store.
    pub fn watch_config_store(&self) -> JoinHandle<()> {
        self.listen(self.inner.config_store.subscribe())
    }
}

/// Wait for a spawned run. A run that panicked or was cancelled comes back as
/// [`PipelineError::Join`].
pub async fn join_run(handle: JoinHandle<RunOutcome>) -> Result<RunOutcome, PipelineError> {
    Ok(handle.await?)
}

/// Log an aborted listener-triggered run; nobody else awaits it.
fn supervise(handle: JoinHandle<RunOutcome>) {
    tokio::spawn(async move {
        if let Err(e) = join_run(handle).await {
            tracing::warn!(error = %e, "Configuration change run aborted");
        }
    });
}

/// Run a host display call, logging a panic instead of unwinding into the
/// host's interactive loop.
fn guard_host_call(operation: &str, call: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::warn!(operation = operation, reason = %reason, "Host display call failed");
    }
}

/// Builder for [`WatermarkPipeline`].
pub struct WatermarkPipelineBuilder {
    project_name: String,
    config_store: Option<Arc<dyn ConfigStore>>,
    renderer: Option<ImageRenderer>,
    directories: Option<Arc<dyn DirectoryResolver>>,
    display: Option<Arc<dyn BackgroundDisplay>>,
    dispatcher: Option<Arc<dyn InteractiveDispatcher>>,
}

/// A collaborator the host must supply was not given to the builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("watermark pipeline is missing its {0}")]
pub struct MissingCollaborator(pub &'static str);

impl WatermarkPipelineBuilder {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            config_store: None,
            renderer: None,
            directories: None,
            display: None,
            dispatcher: None,
        }
    }

    pub fn config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Defaults to a renderer over the embedded font catalog.
    pub fn renderer(mut self, renderer: ImageRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn directories(mut self, resolver: Arc<dyn DirectoryResolver>) -> Self {
        self.directories = Some(resolver);
        self
    }

    pub fn display(mut self, display: Arc<dyn BackgroundDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    /// Defaults to [`InlineDispatcher`].
    pub fn dispatcher(mut self, dispatcher: Arc<dyn InteractiveDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> Result<WatermarkPipeline, MissingCollaborator> {
        let inner = Inner {
            project_name: self.project_name,
            config_store: self
                .config_store
                .ok_or(MissingCollaborator("configuration store"))?,
            renderer: self.renderer.unwrap_or_default(),
            directories: self
                .directories
                .ok_or(MissingCollaborator("directory resolver"))?,
            display: self.display.ok_or(MissingCollaborator("background display"))?,
            dispatcher: self
                .dispatcher
                .unwrap_or_else(|| Arc::new(InlineDispatcher)),
        };
        Ok(WatermarkPipeline {
            inner: Arc::new(inner),
        })
    }
}
