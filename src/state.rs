//! Application State
//!
//! Shared state handed to every command: the prompt store, the settings
//! partitions, the transient AI session and the storage behind them.
//! Cloning is cheap; every field is shared.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::models::settings::{AppConfig, Settings, SettingsUpdate, Theme};
use crate::services::ai::{AiGenerationState, AiService, GeminiFactory, ProviderFactory};
use crate::services::store::PromptStore;
use crate::storage::persistence::{self, StorageStats};
use crate::storage::{Database, KeyValueStore};
use crate::utils::debounce::Debouncer;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::default_export_dir;

/// Event pushed to the host while a command is running
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppEvent {
    pub event: String,
    pub payload: Value,
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

/// Cancellation handle of the stream currently running
#[derive(Debug)]
struct ActiveStream {
    id: u64,
    token: CancellationToken,
}

/// Application state shared by all commands
#[derive(Clone)]
pub struct AppState {
    kv: Arc<dyn KeyValueStore>,
    store: Arc<RwLock<PromptStore>>,
    settings: Arc<RwLock<Settings>>,
    config: AppConfig,
    persister: Debouncer,
    providers: Arc<dyn ProviderFactory>,
    ai_session: Arc<RwLock<AiGenerationState>>,
    active_stream: Arc<Mutex<Option<ActiveStream>>>,
    stream_ids: Arc<AtomicU64>,
    events: Option<EventSender>,
    export_dir: PathBuf,
    /// Commands running off the request loop
    tasks: TaskTracker,
}

impl AppState {
    /// Load the document and settings from `kv` and wire up the persister
    pub fn new(kv: Arc<dyn KeyValueStore>, config: AppConfig, export_dir: PathBuf) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;

        let doc = persistence::load_document(kv.as_ref())?;
        let settings = persistence::load_settings(kv.as_ref())?;
        tracing::info!(
            "[Store] loaded {} prompts (current: {:?})",
            doc.prompts.len(),
            doc.current_prompt_id
        );

        let store = Arc::new(RwLock::new(PromptStore::from_document(doc)));
        let persister = {
            let store = Arc::clone(&store);
            let kv = Arc::clone(&kv);
            Debouncer::new(Duration::from_millis(config.persist_debounce_ms), move || {
                let store = Arc::clone(&store);
                let kv = Arc::clone(&kv);
                async move {
                    // held through the write so a save cannot straddle `clear_prompts`
                    let store = store.read().await;
                    if let Err(e) = persistence::save_document(kv.as_ref(), store.document()) {
                        tracing::warn!("[Persistence] failed to save document: {}", e);
                    }
                }
            })
        };

        let providers: Arc<dyn ProviderFactory> =
            Arc::new(GeminiFactory::new(config.gemini_base_url.clone()));

        Ok(Self {
            kv,
            store,
            settings: Arc::new(RwLock::new(settings)),
            config,
            persister,
            providers,
            ai_session: Arc::new(RwLock::new(AiGenerationState::default())),
            active_stream: Arc::new(Mutex::new(None)),
            stream_ids: Arc::new(AtomicU64::new(0)),
            events: None,
            export_dir,
            tasks: TaskTracker::new(),
        })
    }

    /// Open the on-disk database under the app directory
    pub fn initialize(config: AppConfig) -> AppResult<Self> {
        let database = Database::new()?;
        Self::new(Arc::new(database), config, default_export_dir()?)
    }

    /// State over a fresh in-memory database
    pub fn in_memory(export_dir: PathBuf) -> AppResult<Self> {
        Self::new(
            Arc::new(Database::new_in_memory()?),
            AppConfig::default(),
            export_dir,
        )
    }

    pub fn with_provider_factory(mut self, providers: Arc<dyn ProviderFactory>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    // ========================================================================
    // Prompt store
    // ========================================================================

    pub async fn read_store<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&PromptStore) -> T,
    {
        let store = self.store.read().await;
        f(&store)
    }

    /// Run a mutation and schedule a debounced save
    pub async fn mutate_store<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut PromptStore) -> T,
    {
        let result = {
            let mut store = self.store.write().await;
            f(&mut store)
        };
        self.persister.call();
        result
    }

    /// Write the document now
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    /// Drop every prompt, in memory and in storage
    pub async fn clear_prompts(&self) -> AppResult<usize> {
        // a save already past its debounce waits on this lock and then
        // writes the empty document, never the old one
        let mut store = self.store.write().await;
        self.persister.cancel();
        let removed = store.clear();
        persistence::clear_prompts(self.kv())?;
        drop(store);
        tracing::info!("[Store] cleared {} prompts", removed);
        Ok(removed)
    }

    // ========================================================================
    // Background commands
    // ========================================================================

    /// Run a long command off the request loop; `shutdown` waits for it
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Wait up to `grace` for background commands, then write the document
    pub async fn shutdown(&self, grace: Duration) {
        self.tasks.close();
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            tracing::warn!(
                "[Host] {} commands still running after {:?}, cancelling",
                self.tasks.len(),
                grace
            );
            self.cancel_stream().await;
        }
        self.flush().await;
    }

    pub async fn storage_stats(&self) -> AppResult<StorageStats> {
        let count = self.store.read().await.len();
        persistence::storage_stats(self.kv(), count)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Validate and apply a partial update, saving the touched partitions
    pub async fn update_settings(&self, update: &SettingsUpdate) -> AppResult<Settings> {
        let mut settings = self.settings.write().await;
        let next = settings.updated(update).map_err(AppError::validation)?;
        if update.touches_ai() {
            persistence::save_ai_settings(self.kv(), &next.ai)?;
        }
        if update.touches_appearance() {
            persistence::save_appearance(self.kv(), &next.appearance)?;
        }
        *settings = next.clone();
        Ok(next)
    }

    pub async fn toggle_theme(&self) -> AppResult<Theme> {
        let mut settings = self.settings.write().await;
        let mut appearance = settings.appearance.clone();
        appearance.theme = appearance.theme.toggled();
        persistence::save_appearance(self.kv(), &appearance)?;
        settings.appearance = appearance;
        Ok(settings.appearance.theme)
    }

    /// Reset both settings partitions to their defaults
    pub async fn clear_settings(&self) -> AppResult<Settings> {
        let mut settings = self.settings.write().await;
        persistence::clear_settings(self.kv())?;
        *settings = Settings::default();
        Ok(settings.clone())
    }

    // ========================================================================
    // AI
    // ========================================================================

    /// AI service for the current settings; fails without an API key
    pub async fn ai_service(&self) -> AppResult<AiService> {
        let settings = self.settings.read().await;
        AiService::from_settings(self.providers.as_ref(), &settings.ai)
    }

    pub fn ai_session(&self) -> Arc<RwLock<AiGenerationState>> {
        Arc::clone(&self.ai_session)
    }

    /// Register a new stream, cancelling the one already running
    pub async fn begin_stream(&self) -> (u64, CancellationToken) {
        let id = self.stream_ids.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = self.active_stream.lock().await.replace(ActiveStream {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            tracing::info!("[AI] superseding stream {}", previous.id);
            previous.token.cancel();
        }
        (id, token)
    }

    /// Forget stream `id` if it is still the active one
    pub async fn end_stream(&self, id: u64) {
        let mut active = self.active_stream.lock().await;
        if active.as_ref().is_some_and(|s| s.id == id) {
            *active = None;
        }
    }

    /// Cancel the running stream; false when nothing was running
    pub async fn cancel_stream(&self) -> bool {
        match self.active_stream.lock().await.take() {
            Some(stream) => {
                stream.token.cancel();
                tracing::info!("[AI] cancelled stream {}", stream.id);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        let Some(events) = &self.events else {
            return;
        };
        match serde_json::to_value(payload) {
            Ok(payload) => {
                let _ = events.send(AppEvent {
                    event: event.to_string(),
                    payload,
                });
            }
            Err(e) => tracing::warn!("[State] failed to serialize {} event: {}", event, e),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("persister", &self.persister)
            .field("export_dir", &self.export_dir)
            .finish()
    }
}
