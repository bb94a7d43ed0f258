//! Application state: configuration, the generation backend, the upload
//! extractor and the registry of interaction sessions.
//!
//! Backend selection at startup:
//!   - `generation_endpoint` configured -> chat endpoint client
//!   - else `OPENAI_API_KEY` present     -> OpenAI
//!   - else                              -> disabled (every generation fails)
//!
//! Sessions carry a last-touched time. `spawn_session_sweeper` drops the ones
//! idle for longer than `session_ttl_secs` that no request or socket holds.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::controller::InteractionController;
use crate::errors::{AppError, AppResult};
use crate::generation::{ChatEndpointClient, Disabled, Generator};
use crate::openai::OpenAI;
use crate::upload::Extractor;

/// One hosted controller. The lock is never held across a generation call.
pub type Session = Arc<Mutex<InteractionController>>;

pub struct SessionEntry {
    pub session: Session,
    pub last_touched: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub generator: Arc<dyn Generator>,
    pub extractor: Extractor,
    pub sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl AppState {
    /// Build state from config + env: pick a generation backend, set up uploads.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: ServiceConfig) -> Self {
        let generator = select_generator(&config);
        let extractor = Extractor::new(config.extraction_endpoint.clone(), config.max_upload_bytes);
        if extractor.endpoint.is_none() {
            info!(target: "differentie_backend", "No extraction endpoint; only .txt uploads can be converted.");
        }
        Self::from_parts(config, generator, extractor)
    }

    pub fn from_parts(
        config: ServiceConfig,
        generator: Arc<dyn Generator>,
        extractor: Extractor,
    ) -> Self {
        Self {
            config,
            generator,
            extractor,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new controller in `ModeSelect`.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> (String, Session) {
        let id = Uuid::new_v4().to_string();
        let session: Session = Arc::new(Mutex::new(InteractionController::new()));
        let entry = SessionEntry { session: session.clone(), last_touched: Instant::now() };
        self.sessions.write().await.insert(id.clone(), entry);
        info!(target: "differentie_backend", session_id = %id, "Session created");
        (id, session)
    }

    /// Look up a session and mark it as used.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> AppResult<Session> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("sessie {id}")))?;
        entry.last_touched = Instant::now();
        Ok(entry.session.clone())
    }

    /// Forget a session. A generation still running for it finishes unobserved.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) -> AppResult<()> {
        match self.sessions.write().await.remove(id) {
            Some(_) => {
                info!(target: "differentie_backend", session_id = %id, "Session removed");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("sessie {id}"))),
        }
    }

    /// Drop sessions idle for at least the configured TTL. A session still
    /// referenced elsewhere (open socket, running request) is kept.
    /// Returns how many were removed.
    pub async fn sweep_idle_sessions(&self) -> usize {
        let ttl = self.config.session_ttl();
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            Arc::strong_count(&entry.session) > 1 || now.duration_since(entry.last_touched) < ttl
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(target: "differentie_backend", removed, remaining = sessions.len(), "Idle sessions swept");
        }
        removed
    }
}

/// Periodically sweep idle sessions, at a quarter of the TTL (at least once a second).
pub fn spawn_session_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = (state.config.session_ttl() / 4).max(Duration::from_secs(1));
    debug!(target: "differentie_backend", ?period, "Session sweeper started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.sweep_idle_sessions().await;
        }
    })
}

fn select_generator(config: &ServiceConfig) -> Arc<dyn Generator> {
    if let Some(url) = &config.generation_endpoint {
        match ChatEndpointClient::new(url.clone()) {
            Ok(client) => {
                info!(target: "differentie_backend", %url, "Generation via chat endpoint.");
                return Arc::new(client);
            }
            Err(e) => {
                error!(target: "differentie_backend", %url, error = ?e, "Failed to build chat endpoint client");
            }
        }
    }

    if let Some(oa) = OpenAI::from_env(config.generation_timeout()) {
        info!(target: "differentie_backend", base_url = %oa.base_url, strong_model = %oa.strong_model, "OpenAI enabled.");
        return Arc::new(oa);
    }

    error!(target: "differentie_backend", "No generation backend (set GENERATION_ENDPOINT or OPENAI_API_KEY); generation requests will fail.");
    Arc::new(Disabled)
}
