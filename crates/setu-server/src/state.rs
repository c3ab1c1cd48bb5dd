use crate::api::ApiError;
use crate::hub::LocationHub;
use setu_config::AppConfig;
use setu_dispatch::{build_transport, build_verifier, Dispatcher, PhoneVerifier};
use setu_store::Store;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    pub dispatcher: Arc<Dispatcher>,
    pub hub: Arc<LocationHub>,
    pub verifier: Option<Arc<dyn PhoneVerifier>>,
}

impl AppState {
    pub fn new(store: Store, dispatcher: Dispatcher) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            dispatcher: Arc::new(dispatcher),
            hub: Arc::new(LocationHub::new()),
            verifier: None,
        }
    }

    pub fn from_config(config: &AppConfig, store: Store) -> setu_dispatch::Result<Self> {
        let transport = build_transport(config)?;
        let dispatcher = Dispatcher::new(transport, config.default_country_code.clone());
        let mut state = Self::new(store, dispatcher);
        state.verifier = build_verifier(config)?;
        Ok(state)
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn PhoneVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Never hold the guard across an `.await`.
    pub fn lock_store(&self) -> Result<MutexGuard<'_, Store>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }
}
