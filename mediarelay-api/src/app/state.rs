use mediarelay_common::RelayError;
use mediarelay_providers::kie::{KieTaskClient, KieUploadHost};
use mediarelay_providers::mock::MockImageHost;
use mediarelay_providers::supabase::SupabaseStorageHost;
use mediarelay_providers::{ImageHost, Rehoster, TaskApi};
use std::sync::Arc;

use crate::settings::{Settings, UploadBackend};

pub struct AppState {
    pub settings: Settings,
    pub rehoster: Rehoster,
    /// Absent when no KIE key is configured; `/tasks` then answers 500.
    pub tasks: Option<Arc<dyn TaskApi>>,
    /// Absent without Supabase settings; `/sign-upload` then answers 500.
    pub storage: Option<Arc<SupabaseStorageHost>>,
}

fn startup_error(what: &str, e: anyhow::Error) -> RelayError {
    RelayError::InvalidConfiguration {
        name: what.to_string(),
        value: format!("{:#}", e),
    }
}

impl AppState {
    pub fn new(
        settings: Settings,
        host: Arc<dyn ImageHost>,
        tasks: Option<Arc<dyn TaskApi>>,
        storage: Option<Arc<SupabaseStorageHost>>,
    ) -> Result<Arc<Self>, RelayError> {
        let rehoster = Rehoster::new(host, settings.rehost.clone())
            .map_err(|e| startup_error("http client", e))?;
        Ok(Arc::new(Self {
            settings,
            rehoster,
            tasks,
            storage,
        }))
    }

    /// Wire the configured backends.
    pub fn from_settings(settings: Settings) -> Result<Arc<Self>, RelayError> {
        let storage = match &settings.supabase {
            Some(cfg) => Some(Arc::new(
                SupabaseStorageHost::new(cfg.clone()).map_err(|e| startup_error("supabase", e))?,
            )),
            None => None,
        };

        let tasks: Option<Arc<dyn TaskApi>> = match &settings.kie_api_key {
            Some(key) => Some(Arc::new(
                KieTaskClient::new(key.clone(), &settings.kie_base_url)
                    .map_err(|e| startup_error("KIE_API_KEY", e))?,
            )),
            None => None,
        };

        let host: Arc<dyn ImageHost> = match settings.upload_backend {
            UploadBackend::Kie => {
                let key = settings
                    .kie_api_key
                    .clone()
                    .ok_or_else(|| RelayError::MissingConfiguration("KIE_API_KEY".to_string()))?;
                Arc::new(
                    KieUploadHost::new(
                        key,
                        settings.kie_upload_url.clone(),
                        settings.kie_upload_path.clone(),
                    )
                    .map_err(|e| startup_error("KIE_UPLOAD_URL", e))?,
                )
            }
            UploadBackend::Supabase => match &storage {
                Some(s) => s.clone(),
                None => return Err(RelayError::MissingConfiguration("SUPABASE_URL".to_string())),
            },
            UploadBackend::Mock => {
                let base = settings.mock_host_base_url.clone().ok_or_else(|| {
                    RelayError::MissingConfiguration("MOCK_HOST_BASE_URL".to_string())
                })?;
                Arc::new(MockImageHost::new(base))
            }
        };

        tracing::info!(
            backend = host.name(),
            tasks = tasks.is_some(),
            signing = storage.is_some(),
            "relay backends ready"
        );
        Self::new(settings, host, tasks, storage)
    }
}
