// Service configuration, resolved once at startup and passed into AppState

use mediarelay_common::RelayError;
use mediarelay_providers::kie;
use mediarelay_providers::supabase::SupabaseConfig;
use mediarelay_providers::RehostConfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadBackend {
    Kie,
    Supabase,
    Mock,
}

impl UploadBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kie" => Some(Self::Kie),
            "supabase" => Some(Self::Supabase),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub upload_backend: UploadBackend,
    pub kie_api_key: Option<String>,
    pub kie_base_url: String,
    pub kie_upload_url: String,
    pub kie_upload_path: String,
    pub supabase: Option<SupabaseConfig>,
    pub mock_host_base_url: Option<String>,
    pub callback_url: Option<String>,
    pub rehost: RehostConfig,
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_num = |key: &str, default: u64| -> Result<u64, RelayError> {
            match get(key) {
                None => Ok(default),
                Some(v) => v.parse::<u64>().map_err(|_| RelayError::InvalidConfiguration {
                    name: key.to_string(),
                    value: v,
                }),
            }
        };

        let bind_addr = match get("BIND_ADDR") {
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
            Some(v) => v.parse().map_err(|_| RelayError::InvalidConfiguration {
                name: "BIND_ADDR".to_string(),
                value: v,
            })?,
        };

        let upload_backend = match get("UPLOAD_BACKEND") {
            None => UploadBackend::Kie,
            Some(v) => UploadBackend::parse(&v).ok_or(RelayError::InvalidConfiguration {
                name: "UPLOAD_BACKEND".to_string(),
                value: v,
            })?,
        };

        let kie_api_key = get("KIE_API_KEY");
        if upload_backend == UploadBackend::Kie && kie_api_key.is_none() {
            return Err(RelayError::MissingConfiguration("KIE_API_KEY".to_string()));
        }

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_BUCKET")) {
            (Some(url), Some(bucket)) => {
                let service_key = get("SUPABASE_SERVICE_ROLE_KEY")
                    .or_else(|| get("SUPABASE_SERVICE_KEY"))
                    .ok_or_else(|| {
                        RelayError::MissingConfiguration(
                            "SUPABASE_SERVICE_ROLE_KEY (or SUPABASE_SERVICE_KEY)".to_string(),
                        )
                    })?;
                Some(SupabaseConfig {
                    url,
                    bucket,
                    service_key,
                    sign_expires_secs: parse_num("SIGN_EXP", 3600)?,
                    path_prefix: get("SUPABASE_PATH_PREFIX")
                        .unwrap_or_else(|| kie::DEFAULT_UPLOAD_PATH.to_string()),
                })
            }
            _ => None,
        };
        if upload_backend == UploadBackend::Supabase && supabase.is_none() {
            let missing = if get("SUPABASE_URL").is_none() {
                "SUPABASE_URL"
            } else {
                "SUPABASE_BUCKET"
            };
            return Err(RelayError::MissingConfiguration(missing.to_string()));
        }

        let mock_host_base_url = get("MOCK_HOST_BASE_URL");
        if upload_backend == UploadBackend::Mock && mock_host_base_url.is_none() {
            return Err(RelayError::MissingConfiguration("MOCK_HOST_BASE_URL".to_string()));
        }

        let defaults = RehostConfig::default();
        let rehost = RehostConfig {
            max_files: parse_num("MAX_FILES", defaults.max_files as u64)? as usize,
            max_file_bytes: parse_num("MAX_FILE_BYTES", defaults.max_file_bytes as u64)? as usize,
            fetch_timeout: Duration::from_secs(parse_num(
                "FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            verify_timeout: Duration::from_secs(parse_num(
                "VERIFY_TIMEOUT_SECS",
                defaults.verify_timeout.as_secs(),
            )?),
        };

        Ok(Self {
            bind_addr,
            upload_backend,
            kie_api_key,
            kie_base_url: get("KIE_BASE_URL").unwrap_or_else(|| kie::DEFAULT_BASE_URL.to_string()),
            kie_upload_url: get("KIE_UPLOAD_URL")
                .unwrap_or_else(|| kie::DEFAULT_UPLOAD_URL.to_string()),
            kie_upload_path: get("KIE_UPLOAD_PATH")
                .unwrap_or_else(|| kie::DEFAULT_UPLOAD_PATH.to_string()),
            supabase,
            mock_host_base_url,
            callback_url: get("CALLBACK_URL"),
            rehost,
        })
    }

    /// Request body cap: every file at full size, base64-encoded, plus slack for JSON.
    pub fn max_body_bytes(&self) -> usize {
        self.rehost
            .max_files
            .max(1)
            .saturating_mul(self.rehost.max_file_bytes)
            .saturating_mul(4)
            / 3
            + 64 * 1024
    }
}
