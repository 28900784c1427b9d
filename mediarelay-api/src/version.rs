// Version information for the public /version endpoint

/// Release version, overridable at runtime through a VERSION file next to the binary
pub fn get_service_version() -> String {
    for path in ["VERSION", "../VERSION"] {
        if let Ok(contents) = std::fs::read_to_string(path) {
            let v = contents.trim();
            if !v.is_empty() {
                return v.to_string();
            }
        }
    }
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct VersionInfo {
    pub service: String,
    pub version: String,
    pub upload_backend: String,
}

pub fn get_version_info(upload_backend: &str) -> VersionInfo {
    VersionInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: get_service_version(),
        upload_backend: upload_backend.to_string(),
    }
}
