use crate::{ImageHost, UploadedObject};
use anyhow::{bail, Result};
use async_trait::async_trait;
use mediarelay_common::ImageMime;
use std::sync::Mutex;

/// One upload recorded by [`MockImageHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockUpload {
    pub file_name: String,
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

/// In-memory host for local runs and tests.
///
/// Public URLs are `<base_url>/<file_name>`; whatever serves `base_url` decides
/// whether verification passes.
pub struct MockImageHost {
    base_url: String,
    uploads: Mutex<Vec<MockUpload>>,
    fail_uploads: bool,
}

impl MockImageHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            uploads: Mutex::new(Vec::new()),
            fail_uploads: false,
        }
    }

    /// A host whose upload endpoint always errors.
    pub fn failing(base_url: impl Into<String>) -> Self {
        Self {
            fail_uploads: true,
            ..Self::new(base_url)
        }
    }

    pub fn uploads(&self) -> Vec<MockUpload> {
        self.uploads
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, file_name: &str) -> Option<MockUpload> {
        self.uploads()
            .into_iter()
            .rev()
            .find(|u| u.file_name == file_name)
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime: ImageMime,
    ) -> Result<UploadedObject> {
        if self.fail_uploads {
            bail!("mock upload endpoint unavailable");
        }
        let Ok(mut uploads) = self.uploads.lock() else {
            bail!("mock upload store poisoned");
        };
        uploads.push(MockUpload {
            file_name: file_name.to_string(),
            mime,
            bytes: bytes.to_vec(),
        });
        Ok(UploadedObject {
            public_url: format!("{}/{}", self.base_url, file_name),
            object_path: Some(file_name.to_string()),
        })
    }
}
