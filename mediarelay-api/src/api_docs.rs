use crate::handlers::{media, tasks};
use crate::version;
use mediarelay_common::{ImageMime, ImageSource, InlineFile, RehostOutcome, SignedUpload};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        media::upload_files,
        media::rehost_urls,
        media::sign_upload,
        tasks::create_task
    ),
    components(
        schemas(
            media::UploadRequest,
            media::RehostRequest,
            media::RehostResponse,
            media::SignUploadRequest,
            tasks::CreateTaskRequest,
            tasks::CreateTaskResponse,
            version::VersionInfo,
            InlineFile,
            ImageSource,
            ImageMime,
            RehostOutcome,
            SignedUpload
        )
    ),
    tags(
        (name = "Media", description = "Image rehosting with type sniffing and fetch verification"),
        (name = "Tasks", description = "Job submission to the generation API")
    )
)]
pub struct ApiDoc;
