//! One processing pass: every submitted image is written to disk, uploaded,
//! described by the model, and recorded in a report, strictly in order.
//!
//! The first failure ends the pass. Whatever was recorded before it stays in
//! the report; nothing after it runs. A pass with no images does nothing and
//! reports [`BatchOutcome::Empty`].

use crate::{
    model::{ImageDescriber, ModelError},
    prompts::{Category, PromptTemplate},
    storage::{ObjectStore, StorageError},
};
use bytes::Bytes;
use image::ImageFormat;
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use thiserror::Error;
use tracing::Instrument;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];
pub const COMPLETED_MESSAGE: &str = "All images completed!";

/// A file taken from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    /// Keeps only the base name of `raw_name`. Returns `None` when there is no
    /// usable name or the extension is not one the picker accepts.
    pub fn new(raw_name: &str, content_type: Option<&str>, bytes: Bytes) -> Option<Self> {
        let file_name = base_name(raw_name)?;
        if !has_allowed_extension(&file_name) {
            return None;
        }
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime_type(&file_name).to_string());
        Some(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Last path component of a client-supplied file name, either separator style.
pub fn base_name(raw_name: &str) -> Option<String> {
    raw_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}

pub fn has_allowed_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

fn guess_mime_type(file_name: &str) -> &'static str {
    match ImageFormat::from_path(file_name) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    WriteTempFile,
    Upload,
    Generate,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to write {path}: {source}")]
    WriteTempFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),
    #[error("model call failed: {0}")]
    Generate(#[from] ModelError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::WriteTempFile { .. } => Stage::WriteTempFile,
            PipelineError::Upload(_) => Stage::Upload,
            PipelineError::Generate(_) => Stage::Generate,
        }
    }
}

/// Both variants carry `index`, the image's 0-based position in the submitted
/// batch. File names are not unique within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderEvent {
    Uploaded {
        index: usize,
        file_name: String,
        locator: String,
        message: String,
    },
    Captioned {
        index: usize,
        file_name: String,
        content_type: String,
        caption: String,
        processing_time_ms: u128,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed {
        message: String,
    },
    /// Nothing was submitted, so nothing ran.
    Empty,
    Aborted {
        file_name: String,
        stage: Stage,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub category: Category,
    pub events: Vec<RenderEvent>,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Completed { .. })
    }

    pub fn captions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.events.iter().filter_map(|e| match e {
            RenderEvent::Captioned {
                file_name, caption, ..
            } => Some((file_name.as_str(), caption.as_str())),
            _ => None,
        })
    }
}

/// The service object behind every pass. Built once at startup.
#[derive(Clone)]
pub struct Analyzer {
    store: Arc<dyn ObjectStore>,
    describer: Arc<dyn ImageDescriber>,
    upload_dir: PathBuf,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        describer: Arc<dyn ImageDescriber>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            describer,
            upload_dir: upload_dir.into(),
        }
    }

    pub async fn run(&self, category: Category, images: Vec<UploadedImage>) -> BatchReport {
        let span = tracing::info_span!(
            "batch",
            category = category.label(),
            images = images.len()
        );
        self.run_batch(category, images).instrument(span).await
    }

    async fn run_batch(&self, category: Category, images: Vec<UploadedImage>) -> BatchReport {
        // one template for the whole pass
        let template = category.template();
        let mut events = Vec::with_capacity(images.len() * 2);

        if images.is_empty() {
            tracing::info!("no images submitted");
            return BatchReport {
                category,
                events,
                outcome: BatchOutcome::Empty,
            };
        }

        for (index, image) in images.iter().enumerate() {
            if let Err(e) = self.process(index, image, template, &mut events).await {
                tracing::error!("{} failed at {:?}: {}", image.file_name, e.stage(), e);
                return BatchReport {
                    category,
                    events,
                    outcome: BatchOutcome::Aborted {
                        file_name: image.file_name.clone(),
                        stage: e.stage(),
                        error: e.to_string(),
                    },
                };
            }
        }

        tracing::info!("{} image(s) completed", images.len());
        BatchReport {
            category,
            events,
            outcome: BatchOutcome::Completed {
                message: COMPLETED_MESSAGE.to_string(),
            },
        }
    }

    /// The temp copy lives at `upload_dir/<file_name>` and is never removed.
    /// Passes are not isolated from each other: two concurrent passes holding a
    /// file of the same name share that path, so one can upload the bytes the
    /// other wrote. A single operator running one pass at a time never sees it.
    async fn process(
        &self,
        index: usize,
        image: &UploadedImage,
        template: PromptTemplate,
        events: &mut Vec<RenderEvent>,
    ) -> Result<(), PipelineError> {
        let start = Instant::now();

        // same-named files in one pass overwrite each other; the copy is kept
        let path = self.upload_dir.join(&image.file_name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|source| PipelineError::WriteTempFile {
                path: path.clone(),
                source,
            })?;

        let locator = self.store.upload(&path).await?;
        tracing::info!("{} uploaded to {}", image.file_name, locator);
        events.push(RenderEvent::Uploaded {
            index,
            file_name: image.file_name.clone(),
            locator: locator.to_string(),
            message: format!("{} upload successful!", image.file_name),
        });

        let caption = self.describer.describe(&locator, template).await?;
        let processing_time_ms = start.elapsed().as_millis();
        tracing::info!(
            "{} described in {}ms ({} chars)",
            image.file_name,
            processing_time_ms,
            caption.len()
        );
        events.push(RenderEvent::Captioned {
            index,
            file_name: image.file_name.clone(),
            content_type: image.content_type.clone(),
            caption,
            processing_time_ms,
        });

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{analyzer, Call, TEST_BUCKET};
    use super::*;
    use crate::storage::BucketUploader;
    use opendal::{services::Memory, Operator};

    fn image(name: &str, bytes: &'static [u8]) -> UploadedImage {
        UploadedImage::new(name, None, Bytes::from_static(bytes)).unwrap()
    }

    fn locator(name: &str) -> String {
        format!("gs://{TEST_BUCKET}/{name}")
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("photo.jpg").as_deref(), Some("photo.jpg"));
        assert_eq!(base_name("../../etc/photo.jpg").as_deref(), Some("photo.jpg"));
        assert_eq!(base_name("C:\\Users\\me\\chart.png").as_deref(), Some("chart.png"));
        assert_eq!(base_name("dir/"), None);
        assert_eq!(base_name(".."), None);
        assert_eq!(base_name(""), None);
    }

    #[test]
    fn test_extension_filter() {
        assert!(has_allowed_extension("photo.jpg"));
        assert!(has_allowed_extension("photo.JPEG"));
        assert!(has_allowed_extension("chart.png"));
        assert!(!has_allowed_extension("anim.gif"));
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("jpg"));
    }

    #[test]
    fn test_uploaded_image_content_type() {
        let declared = UploadedImage::new("a.png", Some("image/png"), Bytes::new()).unwrap();
        assert_eq!(declared.content_type, "image/png");
        let guessed = UploadedImage::new("a.png", None, Bytes::new()).unwrap();
        assert_eq!(guessed.content_type, "image/png");
        let guessed = UploadedImage::new("b.jpeg", None, Bytes::new()).unwrap();
        assert_eq!(guessed.content_type, "image/jpeg");
        assert!(UploadedImage::new("c.webp", None, Bytes::new()).is_none());
    }

    #[tokio::test]
    async fn test_batch_calls_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, log) = analyzer(dir.path(), None, None);

        let report = analyzer
            .run(
                Category::DataVisualization,
                vec![image("photo.jpg", b"one"), image("chart.png", b"two")],
            )
            .await;

        assert!(report.is_completed());
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Call::Upload("photo.jpg".into()),
                Call::Describe {
                    locator: locator("photo.jpg"),
                    category: Category::DataVisualization
                },
                Call::Upload("chart.png".into()),
                Call::Describe {
                    locator: locator("chart.png"),
                    category: Category::DataVisualization
                },
            ]
        );
        assert_eq!(
            report.outcome,
            BatchOutcome::Completed {
                message: COMPLETED_MESSAGE.to_string()
            }
        );
        let captions: Vec<_> = report.captions().collect();
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].0, "photo.jpg");
        assert_eq!(captions[1].1, format!("-Alt Text: {}", locator("chart.png")));
    }

    #[tokio::test]
    async fn test_each_category_uses_its_own_template() {
        for category in Category::ALL {
            let dir = tempfile::tempdir().unwrap();
            let (analyzer, log) = analyzer(dir.path(), None, None);
            analyzer
                .run(
                    category,
                    vec![image("a.jpg", b"a"), image("b.png", b"b"), image("c.jpeg", b"c")],
                )
                .await;

            let used: Vec<Category> = log
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| match c {
                    Call::Describe { category, .. } => Some(*category),
                    _ => None,
                })
                .collect();
            assert_eq!(used, vec![category; 3]);
        }
    }

    #[tokio::test]
    async fn test_model_failure_aborts_remaining_images() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, log) = analyzer(dir.path(), None, Some(1));

        let report = analyzer
            .run(
                Category::DataVisualization,
                vec![image("photo.jpg", b"one"), image("chart.png", b"two")],
            )
            .await;

        assert!(!report.is_completed());
        assert_eq!(
            report.events,
            vec![RenderEvent::Uploaded {
                index: 0,
                file_name: "photo.jpg".into(),
                locator: locator("photo.jpg"),
                message: "photo.jpg upload successful!".into(),
            }]
        );
        match &report.outcome {
            BatchOutcome::Aborted {
                file_name, stage, ..
            } => {
                assert_eq!(file_name, "photo.jpg");
                assert_eq!(*stage, Stage::Generate);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // chart.png was never uploaded
        assert_eq!(log.lock().unwrap().len(), 2);
        assert!(!dir.path().join("chart.png").exists());
    }

    #[tokio::test]
    async fn test_failure_on_kth_image_keeps_earlier_output() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, log) = analyzer(dir.path(), None, Some(2));

        let report = analyzer
            .run(
                Category::Generic,
                vec![
                    image("1.jpg", b"1"),
                    image("2.jpg", b"2"),
                    image("3.jpg", b"3"),
                ],
            )
            .await;

        let captions: Vec<_> = report.captions().map(|(name, _)| name).collect();
        assert_eq!(captions, vec!["1.jpg"]);
        assert_eq!(report.events.len(), 3);
        assert!(matches!(
            &report.outcome,
            BatchOutcome::Aborted { file_name, .. } if file_name == "2.jpg"
        ));
        let uploads = log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Upload(_)))
            .count();
        assert_eq!(uploads, 2);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, log) = analyzer(dir.path(), Some(1), None);

        let report = analyzer
            .run(Category::Other, vec![image("photo.jpg", b"one")])
            .await;

        assert!(report.events.is_empty());
        assert!(matches!(
            report.outcome,
            BatchOutcome::Aborted {
                stage: Stage::Upload,
                ..
            }
        ));
        assert_eq!(*log.lock().unwrap(), vec![Call::Upload("photo.jpg".into())]);
    }

    #[tokio::test]
    async fn test_temp_file_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let (analyzer, log) = analyzer(&missing, None, None);

        let report = analyzer
            .run(Category::Generic, vec![image("photo.jpg", b"one")])
            .await;

        assert!(matches!(
            report.outcome,
            BatchOutcome::Aborted {
                stage: Stage::WriteTempFile,
                ..
            }
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_reports_no_completion() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, log) = analyzer(dir.path(), None, None);

        let report = analyzer.run(Category::Generic, Vec::new()).await;
        assert!(!report.is_completed());
        assert_eq!(report.outcome, BatchOutcome::Empty);
        assert!(report.events.is_empty());
        assert!(log.lock().unwrap().is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], serde_json::json!({ "status": "empty" }));
        assert!(!json.to_string().contains(COMPLETED_MESSAGE));
    }

    #[tokio::test]
    async fn test_same_named_images_keep_their_positions() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, _) = analyzer(dir.path(), None, None);

        let report = analyzer
            .run(
                Category::Generic,
                vec![
                    image("photo.jpg", b"first"),
                    image("chart.png", b"chart"),
                    image("photo.jpg", b"second"),
                ],
            )
            .await;

        let positions: Vec<(usize, &str)> = report
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Captioned {
                    index, file_name, ..
                } => Some((*index, file_name.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            positions,
            vec![(0, "photo.jpg"), (1, "chart.png"), (2, "photo.jpg")]
        );
        assert!(matches!(
            report.events[4],
            RenderEvent::Uploaded { index: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_temp_files_are_kept_and_overwritten_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, _) = analyzer(dir.path(), None, None);

        analyzer
            .run(
                Category::Generic,
                vec![image("photo.jpg", b"first"), image("photo.jpg", b"second")],
            )
            .await;

        let kept = std::fs::read(dir.path().join("photo.jpg")).unwrap();
        assert_eq!(kept, b"second");
    }

    #[tokio::test]
    async fn test_same_name_overwrites_bucket_object() {
        let dir = tempfile::tempdir().unwrap();
        let op = Operator::new(Memory::default()).unwrap().finish();
        let store = BucketUploader::with_operator(TEST_BUCKET, op.clone());
        let log = super::testing::CallLog::default();
        let analyzer = Analyzer::new(
            Arc::new(store),
            Arc::new(super::testing::RecordingDescriber {
                log: log.clone(),
                fail_on: None,
            }),
            dir.path(),
        );

        analyzer
            .run(Category::Generic, vec![image("photo.jpg", b"first")])
            .await;
        let report = analyzer
            .run(Category::Generic, vec![image("photo.jpg", b"second")])
            .await;

        assert!(report.is_completed());
        assert_eq!(op.read("photo.jpg").await.unwrap().to_vec(), b"second".to_vec());
        assert_eq!(
            report.events[0],
            RenderEvent::Uploaded {
                index: 0,
                file_name: "photo.jpg".into(),
                locator: locator("photo.jpg"),
                message: "photo.jpg upload successful!".into(),
            }
        );
    }

    #[test]
    fn test_report_json() {
        let report = BatchReport {
            category: Category::ComplexDiagram,
            events: vec![RenderEvent::Uploaded {
                index: 0,
                file_name: "flow.png".into(),
                locator: locator("flow.png"),
                message: "flow.png upload successful!".into(),
            }],
            outcome: BatchOutcome::Aborted {
                file_name: "flow.png".into(),
                stage: Stage::Generate,
                error: "model call failed".into(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"], "complex-diagram");
        assert_eq!(json["events"][0]["kind"], "uploaded");
        assert_eq!(json["outcome"]["status"], "aborted");
        assert_eq!(json["outcome"]["stage"], "generate");
    }
}
