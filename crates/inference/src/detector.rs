use common::span;
use crate::{
    backend::InferenceBackend,
    config::InferenceConfig,
    error::DetectError,
    processing::post::{Detection, PostProcessor},
};
use ndarray::{Array, ArrayD, IxDyn};
use once_cell::sync::OnceCell;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use preprocess::{DecodedImage, PreProcessor, decode_image};
use std::sync::Mutex;
use std::time::Instant;

/// Builds an engine instance; called at most once per successful load.
pub type BackendLoader =
    Box<dyn Fn() -> anyhow::Result<Box<dyn InferenceBackend>> + Send + Sync>;

struct DetectorMetrics {
    duration_histogram: Histogram<f64>,
    requests_counter: Counter<u64>,
    detections_counter: Counter<u64>,
}

fn init_metrics(meter_name: &'static str) -> DetectorMetrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
    ];
    DetectorMetrics {
        duration_histogram: meter
            .f64_histogram("detector_duration_seconds")
            .with_description("Time to process one image (decode + preprocess + infer + postprocess)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build(),
        requests_counter: meter
            .u64_counter("detector_requests_total")
            .with_description("Total images submitted for detection")
            .build(),
        detections_counter: meter
            .u64_counter("detector_detections_total")
            .with_description("Total detections returned")
            .build(),
    }
}

/// Runs the whole image → detections pipeline against one shared engine.
///
/// The engine is created on first use (or by [`Detector::warm_up`]) behind a
/// one-time barrier: concurrent callers arriving during the load block until
/// it finishes. A failed load leaves the barrier open so a later call can
/// retry. Calls into the engine are serialized by a mutex; decoding,
/// preprocessing and post-processing run outside the lock.
pub struct Detector {
    config: InferenceConfig,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
    loader: BackendLoader,
    engine: OnceCell<Mutex<Box<dyn InferenceBackend>>>,
    metrics: DetectorMetrics,
}

impl Detector {
    /// Detector whose engine is `B` loaded from `config`.
    pub fn new<B: InferenceBackend + 'static>(config: InferenceConfig) -> Self {
        let load_config = config.clone();
        let loader: BackendLoader = Box::new(move || {
            let backend = B::load_model(&load_config)?;
            Ok(Box::new(backend) as Box<dyn InferenceBackend>)
        });
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: InferenceConfig, loader: BackendLoader) -> Self {
        let preprocessor = PreProcessor::new(config.input_size());
        let postprocessor = PostProcessor::new(
            config.confidence_threshold,
            config.iou_threshold,
            config.input_size(),
        );
        Self {
            config,
            preprocessor,
            postprocessor,
            loader,
            engine: OnceCell::new(),
            metrics: init_metrics("detector"),
        }
    }

    /// Whether the engine has been loaded.
    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Load the engine now instead of on the first request.
    pub fn warm_up(&self) -> Result<(), DetectError> {
        self.engine().map(|_| ())
    }

    /// Detect objects in an encoded (JPEG/PNG/GIF) image.
    #[tracing::instrument(skip(self, image_bytes), fields(bytes = image_bytes.len()))]
    pub fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, DetectError> {
        let start = Instant::now();

        let result = decode_image(image_bytes)
            .map_err(DetectError::from)
            .and_then(|image| self.detect_image(&image));

        let status = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_client_error() => "rejected",
            Err(_) => "error",
        };
        let attributes = [KeyValue::new("status", status)];
        self.metrics
            .duration_histogram
            .record(start.elapsed().as_secs_f64(), &attributes);
        self.metrics.requests_counter.add(1, &attributes);

        if let Ok(detections) = &result {
            self.metrics
                .detections_counter
                .add(detections.len() as u64, &[]);
        }

        result
    }

    /// Detect objects in an already decoded image.
    pub fn detect_image(&self, image: &DecodedImage) -> Result<Vec<Detection>, DetectError> {
        let prepared = self.preprocessor.prepare(image)?;

        let output = self.infer(&prepared.tensor)?;

        self.postprocessor
            .process(&output.view(), prepared.orig_width, prepared.orig_height)
    }

    fn infer(&self, input: &Array<f32, IxDyn>) -> Result<ArrayD<f32>, DetectError> {
        let engine = self.engine()?;

        let _infer_span = span!("model_inference");

        let mut backend = engine.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Inference engine lock was poisoned by a panicking request");
            poisoned.into_inner()
        });

        backend.infer(input).map_err(DetectError::Inference)
    }

    fn engine(&self) -> Result<&Mutex<Box<dyn InferenceBackend>>, DetectError> {
        self.engine.get_or_try_init(|| {
            tracing::info!(
                model_path = %self.config.model_path,
                provider = ?self.config.execution_provider,
                "Loading inference model"
            );
            let start = Instant::now();

            let backend = (self.loader)().map_err(|e| {
                tracing::error!(error = %e, "Failed to load inference model");
                DetectError::Inference(e)
            })?;

            tracing::info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Model loaded successfully"
            );
            Ok(Mutex::new(backend))
        })
    }
}
