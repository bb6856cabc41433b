use crate::config::{ArtifactPaths, EngineConfig};
use cropwise_core::{rank, Classifier, Error, MlpClassifier, Recommendation, Result, Vector};
use cropwise_schema::{CatalogOptions, SchemaCatalog};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Catalog and model produced by one successful artifact load
pub struct LoadedArtifacts {
    pub catalog: SchemaCatalog,
    pub model: Arc<dyn Classifier>,
}

/// Where an engine gets its training artifacts from
pub trait ArtifactSource: Send + Sync {
    fn load(&self) -> Result<LoadedArtifacts>;
}

/// Artifacts read from the file system
pub struct FileArtifacts {
    paths: ArtifactPaths,
    options: CatalogOptions,
}

impl FileArtifacts {
    pub fn new(paths: ArtifactPaths, options: CatalogOptions) -> Self {
        Self { paths, options }
    }
}

impl ArtifactSource for FileArtifacts {
    fn load(&self) -> Result<LoadedArtifacts> {
        info!("Loading reference dataset from {:?}", self.paths.dataset);
        let catalog = SchemaCatalog::load(&self.paths.dataset, &self.paths.metadata, &self.options)?;

        info!("Loading model from {:?}", self.paths.model);
        let model = MlpClassifier::load(&self.paths.model)?;
        if model.input_dim() != catalog.feature_columns().len() {
            warn!(
                model_inputs = model.input_dim(),
                feature_columns = catalog.feature_columns().len(),
                "model input width differs from metadata; predictions will fail"
            );
        }
        if model.output_dim() != catalog.classes().len() {
            warn!(
                model_outputs = model.output_dim(),
                classes = catalog.classes().len(),
                "model output width differs from class list; predictions will fail"
            );
        }

        Ok(LoadedArtifacts {
            catalog,
            model: Arc::new(model),
        })
    }
}

/// Lifecycle of an engine. The only transition is `Uninitialized -> Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
}

struct Ready {
    catalog: SchemaCatalog,
    model: Arc<dyn Classifier>,
}

/// Crop recommendation engine
///
/// Shared by reference across request handlers. Artifacts load at most once,
/// either through [`Engine::initialize`] or lazily on the first prediction;
/// a failed load leaves the engine uninitialized and is retried on the next
/// call.
pub struct Engine {
    source: Option<Box<dyn ArtifactSource>>,
    top_k: usize,
    ready: RwLock<Option<Arc<Ready>>>,
    load_lock: Mutex<()>,
}

impl Engine {
    /// An uninitialized engine reading artifacts from the configured paths
    pub fn new(config: EngineConfig) -> Self {
        let source = FileArtifacts::new(config.artifacts, config.catalog);
        Self::with_source(source, config.top_k)
    }

    /// An uninitialized engine with a custom artifact source
    pub fn with_source<S: ArtifactSource + 'static>(source: S, top_k: usize) -> Self {
        Self {
            source: Some(Box::new(source)),
            top_k,
            ready: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// A ready engine over an already built catalog and model
    pub fn from_parts(catalog: SchemaCatalog, model: Arc<dyn Classifier>, top_k: usize) -> Self {
        Self {
            source: None,
            top_k,
            ready: RwLock::new(Some(Arc::new(Ready { catalog, model }))),
            load_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> EngineState {
        if self.ready.read().is_some() {
            EngineState::Ready
        } else {
            EngineState::Uninitialized
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Load artifacts now, returning the load error if there is one
    pub fn initialize(&self) -> Result<()> {
        self.load_once().map(|_| ())
    }

    fn load_once(&self) -> Result<Arc<Ready>> {
        if let Some(ready) = self.ready.read().as_ref() {
            return Ok(ready.clone());
        }

        let _guard = self.load_lock.lock();
        // another caller may have finished loading while we waited
        if let Some(ready) = self.ready.read().as_ref() {
            return Ok(ready.clone());
        }

        let source = self.source.as_ref().ok_or(Error::EngineNotReady)?;
        let LoadedArtifacts { catalog, model } = source.load()?;
        info!(
            features = catalog.feature_columns().len(),
            classes = catalog.classes().len(),
            "Engine ready"
        );

        let ready = Arc::new(Ready { catalog, model });
        *self.ready.write() = Some(ready.clone());
        Ok(ready)
    }

    fn ensure_ready(&self) -> Result<Arc<Ready>> {
        self.load_once().map_err(|e| {
            if e.is_startup_fatal() {
                error!("Failed to load training artifacts: {}", e);
            } else {
                error!("Unexpected error while loading the engine: {}", e);
            }
            Error::EngineNotReady
        })
    }

    /// Feature vector the model would see for `payload`
    pub fn prepare(&self, payload: &Map<String, Value>) -> Result<Vector> {
        let ready = self.ensure_ready()?;
        ready.catalog.prepare(payload).map_err(prediction_failed)
    }

    /// Top recommendations for `payload`, best first
    pub fn predict(&self, payload: &Map<String, Value>) -> Result<Vec<Recommendation>> {
        let ready = self.ensure_ready()?;
        let features = ready.catalog.prepare(payload).map_err(prediction_failed)?;
        let scores = ready
            .model
            .predict_scores(&features)
            .map_err(prediction_failed)?;
        rank(&scores, ready.catalog.classes(), self.top_k)
    }

    /// Class labels in model output order
    pub fn classes(&self) -> Result<Vec<String>> {
        Ok(self.ensure_ready()?.catalog.classes().to_vec())
    }
}

fn prediction_failed(err: Error) -> Error {
    match err {
        Error::PredictionFailed(_) => err,
        other => Error::PredictionFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropwise_core::{Activation, DenseLayer};
    use cropwise_schema::{ArtifactMetadata, ReferenceTable};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;

    const CSV: &str = "\
District,Soil_Type,Rainfall,Primary_Crop,Recommended_Crop
Guntur,Black,850,Cotton,Cotton
Krishna,Alluvial,1020,Paddy,Paddy
Anantapur,Red,550,Groundnut,Maize
";

    fn catalog() -> SchemaCatalog {
        let table = ReferenceTable::from_reader(CSV.as_bytes()).unwrap();
        let metadata = ArtifactMetadata {
            feature_columns: vec![
                "Rainfall".to_string(),
                "Soil_Type_Black".to_string(),
                "Soil_Type_Red".to_string(),
            ],
            classes: vec!["Paddy".to_string(), "Maize".to_string(), "Cotton".to_string()],
        };
        SchemaCatalog::build(table, metadata, &CatalogOptions::default()).unwrap()
    }

    fn constant_model(scores: Vec<f32>, inputs: usize) -> Arc<dyn Classifier> {
        Arc::new(
            MlpClassifier::new(vec![DenseLayer {
                weights: vec![vec![0.0; scores.len()]; inputs],
                bias: scores,
                activation: Activation::Linear,
            }])
            .unwrap(),
        )
    }

    struct CountingSource {
        loads: Arc<AtomicUsize>,
        healthy: Arc<AtomicBool>,
    }

    impl ArtifactSource for CountingSource {
        fn load(&self) -> Result<LoadedArtifacts> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if !self.healthy.load(Ordering::SeqCst) {
                return Err(Error::ArtifactMissing("croprecommender_mlp.json".into()));
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(LoadedArtifacts {
                catalog: catalog(),
                model: constant_model(vec![0.7, 0.2, 0.1], 3),
            })
        }
    }

    fn counting_engine(healthy: bool) -> (Engine, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let flag = Arc::new(AtomicBool::new(healthy));
        let engine = Engine::with_source(
            CountingSource {
                loads: loads.clone(),
                healthy: flag.clone(),
            },
            3,
        );
        (engine, loads, flag)
    }

    struct FailingSource {
        fatal: bool,
    }

    impl ArtifactSource for FailingSource {
        fn load(&self) -> Result<LoadedArtifacts> {
            if self.fatal {
                Err(Error::SchemaInvalid("no label column".to_string()))
            } else {
                Err(Error::PredictionFailed("loader crashed".to_string()))
            }
        }
    }

    #[test]
    fn test_any_load_failure_leaves_engine_not_ready() {
        for fatal in [true, false] {
            let engine = Engine::with_source(FailingSource { fatal }, 3);
            assert!(matches!(engine.predict(&Map::new()), Err(Error::EngineNotReady)));
            assert!(matches!(engine.classes(), Err(Error::EngineNotReady)));
            assert_eq!(engine.state(), EngineState::Uninitialized);
        }
    }

    #[test]
    fn test_fixed_scores_ranked() {
        let engine = Engine::from_parts(catalog(), constant_model(vec![0.7, 0.2, 0.1], 3), 3);
        let result = engine.predict(&Map::new()).unwrap();
        assert_eq!(
            result,
            vec![
                Recommendation::new("Paddy", 0.7),
                Recommendation::new("Maize", 0.2),
                Recommendation::new("Cotton", 0.1),
            ]
        );
    }

    #[test]
    fn test_lazy_load_on_first_predict() {
        let (engine, loads, _) = counting_engine(true);
        assert_eq!(engine.state(), EngineState::Uninitialized);

        engine.predict(&Map::new()).unwrap();
        engine.predict(&Map::new()).unwrap();

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_requests_load_once() {
        let (engine, loads, _) = counting_engine(true);
        let engine = Arc::new(engine);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.predict(&Map::new()).unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_failed_load_reports_not_ready_then_recovers() {
        let (engine, loads, healthy) = counting_engine(false);

        assert!(matches!(engine.initialize(), Err(Error::ArtifactMissing(_))));
        assert!(matches!(engine.predict(&Map::new()), Err(Error::EngineNotReady)));
        assert!(matches!(engine.classes(), Err(Error::EngineNotReady)));
        assert_eq!(engine.state(), EngineState::Uninitialized);

        healthy.store(true, Ordering::SeqCst);
        assert!(engine.predict(&Map::new()).is_ok());
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(loads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_shape_mismatch_is_prediction_failed() {
        let engine = Engine::from_parts(catalog(), constant_model(vec![0.5, 0.5, 0.5], 7), 3);
        assert!(matches!(
            engine.predict(&Map::new()),
            Err(Error::PredictionFailed(_))
        ));

        let engine = Engine::from_parts(catalog(), constant_model(vec![0.5, 0.5], 3), 3);
        assert!(matches!(
            engine.predict(&Map::new()),
            Err(Error::PredictionFailed(_))
        ));
    }

    #[test]
    fn test_predict_is_idempotent() {
        let engine = Engine::from_parts(catalog(), constant_model(vec![0.1, 0.6, 0.3], 3), 3);
        let payload = json!({"Soil_Type": "Black", "Rainfall": "n/a"});
        let payload = payload.as_object().unwrap();
        assert_eq!(engine.predict(payload).unwrap(), engine.predict(payload).unwrap());
        assert_eq!(engine.prepare(payload).unwrap(), engine.prepare(payload).unwrap());
    }

    #[test]
    fn test_top_k_respected() {
        let engine = Engine::from_parts(catalog(), constant_model(vec![0.1, 0.6, 0.3], 3), 1);
        let result = engine.predict(&Map::new()).unwrap();
        assert_eq!(result, vec![Recommendation::new("Maize", 0.6)]);
    }

    #[test]
    fn test_missing_files_keep_engine_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(EngineConfig {
            artifacts: ArtifactPaths::in_dir(dir.path()),
            ..EngineConfig::default()
        });
        assert!(matches!(engine.initialize(), Err(Error::ArtifactMissing(_))));
        assert_eq!(engine.state(), EngineState::Uninitialized);
    }
}
