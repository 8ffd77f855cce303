use crate::source::DesignSource;
use crate::writer::{write_all_or_nothing, OutputFile};
use loom_assets::{collect, AssetCache, AssetFailure, AssetPipeline, AssetSet, ImageSource};
use loom_codegen::{asset_path, emit, EmitOptions, GeneratedArtifact};
use loom_core::{parse_str, EngineConfig, LayoutTolerances, LoomError, TokenVocabulary};
use loom_layout::{infer_tree, LayoutContext};
use loom_resolver::{resolve_tree, TokenBindings};
use loom_validate::{DiagnosticCode, Report, Validator};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Result of a successful run.
#[derive(Debug)]
pub struct RunOutput {
    pub artifacts: Vec<GeneratedArtifact>,
    /// Validation report; holds warnings only.
    pub report: Report,
    pub assets: AssetSet,
}

/// A failed run: the fatal error plus every warning gathered before it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: LoomError,
    pub report: Report,
}

impl RunFailure {
    pub fn new(error: impl Into<LoomError>) -> Self {
        Self { error: error.into(), report: Report::default() }
    }

    fn with_report(error: impl Into<LoomError>, report: Report) -> Self {
        Self { error: error.into(), report }
    }
}

/// Translates design trees into component, style sheet and asset manifest.
///
/// The engine holds the validated token vocabulary and the asset pipeline.
/// Runs borrow it immutably and may proceed concurrently.
pub struct Engine {
    vocab: Arc<TokenVocabulary>,
    tolerances: LayoutTolerances,
    pipeline: AssetPipeline,
    validator: Validator,
    options: EmitOptions,
}

impl Engine {
    /// Build an engine with a cache that lives as long as the engine.
    pub fn new(config: &EngineConfig) -> Result<Self, LoomError> {
        Self::with_cache(config, AssetCache::in_memory())
    }

    pub fn with_cache(config: &EngineConfig, cache: AssetCache) -> Result<Self, LoomError> {
        let vocab = config.vocabulary()?;
        let validator = Validator::new().map_err(|err| LoomError::Emission { message: err.to_string() })?;
        Ok(Self {
            vocab: Arc::new(vocab),
            tolerances: config.layout,
            pipeline: AssetPipeline::new(config, cache),
            validator,
            options: EmitOptions::default(),
        })
    }

    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn vocabulary(&self) -> &TokenVocabulary {
        &self.vocab
    }

    pub fn pipeline(&self) -> &AssetPipeline {
        &self.pipeline
    }

    /// Fetch a design tree and generate its artifacts without writing them.
    pub async fn generate<S: DesignSource>(&self, source: &S, reference: &str) -> Result<RunOutput, RunFailure> {
        async {
            let raw = source.fetch_design_tree(reference).await.map_err(RunFailure::new)?;
            self.generate_from_str(source, &raw).await
        }
        .instrument(info_span!("generate", reference))
        .await
    }

    /// Generate artifacts from a raw JSON design tree.
    pub async fn generate_from_str<S: ImageSource>(&self, images: &S, raw: &str) -> Result<RunOutput, RunFailure> {
        let doc = Arc::new(parse_str(raw).map_err(RunFailure::new)?);
        let requests = collect(&doc);
        debug!(document = %doc.name, nodes = doc.node_count(), images = requests.len(), "parsed design document");

        let passes = {
            let doc = Arc::clone(&doc);
            let vocab = Arc::clone(&self.vocab);
            let tolerances = self.tolerances;
            tokio::task::spawn_blocking(move || {
                let ctx = LayoutContext::new(&vocab, tolerances);
                rayon::join(|| resolve_tree(&doc, &vocab), || infer_tree(&doc, &ctx))
            })
        };
        let (passes, assets) = tokio::join!(passes, self.pipeline.materialize(images, &requests));

        let (bindings, layouts) = passes.map_err(|err| RunFailure::new(LoomError::Task(err.to_string())))?;
        let mut report = Report::default();
        unresolved_warnings(&bindings, &mut report);

        let assets = match assets {
            Ok(assets) => {
                placeholder_warnings(assets.failures(), &mut report);
                Ok(assets)
            }
            Err(err) => {
                placeholder_warnings(&err.failures, &mut report);
                Err(err.error)
            }
        };
        let (layouts, assets) = match (layouts, assets) {
            (Ok(layouts), Ok(assets)) => (layouts, assets),
            (Err(err), _) => return Err(RunFailure::with_report(err, report)),
            (_, Err(err)) => return Err(RunFailure::with_report(err, report)),
        };

        let artifacts = match emit(&doc, &bindings, &layouts, &assets, self.vocab.viewport, &self.options) {
            Ok(artifacts) => artifacts,
            Err(err) => {
                let error = LoomError::Emission { message: err.to_string() };
                return Err(RunFailure::with_report(error, report));
            }
        };

        let validation = self.gate(&artifacts)?;

        info!(
            document = %doc.name,
            artifacts = artifacts.len(),
            assets = assets.len(),
            warnings = validation.warnings.len(),
            "generated artifacts"
        );
        Ok(RunOutput { artifacts, report: validation, assets })
    }

    /// Generate and write artifacts and asset files under `out_dir`.
    pub async fn run<S: DesignSource>(
        &self,
        source: &S,
        reference: &str,
        out_dir: &Path,
    ) -> Result<(RunOutput, Vec<PathBuf>), RunFailure> {
        let output = self.generate(source, reference).await?;
        self.write(output, out_dir).await
    }

    /// Like [`Engine::run`], but gives up as soon as `cancel` completes.
    ///
    /// Cancellation drops outstanding fetches. Nothing is written unless
    /// generation finishes first; once writing starts it is not interrupted.
    pub async fn run_until<S, C>(
        &self,
        source: &S,
        reference: &str,
        out_dir: &Path,
        cancel: C,
    ) -> Result<(RunOutput, Vec<PathBuf>), RunFailure>
    where
        S: DesignSource,
        C: Future<Output = ()>,
    {
        let output = tokio::select! {
            biased;
            () = cancel => {
                warn!(reference, "run cancelled");
                return Err(RunFailure::new(LoomError::Cancelled));
            }
            output = self.generate(source, reference) => output?,
        };
        self.write(output, out_dir).await
    }

    /// Run the validation gate over a set of artifacts.
    pub fn gate(&self, artifacts: &[GeneratedArtifact]) -> Result<Report, RunFailure> {
        let report = self.validator.validate(artifacts);
        match report.first_error().map(ToString::to_string) {
            Some(message) => Err(RunFailure::with_report(LoomError::EmissionMismatch { message }, report)),
            None => Ok(report),
        }
    }

    /// Write a generated run. Either every file lands or none does.
    /// Artifacts are validated again before anything is staged.
    pub async fn write(&self, output: RunOutput, out_dir: &Path) -> Result<(RunOutput, Vec<PathBuf>), RunFailure> {
        self.gate(&output.artifacts)?;
        let fail = |err: LoomError, output: &RunOutput| RunFailure::with_report(err, output.report.clone());

        let mut files: Vec<OutputFile> = output
            .artifacts
            .iter()
            .map(|artifact| OutputFile::new(&artifact.file_name, artifact.content.as_bytes()))
            .collect();
        for record in output.assets.records() {
            let bytes = match self.pipeline.bytes(record).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    let missing = io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("asset {} is no longer cached", record.file_name),
                    );
                    return Err(fail(missing.into(), &output));
                }
                Err(err) => return Err(fail(err.into(), &output)),
            };
            files.push(OutputFile::new(asset_path(&record.file_name), bytes));
        }

        match write_all_or_nothing(out_dir, &files).await {
            Ok(paths) => {
                info!(dir = %out_dir.display(), files = paths.len(), "wrote run output");
                Ok((output, paths))
            }
            Err(err) => Err(fail(err.into(), &output)),
        }
    }
}

fn unresolved_warnings(bindings: &TokenBindings, report: &mut Report) {
    for (node, binding) in bindings.unresolved() {
        report.warn(
            DiagnosticCode::UnresolvedToken,
            Some(node),
            format!("{} value {} matches no token", binding.attribute, binding.raw),
        );
    }
}

fn placeholder_warnings(failures: &[AssetFailure], report: &mut Report) {
    for failure in failures {
        report.warn(
            DiagnosticCode::PlaceholderAsset,
            failure.nodes.first(),
            format!("{} replaced by a placeholder: {}", failure.reference, failure.reason),
        );
    }
}
