use crate::core::matrix::Matrix;
use crate::core::models::molecule::Molecule;
use crate::core::representations::{Representation, encode_batch};
use crate::engine::config::RegressionConfig;
use crate::engine::error::EngineError;
use crate::engine::kernels::{kernel_matrix, symmetric_kernel_matrix};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver::{Prediction, RegressionModel, fit};
use tracing::{info, instrument, warn};

/// A fitted model together with everything needed to predict new molecules.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    config: RegressionConfig,
    training: Vec<Representation>,
    model: RegressionModel,
}

impl TrainedModel {
    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    pub fn training_representations(&self) -> &[Representation] {
        &self.training
    }

    pub fn model(&self) -> &RegressionModel {
        &self.model
    }

    /// Predicts `molecules` with every successfully fitted λ.
    #[instrument(skip_all, name = "predict_workflow", fields(n = molecules.len()))]
    pub fn predict(
        &self,
        molecules: &[Molecule],
        reporter: &ProgressReporter,
    ) -> Result<Vec<Prediction>, EngineError> {
        let test = reporter.phase("Encoding", || encode_batch(molecules, &self.config.representation))?;
        let kernel = reporter.phase("Test Kernel", || {
            kernel_matrix(&test, &self.training, &self.config.kernel)
        })?;
        let predictions = reporter.phase("Prediction", || self.model.predict(&kernel))?;
        info!(lambdas = predictions.len(), "Prediction complete.");
        Ok(predictions)
    }
}

/// Trains a kernel ridge regression model.
///
/// `targets` holds one row per molecule and one column per property.
/// Fails if the configuration is invalid, if any molecule cannot be encoded,
/// or if no λ could be fitted; individual λ failures are kept in the model.
#[instrument(skip_all, name = "train_workflow", fields(n = molecules.len()))]
pub fn train(
    molecules: &[Molecule],
    targets: &Matrix,
    config: &RegressionConfig,
    reporter: &ProgressReporter,
) -> Result<TrainedModel, EngineError> {
    config.validate()?;
    EngineError::check_dimension("target rows", molecules.len(), targets.rows())?;
    info!(
        representation = config.representation.name(),
        kernel = ?config.kernel.kernel,
        "Starting regression training."
    );

    // === Phase 1: Encoding ===
    let training = reporter.phase("Encoding", || encode_batch(molecules, &config.representation))?;

    // === Phase 2: Training kernel ===
    let kernel = reporter.phase("Training Kernel", || {
        symmetric_kernel_matrix(&training, &config.kernel)
    })?;

    // === Phase 3: Fitting ===
    let model = reporter.phase("Fitting", || {
        reporter.report(Progress::TaskStart {
            total_steps: config.lambdas.len() as u64,
        });
        let model = fit(&kernel, targets, &config.lambdas)?;
        for f in model.fits() {
            reporter.report(Progress::LambdaFitted {
                lambda: f.lambda,
                success: f.is_success(),
            });
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        Ok::<_, EngineError>(model)
    })?;

    if model.successful().next().is_none() {
        warn!("No regularization strength could be fitted.");
        if let Some(error) = model.fits().iter().find_map(|f| f.outcome.as_ref().err()) {
            return Err(error.clone());
        }
    }

    info!(fitted = model.successful().count(), "Training complete.");
    Ok(TrainedModel {
        config: config.clone(),
        training,
        model,
    })
}
