use crate::data::{ImageShape, LatentShape, PixelRange};
use crate::gan::models::{ensure_finite, BatchMetrics, Composite, Discriminator, Generator};
use crate::loss::bce::BceLoss;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::{GanError, Result};

/// Dense network mapping latent input to flattened images.
///
/// Has no optimizer of its own: it is only trained through [`DenseComposite`].
pub struct DenseGenerator {
    pub network: Network,
    latent: LatentShape,
    output: ImageShape,
}

impl DenseGenerator {
    pub fn new(network: Network, latent: LatentShape, output: ImageShape) -> Result<DenseGenerator> {
        if network.input_size() != latent.len() {
            return Err(GanError::ShapeMismatch(format!(
                "generator input layer takes {} values but the latent shape has {}",
                network.input_size(), latent.len()
            )));
        }
        if network.output_size() != output.len() {
            return Err(GanError::ShapeMismatch(format!(
                "generator output layer has {} units but {:?} images need {}",
                network.output_size(), output.dims(), output.len()
            )));
        }
        Ok(DenseGenerator { network, latent, output })
    }
}

impl Generator for DenseGenerator {
    fn latent_shape(&self) -> LatentShape {
        self.latent
    }

    fn output_shape(&self) -> ImageShape {
        self.output
    }

    fn output_range(&self) -> Option<PixelRange> {
        self.network.output_activation().and_then(|a| a.output_range())
    }

    fn predict(&self, latent: &Matrix) -> Result<Matrix> {
        self.network.predict(latent)
    }
}

/// Dense binary classifier ending in one sigmoid unit, trained directly with
/// binary cross-entropy.
pub struct DenseDiscriminator {
    pub network: Network,
    input: ImageShape,
    optimizer: Box<dyn Optimizer>,
}

impl DenseDiscriminator {
    pub fn new(network: Network, input: ImageShape, optimizer: Box<dyn Optimizer>) -> Result<DenseDiscriminator> {
        if network.input_size() != input.len() {
            return Err(GanError::ShapeMismatch(format!(
                "discriminator input layer takes {} values but {:?} images have {}",
                network.input_size(), input.dims(), input.len()
            )));
        }
        if network.output_size() != 1 {
            return Err(GanError::ShapeMismatch(format!(
                "discriminator must end in a single unit, found {}",
                network.output_size()
            )));
        }
        Ok(DenseDiscriminator { network, input, optimizer })
    }

    /// Loss of the frozen discriminator on `images` and its gradient with
    /// respect to those images. Parameters are only read.
    pub fn frozen_gradient(&self, images: &Matrix, labels: &Matrix) -> Result<(f64, Matrix)> {
        check_labels(images, labels)?;
        let trace = self.network.forward(images)?;
        let loss = BceLoss::loss(&trace.output, labels);
        let delta = BceLoss::derivative(&trace.output, labels);
        Ok((loss, self.network.input_gradient(&trace, &delta)))
    }
}

impl Discriminator for DenseDiscriminator {
    fn input_shape(&self) -> ImageShape {
        self.input
    }

    fn train_on_batch(&mut self, images: &Matrix, labels: &Matrix) -> Result<BatchMetrics> {
        check_labels(images, labels)?;
        let trace = self.network.forward(images)?;
        let loss = ensure_finite("discriminator", BceLoss::loss(&trace.output, labels))?;
        let accuracy = BceLoss::accuracy(&trace.output, labels);

        let delta = BceLoss::derivative(&trace.output, labels);
        let (grads, _) = self.network.backward(&trace, &delta);
        self.optimizer.update_parameters(self.network.param_group("discriminator"), &grads)?;

        Ok(BatchMetrics { loss, accuracy })
    }

    fn evaluate(&self, images: &Matrix, labels: &Matrix) -> Result<BatchMetrics> {
        check_labels(images, labels)?;
        let predicted = self.network.predict(images)?;
        Ok(BatchMetrics {
            loss: BceLoss::loss(&predicted, labels),
            accuracy: BceLoss::accuracy(&predicted, labels),
        })
    }
}

/// Generator → frozen discriminator. Holds only the generator's optimizer
/// state; the parameters stay with the two models.
pub struct DenseComposite {
    optimizer: Box<dyn Optimizer>,
}

impl DenseComposite {
    pub fn new(optimizer: Box<dyn Optimizer>) -> DenseComposite {
        DenseComposite { optimizer }
    }
}

impl Composite<DenseGenerator, DenseDiscriminator> for DenseComposite {
    fn train_on_batch(
        &mut self,
        generator: &mut DenseGenerator,
        discriminator: &DenseDiscriminator,
        latent: &Matrix,
        labels: &Matrix,
    ) -> Result<f64> {
        let trace = generator.network.forward(latent)?;
        let (loss, image_grad) = discriminator.frozen_gradient(&trace.output, labels)?;
        let loss = ensure_finite("generator", loss)?;

        let (grads, _) = generator.network.backward(&trace, &image_grad);
        self.optimizer.update_parameters(generator.network.param_group("generator"), &grads)?;
        Ok(loss)
    }
}

fn check_labels(images: &Matrix, labels: &Matrix) -> Result<()> {
    if labels.rows != images.rows || labels.cols != 1 {
        return Err(GanError::ShapeMismatch(format!(
            "labels must be [{}, 1], got [{}, {}]",
            images.rows, labels.rows, labels.cols
        )));
    }
    Ok(())
}
