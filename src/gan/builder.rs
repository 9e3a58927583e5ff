use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::activation::activation::ActivationFunction;
use crate::data::{ImageShape, LatentShape};
use crate::gan::dense::{DenseComposite, DenseDiscriminator, DenseGenerator};
use crate::network::spec::NetworkSpec;
use crate::optim::OptimizerSpec;
use crate::Result;

/// Everything needed to create generator, discriminator and composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    pub latent: LatentShape,
    pub image: ImageShape,
    pub generator: NetworkSpec,
    pub discriminator: NetworkSpec,
    /// Optimizer of the composite model, i.e. of the generator's parameters.
    pub generator_optimizer: OptimizerSpec,
    pub discriminator_optimizer: OptimizerSpec,
}

impl Default for ModelSpec {
    /// 100-d latent → 256 → 512 → 784 sigmoid generator and a
    /// 784 → 256 → 1 sigmoid discriminator, LeakyReLU(0.2) in between,
    /// both optimized with Adam(0.0002, β1 = 0.5).
    fn default() -> Self {
        let leaky = ActivationFunction::LeakyReLU { alpha: 0.2 };
        let image = ImageShape::mnist();
        let latent = LatentShape::default();
        ModelSpec {
            generator: NetworkSpec::chain(
                "generator",
                &[latent.len(), 256, 512, image.len()],
                &[leaky, leaky, ActivationFunction::Sigmoid],
            ),
            discriminator: NetworkSpec::chain(
                "discriminator",
                &[image.len(), 256, 1],
                &[leaky, ActivationFunction::Sigmoid],
            ),
            latent,
            image,
            generator_optimizer: OptimizerSpec::gan_adam(),
            discriminator_optimizer: OptimizerSpec::gan_adam(),
        }
    }
}

/// The three models of one adversarial run.
pub struct Gan {
    pub generator: DenseGenerator,
    pub discriminator: DenseDiscriminator,
    pub composite: DenseComposite,
}

impl Gan {
    /// Initializes fresh weights for both networks from `seed`.
    pub fn build(spec: &ModelSpec, seed: u64) -> Result<Gan> {
        let mut rng = StdRng::seed_from_u64(seed);

        let generator = DenseGenerator::new(spec.generator.build(&mut rng)?, spec.latent, spec.image)?;
        let discriminator_optimizer = spec.discriminator_optimizer.build();
        let generator_optimizer = spec.generator_optimizer.build();
        let (discriminator_lr, generator_lr) =
            (discriminator_optimizer.learning_rate(), generator_optimizer.learning_rate());

        let discriminator = DenseDiscriminator::new(
            spec.discriminator.build(&mut rng)?,
            spec.image,
            discriminator_optimizer,
        )?;
        let composite = DenseComposite::new(generator_optimizer);

        info!(
            generator_params = generator.network.parameter_count(),
            discriminator_params = discriminator.network.parameter_count(),
            generator_lr,
            discriminator_lr,
            "built {} and {}",
            spec.generator.name,
            spec.discriminator.name
        );

        Ok(Gan { generator, discriminator, composite })
    }
}
