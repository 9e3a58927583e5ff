use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;
use crate::{GanError, Result};

/// Height × width × channels of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    pub fn new(height: usize, width: usize, channels: usize) -> ImageShape {
        ImageShape { height, width, channels }
    }

    /// 28×28 grayscale, the MNIST layout.
    pub fn mnist() -> ImageShape {
        ImageShape::new(28, 28, 1)
    }

    /// Number of values in one flattened image.
    pub fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }
}

impl Default for ImageShape {
    fn default() -> Self {
        ImageShape::mnist()
    }
}

/// Value range pixels are normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelRange {
    /// [0, 1], matched by a Sigmoid output.
    Unit,
    /// [-1, 1], matched by a Tanh output.
    Symmetric,
}

impl PixelRange {
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            PixelRange::Unit => (0.0, 1.0),
            PixelRange::Symmetric => (-1.0, 1.0),
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&x)
    }
}

/// Immutable collection of `N` images, one flattened image per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    shape: ImageShape,
    images: Matrix,
}

impl Dataset {
    /// Wraps an `N x (H*W*C)` matrix. Fails on an empty dataset, a zero-sized
    /// image shape or a row width that does not match `shape`.
    pub fn new(shape: ImageShape, images: Matrix) -> Result<Dataset> {
        if shape.is_empty() {
            return Err(GanError::InvalidShape(shape.dims().to_vec()));
        }
        if images.cols != shape.len() {
            return Err(GanError::ShapeMismatch(format!(
                "dataset rows hold {} values but {}x{}x{} images need {}",
                images.cols, shape.height, shape.width, shape.channels, shape.len()
            )));
        }
        if images.rows == 0 {
            return Err(GanError::Config("dataset contains no images".to_owned()));
        }
        Ok(Dataset { shape, images })
    }

    pub fn from_images(shape: ImageShape, images: Vec<Vec<f64>>) -> Result<Dataset> {
        if let Some(bad) = images.iter().find(|img| img.len() != shape.len()) {
            return Err(GanError::ShapeMismatch(format!(
                "image with {} values does not fit shape {:?}",
                bad.len(), shape.dims()
            )));
        }
        let n = images.len();
        Dataset::new(shape, Matrix::from_vec(n, shape.len(), images.into_iter().flatten().collect()))
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.images.rows
    }

    pub fn is_empty(&self) -> bool {
        self.images.rows == 0
    }

    pub fn images(&self) -> &Matrix {
        &self.images
    }

    /// Copies `count` consecutive images starting at `start`.
    pub fn slice(&self, start: usize, count: usize) -> Matrix {
        self.images.slice_rows(start, count)
    }

    /// The narrowest range every pixel fits in, if any.
    pub fn pixel_range(&self) -> Option<PixelRange> {
        [PixelRange::Unit, PixelRange::Symmetric]
            .into_iter()
            .find(|range| self.images.data.iter().all(|&x| range.contains(x)))
    }
}
