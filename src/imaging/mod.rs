pub mod normalize;

pub use normalize::{binarize, normalize_image, NormalizedImage};
