//! Operations over `SmoothSkinningData`.
//!
//! Every op validates its input, checks its own parameters and only then
//! builds a new `SmoothSkinningData`; a failed op leaves nothing behind.

use std::any::Any;

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};

mod add_influences;
mod compress;
mod contrast;
mod decompress;
mod limit;
mod mix;
mod normalize;
mod point_skinning;
mod remove_influences;
mod smooth;
mod transfer;

pub use self::add_influences::AddSmoothSkinningInfluencesOp;
pub use self::compress::CompressSmoothSkinningDataOp;
pub use self::contrast::ContrastSmoothSkinningWeightsOp;
pub use self::decompress::DecompressSmoothSkinningDataOp;
pub use self::limit::{LimitMode, LimitSmoothSkinningInfluencesOp};
pub use self::mix::MixSmoothSkinningWeightsOp;
pub use self::normalize::NormalizeSmoothSkinningWeightsOp;
pub use self::point_skinning::{Deformed, PointSmoothSkinningOp};
pub use self::remove_influences::{RemoveMode, RemoveSmoothSkinningInfluencesOp};
pub use self::smooth::SmoothSmoothSkinningWeightsOp;
pub use self::transfer::TransferSmoothSkinningWeightsOp;

///
/// An operation producing new skinning data from existing skinning data.
///
pub trait SkinningOp {

    /// Name used in error messages and logs.
    fn name(&self) -> &'static str;

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData>;

    ///
    /// Run the op on a value of unknown type, failing with `Error::TypeMismatch`
    /// unless it is `SmoothSkinningData`.
    ///
    fn operate(&self, input: &dyn Any) -> Result<SmoothSkinningData> {
        match input.downcast_ref::<SmoothSkinningData>() {
            Some(data) => self.apply(data),
            None => Err(Error::TypeMismatch {
                op: self.name(),
                expected: "SmoothSkinningData",
            }),
        }
    }
}
