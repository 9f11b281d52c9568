use log::debug;

use crate::data::SmoothSkinningData;
use crate::error::Result;
use crate::ops::SkinningOp;
use crate::utils::{dense_row, PointListBuilder};

///
/// Gives every point one entry per influence, in ascending influence order,
/// filling in zero weights for influences the point did not reference.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecompressSmoothSkinningDataOp;

impl DecompressSmoothSkinningDataOp {
    pub fn new() -> Self {
        DecompressSmoothSkinningDataOp
    }
}

impl SkinningOp for DecompressSmoothSkinningDataOp {
    fn name(&self) -> &'static str {
        "DecompressSmoothSkinningDataOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        Ok(decompress(data))
    }
}

/// Decompress already validated data.
pub(crate) fn decompress(data: &SmoothSkinningData) -> SmoothSkinningData {
    let influence_count = data.influence_count();
    let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_count() * influence_count);
    for point in data.points() {
        builder.push_point(dense_row(point, influence_count).into_iter().enumerate());
    }

    debug!("decompressed {} points to {} influence entries", data.point_count(), builder.entry_count());

    builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec())
}
