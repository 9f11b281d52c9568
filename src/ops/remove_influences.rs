use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

/// How `RemoveSmoothSkinningInfluencesOp` picks the influences to remove.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RemoveMode {
    /// By the names in `influence_names`.
    Named,
    /// By the positions in `indices`.
    Indexed,
    /// Every influence without a single nonzero weight.
    Weightless,
}

impl Default for RemoveMode {
    fn default() -> Self {
        RemoveMode::Named
    }
}

///
/// Removes influences from the influence list along with every entry that
/// refers to them. The entries of the remaining influences are kept, zero
/// weights included.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemoveSmoothSkinningInfluencesOp {
    pub mode: RemoveMode,
    pub influence_names: Vec<String>,
    pub indices: Vec<usize>,
}

impl RemoveSmoothSkinningInfluencesOp {
    pub fn named<S: AsRef<str>>(names: &[S]) -> Self {
        RemoveSmoothSkinningInfluencesOp {
            mode: RemoveMode::Named,
            influence_names: names.iter().map(|s| s.as_ref().to_string()).collect(),
            indices: Vec::new(),
        }
    }

    pub fn indexed(indices: Vec<usize>) -> Self {
        RemoveSmoothSkinningInfluencesOp { mode: RemoveMode::Indexed, influence_names: Vec::new(), indices: indices }
    }

    pub fn weightless() -> Self {
        RemoveSmoothSkinningInfluencesOp { mode: RemoveMode::Weightless, ..Self::default() }
    }

    fn removed(&self, data: &SmoothSkinningData) -> Result<Vec<bool>> {
        let mut removed = vec![false; data.influence_count()];
        match self.mode {
            RemoveMode::Named => {
                for name in &self.influence_names {
                    let index = data.influence_index(name).ok_or_else(|| Error::validation(format!(
                        "{}: influence \"{}\" does not exist", self.name(), name)))?;
                    removed[index] = true;
                }
            }
            RemoveMode::Indexed => {
                for &index in &self.indices {
                    if index >= removed.len() {
                        return Err(Error::validation(format!(
                            "{}: influence index {} is out of range, there are {} influences",
                            self.name(), index, removed.len())));
                    }
                    removed[index] = true;
                }
            }
            RemoveMode::Weightless => {
                for flag in removed.iter_mut() {
                    *flag = true;
                }
                for (&index, &weight) in data.point_influence_indices().iter().zip(data.point_influence_weights()) {
                    if weight != 0.0 {
                        removed[index as usize] = false;
                    }
                }
            }
        }
        Ok(removed)
    }
}

impl SkinningOp for RemoveSmoothSkinningInfluencesOp {
    fn name(&self) -> &'static str {
        "RemoveSmoothSkinningInfluencesOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let removed = self.removed(data)?;

        let mut names = Vec::new();
        let mut poses = Vec::new();
        let mut remap = vec![None; removed.len()];
        for (i, &gone) in removed.iter().enumerate() {
            if gone {
                trace!("removing influence \"{}\"", data.influence_names()[i]);
            } else {
                remap[i] = Some(names.len());
                names.push(data.influence_names()[i].clone());
                poses.push(data.influence_pose()[i]);
            }
        }

        let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
        for point in data.points() {
            builder.push_point(point.filter_map(|(index, weight)| remap[index].map(|i| (i, weight))));
        }

        debug!("removed {} influences and {} entries",
               removed.len() - names.len(), data.point_influence_weights().len() - builder.entry_count());

        Ok(builder.finish(names, poses))
    }
}
