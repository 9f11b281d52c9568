use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;
use crate::Matrix4;

///
/// Inserts new influences into the influence list. Each name is inserted
/// at its index in turn, so later indices address the list as already grown
/// by the earlier insertions. Point weights are untouched; their indices are
/// shifted to keep naming the same influences.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddSmoothSkinningInfluencesOp {
    pub influence_names: Vec<String>,
    pub influence_pose: Vec<Matrix4>,
    pub indices: Vec<usize>,
}

impl AddSmoothSkinningInfluencesOp {
    pub fn new(influence_names: Vec<String>, influence_pose: Vec<Matrix4>, indices: Vec<usize>) -> Self {
        AddSmoothSkinningInfluencesOp {
            influence_names: influence_names,
            influence_pose: influence_pose,
            indices: indices,
        }
    }
}

impl SkinningOp for AddSmoothSkinningInfluencesOp {
    fn name(&self) -> &'static str {
        "AddSmoothSkinningInfluencesOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;

        let count = self.influence_names.len();
        if self.influence_pose.len() != count || self.indices.len() != count {
            return Err(Error::validation(format!(
                "{}: {} names, {} poses and {} indices given, all three must match",
                self.name(), count, self.influence_pose.len(), self.indices.len())));
        }

        // Each slot is either an existing influence or one of the new ones.
        let mut slots: Vec<std::result::Result<usize, usize>> = (0..data.influence_count()).map(Ok).collect();
        for (n, name) in self.influence_names.iter().enumerate() {
            let taken = slots.iter().any(|slot| match *slot {
                Ok(old) => data.influence_names()[old] == *name,
                Err(new) => self.influence_names[new] == *name,
            });
            if taken {
                return Err(Error::validation(format!(
                    "{}: influence \"{}\" already exists", self.name(), name)));
            }
            let index = self.indices[n];
            if index > slots.len() {
                return Err(Error::validation(format!(
                    "{}: cannot insert \"{}\" at index {}, there are only {} influences",
                    self.name(), name, index, slots.len())));
            }
            slots.insert(index, Err(n));
        }

        let mut names = Vec::with_capacity(slots.len());
        let mut poses = Vec::with_capacity(slots.len());
        let mut remap = vec![0; data.influence_count()];
        for (i, slot) in slots.iter().enumerate() {
            match *slot {
                Ok(old) => {
                    remap[old] = i;
                    names.push(data.influence_names()[old].clone());
                    poses.push(data.influence_pose()[old]);
                }
                Err(new) => {
                    names.push(self.influence_names[new].clone());
                    poses.push(self.influence_pose[new]);
                }
            }
        }

        let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
        for point in data.points() {
            builder.push_point(point.map(|(index, weight)| (remap[index], weight)));
        }

        debug!("added {} influences, now {} in total", count, names.len());

        Ok(builder.finish(names, poses))
    }
}
