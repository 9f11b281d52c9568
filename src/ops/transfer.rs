use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::SmoothSkinningData;
use crate::error::{Error, Result};
use crate::ops::SkinningOp;
use crate::utils::PointListBuilder;

///
/// Moves the weight of the source influences onto the target influence.
///
/// On every point the source entries are removed and their summed weight is
/// added to the target entry, which is created where the first source entry
/// was if the point had none. An existing target entry that comes after a
/// source entry moves forward to that source's position; one that comes first
/// stays put. Influence names and poses are left as they are, even when no
/// point references a source any more.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransferSmoothSkinningWeightsOp {
    pub source_influence_names: Vec<String>,
    pub target_influence_name: String,
}

impl TransferSmoothSkinningWeightsOp {
    pub fn new<S, T>(sources: &[S], target: T) -> Self
        where S: AsRef<str>, T: Into<String>
    {
        TransferSmoothSkinningWeightsOp {
            source_influence_names: sources.iter().map(|s| s.as_ref().to_string()).collect(),
            target_influence_name: target.into(),
        }
    }

    /// Check the names and turn them into influence indices.
    fn resolve(&self, data: &SmoothSkinningData) -> Result<(Vec<bool>, usize)> {
        let op = self.name();
        if self.source_influence_names.is_empty() {
            return Err(Error::validation(format!("{}: no source names given", op)));
        }
        if self.target_influence_name.is_empty() {
            return Err(Error::validation(format!("{}: no target name given", op)));
        }

        let target = data.influence_index(&self.target_influence_name).ok_or_else(|| Error::validation(format!(
            "{}: target influence \"{}\" does not exist", op, self.target_influence_name)))?;

        let mut is_source = vec![false; data.influence_count()];
        for name in &self.source_influence_names {
            if name.is_empty() {
                return Err(Error::validation(format!("{}: empty source name given", op)));
            }
            if *name == self.target_influence_name {
                return Err(Error::validation(format!(
                    "{}: \"{}\" is both a source and the target", op, name)));
            }
            let index = data.influence_index(name).ok_or_else(|| Error::validation(format!(
                "{}: source influence \"{}\" does not exist", op, name)))?;
            is_source[index] = true;
        }
        Ok((is_source, target))
    }
}

impl SkinningOp for TransferSmoothSkinningWeightsOp {
    fn name(&self) -> &'static str {
        "TransferSmoothSkinningWeightsOp"
    }

    fn apply(&self, data: &SmoothSkinningData) -> Result<SmoothSkinningData> {
        data.validate()?;
        let (is_source, target) = self.resolve(data)?;

        let mut builder = PointListBuilder::with_capacity(data.point_count(), data.point_influence_weights().len());
        let mut touched = 0;
        for point in data.points() {
            let mut entries: Vec<(usize, f32)> = Vec::with_capacity(point.len());
            let mut moved = 0.0;
            let mut any_source = false;
            let mut target_slot = None;

            for (index, weight) in point {
                if is_source[index] {
                    moved += weight;
                    if !any_source && target_slot.is_none() {
                        target_slot = Some(entries.len());
                        entries.push((target, 0.0));
                    }
                    any_source = true;
                } else if index == target {
                    match target_slot {
                        Some(slot) => entries[slot].1 += weight,
                        None => {
                            target_slot = Some(entries.len());
                            entries.push((target, weight));
                        }
                    }
                } else {
                    entries.push((index, weight));
                }
            }

            if let Some(slot) = target_slot {
                if any_source {
                    entries[slot].1 += moved;
                    touched += 1;
                }
            }
            builder.push_point(entries);
        }

        debug!("transferred weight of {} influences onto \"{}\" on {} points",
               self.source_influence_names.len(), self.target_influence_name, touched);

        Ok(builder.finish(data.influence_names().to_vec(), data.influence_pose().to_vec()))
    }
}
