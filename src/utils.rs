use std::convert::TryFrom;
use crate::data::SmoothSkinningData;
use crate::Matrix4;

///
/// Iterator over the `(influence index, weight)` pairs of a single point.
///
#[derive(Clone, Debug)]
pub struct PointInfluences<'a> {
    indices: &'a [i32],
    weights: &'a [f32],
    position: usize,
}

impl<'a> PointInfluences<'a> {
    pub(crate) fn new(indices: &'a [i32], weights: &'a [f32]) -> PointInfluences<'a> {
        PointInfluences { indices: indices, weights: weights, position: 0 }
    }
}

impl<'a> Iterator for PointInfluences<'a> {
    type Item = (usize, f32);
    fn next(&mut self) -> Option<(usize, f32)> {
        let i = self.position;
        match (self.indices.get(i), self.weights.get(i)) {
            (Some(&index), Some(&weight)) => {
                self.position += 1;
                Some((index as usize, weight))
            }
            _ => None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.indices.len().min(self.weights.len()) - self.position;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for PointInfluences<'a> {}

///
/// Iterator over every point of some skinning data, yielding each point's influences.
///
pub struct Points<'a> {
    data: &'a SmoothSkinningData,
    point: usize,
}

impl<'a> Points<'a> {
    pub(crate) fn new(data: &'a SmoothSkinningData) -> Points<'a> {
        Points { data: data, point: 0 }
    }
}

impl<'a> Iterator for Points<'a> {
    type Item = PointInfluences<'a>;
    fn next(&mut self) -> Option<PointInfluences<'a>> {
        if self.point >= self.data.point_count() {
            return None;
        }
        let influences = self.data.point_influences(self.point);
        self.point += 1;
        Some(influences)
    }
}

///
/// Accumulates points one at a time into fresh sparse arrays, keeping
/// offsets equal to the running total of counts.
///
pub(crate) struct PointListBuilder {
    offsets: Vec<i32>,
    counts: Vec<i32>,
    indices: Vec<i32>,
    weights: Vec<f32>,
}

impl PointListBuilder {
    pub fn with_capacity(points: usize, entries: usize) -> PointListBuilder {
        PointListBuilder {
            offsets: Vec::with_capacity(points),
            counts: Vec::with_capacity(points),
            indices: Vec::with_capacity(entries),
            weights: Vec::with_capacity(entries),
        }
    }

    pub fn push_point<I>(&mut self, entries: I) where I: IntoIterator<Item = (usize, f32)> {
        let offset = self.indices.len();
        // indices past i32::MAX are stored as -1 so `validate` rejects them
        for (index, weight) in entries {
            self.indices.push(i32::try_from(index).unwrap_or(-1));
            self.weights.push(weight);
        }
        self.offsets.push(i32::try_from(offset).unwrap_or(-1));
        self.counts.push(i32::try_from(self.indices.len() - offset).unwrap_or(-1));
    }

    pub fn entry_count(&self) -> usize {
        self.indices.len()
    }

    pub fn finish(self, influence_names: Vec<String>, influence_pose: Vec<Matrix4>) -> SmoothSkinningData {
        SmoothSkinningData::new(influence_names,
                                influence_pose,
                                self.offsets,
                                self.counts,
                                self.indices,
                                self.weights)
    }
}

///
/// Expand one point's sparse entries into a dense per-influence row.
/// Repeated indices accumulate.
///
pub(crate) fn dense_row<I>(entries: I, influence_count: usize) -> Vec<f32>
    where I: IntoIterator<Item = (usize, f32)>
{
    let mut row = vec![0.0; influence_count];
    for (index, weight) in entries {
        if let Some(w) = row.get_mut(index) {
            *w += weight;
        }
    }
    row
}
