use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::VertexIndex;

///
/// Polygon connectivity of the mesh a set of skinning weights belongs to,
/// in polylist form: one vertex count per face followed by the flattened
/// face-vertex indices.
///
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshTopology {
    /// Number of vertices in each face.
    pub verts_per_face: Vec<usize>,
    /// Vertex indices of each face, face after face.
    pub vertex_ids: Vec<VertexIndex>,
}

impl MeshTopology {

    pub fn new(verts_per_face: Vec<usize>, vertex_ids: Vec<VertexIndex>) -> MeshTopology {
        MeshTopology { verts_per_face: verts_per_face, vertex_ids: vertex_ids }
    }

    ///
    /// Number of distinct vertices addressed by the faces, i.e. one past the largest vertex index.
    ///
    pub fn vertex_count(&self) -> usize {
        self.vertex_ids.iter().max().map_or(0, |&v| v + 1)
    }

    pub fn face_count(&self) -> usize {
        self.verts_per_face.len()
    }

    pub fn validate(&self) -> Result<()> {
        let expected: usize = self.verts_per_face.iter().sum();
        if expected != self.vertex_ids.len() {
            return Err(Error::validation(format!(
                "MeshTopology: verts_per_face adds up to {} but {} vertex ids are given",
                expected, self.vertex_ids.len())));
        }
        if let Some(f) = self.verts_per_face.iter().position(|&n| n < 3) {
            return Err(Error::validation(format!(
                "MeshTopology: face {} has {} vertices, at least 3 are required",
                f, self.verts_per_face[f])));
        }
        Ok(())
    }

    ///
    /// Iterator over the vertex indices of each face.
    ///
    pub fn faces(&self) -> Faces<'_> {
        Faces { topology: self, face: 0, start: 0 }
    }

    ///
    /// Undirected vertex neighbourhoods built from the face edges, including
    /// the edge closing each face. Every neighbour appears once per vertex.
    ///
    pub fn adjacency(&self) -> Vec<BTreeSet<VertexIndex>> {
        let mut neighbours = vec![BTreeSet::new(); self.vertex_count()];
        for face in self.faces() {
            let n = face.len();
            for (i, &v1) in face.iter().enumerate() {
                let v2 = face[(i + 1) % n];
                if v1 != v2 {
                    neighbours[v1].insert(v2);
                    neighbours[v2].insert(v1);
                }
            }
        }
        neighbours
    }
}

pub struct Faces<'a> {
    topology: &'a MeshTopology,
    face: usize,
    start: usize,
}

impl<'a> Iterator for Faces<'a> {
    type Item = &'a [VertexIndex];
    fn next(&mut self) -> Option<&'a [VertexIndex]> {
        let count = *self.topology.verts_per_face.get(self.face)?;
        let end = self.start + count;
        let face = self.topology.vertex_ids.get(self.start..end)?;
        self.face += 1;
        self.start = end;
        Some(face)
    }

    // faces stop early when vertex_ids runs short, so only the upper bound is exact
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.topology.face_count().saturating_sub(self.face)))
    }
}
