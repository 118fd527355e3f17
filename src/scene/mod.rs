//! Scene navigation: finding meshes and the models that place them.
//!
//! Legacy files keep geometry arrays inside `Model` records under
//! `Objects`, with the model's transform in a sibling `Properties60` block.
//! Models are parented through `Connect: "OO", child, parent` entries under
//! `Connections`.

use std::collections::{HashMap, HashSet};

use crate::container::{Document, NodeId, CONNECTIONS_RECORD, OBJECTS_RECORD};
use crate::geom::{GeometryRecord, ModelTransform, PROPERTY_RECORDS};
use crate::util::{DMat4, Error, Result};

/// Parent chains longer than this are treated as cyclic.
const MAX_PARENT_DEPTH: usize = 256;

/// A mesh-bearing record and its placement.
#[derive(Clone, Debug)]
pub struct MeshSource {
    /// Record holding `Vertices` and `PolygonVertexIndex`.
    pub record: NodeId,
    /// Model providing the transform, if any.
    pub owner: Option<NodeId>,
    /// Display name for the output object.
    pub name: String,
    /// Mesh to world matrix.
    pub transform: DMat4,
}

/// Strip the class prefix and binary name separator from an object name.
///
/// `"Model::Cube"` and `"Cube\0\x01Model"` both become `"Cube"`.
pub fn clean_name(raw: &str) -> &str {
    let name = raw.split("\0\u{1}").next().unwrap_or(raw);
    match name.split_once("::") {
        Some((_, rest)) => rest,
        None => name,
    }
}

/// Model lookup and parent links of a document.
pub struct SceneGraph<'d> {
    doc: &'d Document,
    models: HashMap<&'d str, NodeId>,
    parents: HashMap<&'d str, &'d str>,
}

impl<'d> SceneGraph<'d> {
    /// Index models under `Objects` and the `OO` links under `Connections`.
    pub fn new(doc: &'d Document) -> Self {
        let mut models = HashMap::new();
        if let Some(objects) = doc.root(OBJECTS_RECORD) {
            for (id, node) in doc.children(objects) {
                if let Some(name) = node.first_str() {
                    models.entry(name).or_insert(id);
                }
            }
        }

        let mut parents = HashMap::new();
        if let Some(connections) = doc.root(CONNECTIONS_RECORD) {
            for (_, link) in doc.children(connections) {
                if link.name != "Connect" && link.name != "C" {
                    continue;
                }
                let mut strings = link.properties.iter().filter_map(|p| p.as_str());
                if let (Some("OO"), Some(child), Some(parent)) = (strings.next(), strings.next(), strings.next()) {
                    parents.insert(child, parent);
                }
            }
        }

        tracing::debug!(models = models.len(), links = parents.len(), "scene graph indexed");
        Self { doc, models, parents }
    }

    /// Model a record is connected to, if its name links to one.
    pub fn connected_model(&self, id: NodeId) -> Option<NodeId> {
        let name = self.doc.node(id).first_str()?;
        let parent = self.parents.get(name)?;
        let &model = self.models.get(parent)?;
        has_properties(self.doc, model).then_some(model)
    }

    /// Model to world matrix, walking the parent chain.
    pub fn global_matrix(&self, model: NodeId) -> DMat4 {
        let mut matrix = DMat4::IDENTITY;
        let mut seen = HashSet::new();
        let mut current = Some(model);

        while let Some(id) = current {
            if !seen.insert(id) || seen.len() > MAX_PARENT_DEPTH {
                tracing::warn!(model = self.doc.node(model).first_str(), "parent chain loops; truncated");
                break;
            }
            if let Some(xf) = ModelTransform::from_model(self.doc, id) {
                matrix = xf.local_matrix() * matrix;
            }
            current = self
                .doc
                .node(id)
                .first_str()
                .and_then(|name| self.parents.get(name))
                .and_then(|parent| self.models.get(parent))
                .copied();
        }
        matrix
    }

    /// Matrix placing the geometry of `model` in the world.
    pub fn mesh_matrix(&self, model: NodeId) -> DMat4 {
        let geometric = ModelTransform::from_model(self.doc, model)
            .unwrap_or_else(ModelTransform::identity)
            .geometric_matrix();
        self.global_matrix(model) * geometric
    }
}

fn has_properties(doc: &Document, id: NodeId) -> bool {
    PROPERTY_RECORDS.iter().any(|name| doc.child(id, name).is_some())
}

/// Find every mesh record and resolve its placement.
///
/// Searches the `Objects` record depth-first, or the whole document when a
/// file has none. A mesh is owned by the nearest record on its path (itself
/// included) that carries a property block, otherwise by the model it is
/// connected to.
#[tracing::instrument(skip_all)]
pub fn locate_meshes(doc: &Document, apply_transforms: bool) -> Result<Vec<MeshSource>> {
    let graph = SceneGraph::new(doc);

    let starts: Vec<NodeId> = match doc.root(OBJECTS_RECORD) {
        Some(objects) => doc.node(objects).children.clone(),
        None => {
            tracing::debug!("no Objects record, searching the whole document");
            doc.roots().to_vec()
        }
    };

    // (record, nearest owner above it)
    let mut stack: Vec<(NodeId, Option<NodeId>)> = starts.into_iter().rev().map(|id| (id, None)).collect();
    let mut sources = Vec::new();

    while let Some((id, inherited)) = stack.pop() {
        let owner = if has_properties(doc, id) { Some(id) } else { inherited };

        if GeometryRecord::is_mesh(doc, id) {
            let owner = owner.or_else(|| graph.connected_model(id));
            let raw_name = owner
                .and_then(|o| doc.node(o).first_str())
                .or_else(|| doc.node(id).first_str())
                .unwrap_or("");
            let name = match clean_name(raw_name) {
                "" => format!("mesh_{}", sources.len()),
                n => n.to_string(),
            };
            let transform = match owner {
                Some(model) if apply_transforms => graph.mesh_matrix(model),
                _ => DMat4::IDENTITY,
            };
            sources.push(MeshSource { record: id, owner, name, transform });
            continue;
        }

        for &child in doc.node(id).children.iter().rev() {
            stack.push((child, owner));
        }
    }

    if sources.is_empty() {
        return Err(Error::NoGeometryFound);
    }
    tracing::debug!(meshes = sources.len(), "mesh records located");
    Ok(sources)
}
