//! Intermediate COLLADA document model.
//!
//! Parsing builds loosely-structured per-element records that mirror the
//! document: sources, inputs, triangle lists, skins, scene-graph node
//! flattenings and animation channels. Assembly into a
//! [`SharedSkeleton`](crate::resources::SharedSkeleton) happens separately
//! in [`build`](super::build).
//!
//! Skip-vs-error boundary: a malformed element inside one subsection (a
//! source without an accessor, a triangle list without indices) drops that
//! subsection with a `log::warn!`; count mismatches and dangling references
//! that would corrupt the resource are typed errors.

use std::collections::HashMap;

use glam::Mat4;
use log::warn;
use roxmltree::Node as XmlNode;
use smallvec::SmallVec;

use crate::errors::{Result, SkelError};
use crate::resources::transform::Transform;

// ============================================================================
// Element records
// ============================================================================

/// Input semantics recognized across all library sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Semantic {
    // geometry
    Vertex,
    Position,
    Normal,
    Texcoord,
    Color,
    // skin
    Joint,
    InvBindMatrix,
    Weight,
    // animation sampler
    Input,
    Output,
    Interpolation,
}

impl Semantic {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "VERTEX" => Self::Vertex,
            "POSITION" => Self::Position,
            "NORMAL" => Self::Normal,
            "TEXCOORD" => Self::Texcoord,
            "COLOR" => Self::Color,
            "JOINT" => Self::Joint,
            "INV_BIND_MATRIX" => Self::InvBindMatrix,
            "WEIGHT" => Self::Weight,
            "INPUT" => Self::Input,
            "OUTPUT" => Self::Output,
            "INTERPOLATION" => Self::Interpolation,
            _ => return None,
        })
    }
}

/// A named data array with its accessor layout (`count` × `stride`).
#[derive(Debug, Clone, Default)]
pub(crate) struct Source {
    pub floats: Vec<f32>,
    pub names: Vec<String>,
    pub count: usize,
    pub stride: usize,
}

/// A typed reference from a consumer (triangles, joints, sampler) into a
/// source, with its byte offset into the interleaved index stream.
#[derive(Debug, Clone)]
pub(crate) struct Input {
    pub semantic: Semantic,
    /// Referenced source id, leading `#` stripped.
    pub source: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TriangleList {
    pub inputs: Vec<Input>,
    /// Interleaved index stream from `<p>`.
    pub prims: Vec<usize>,
    /// Triangle count declared on the element.
    pub count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct GeometryMesh {
    pub id: String,
    pub sources: HashMap<String, Source>,
    /// `<vertices>` indirection: vertices-id → its POSITION input.
    pub vertices: HashMap<String, Input>,
    pub triangles: Vec<TriangleList>,
}

/// Per-vertex joint/weight pairs, zero weights already dropped and the rest
/// renormalized.
pub(crate) type InfluencePairs = SmallVec<[(usize, f32); 4]>;

#[derive(Debug, Default)]
pub(crate) struct SkinData {
    /// Controller id, matched by `<instance_controller>` urls.
    pub id: String,
    /// Source geometry id.
    pub geometry: String,
    pub bind_shape: Mat4,
    pub joint_names: Vec<String>,
    /// One matrix per joint name; the count is validated at parse time.
    pub inverse_binds: Vec<Mat4>,
    pub vertex_weights: Vec<InfluencePairs>,
    /// Skeleton root name recorded from the scene graph's
    /// `<instance_controller>/<skeleton>` reference.
    pub skeleton_root: Option<String>,
}

/// One flattened scene-graph node. Flattening is depth-first with each
/// node's index recorded before its children's, so parents always precede
/// children.
#[derive(Debug, Clone)]
pub(crate) struct SceneNodeRecord {
    pub name: String,
    /// Local joint name skins refer to.
    pub sid: Option<String>,
    pub parent: Option<usize>,
    pub transform: Mat4,
    pub is_joint: bool,
}

#[derive(Debug, Default)]
pub(crate) struct SkeletonCandidate {
    /// The root node name `<skeleton>` references.
    pub root: String,
    pub nodes: Vec<SceneNodeRecord>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ChannelData {
    /// Channel target's node-local name (substring before the first `/`).
    pub target_node: String,
    pub times: Vec<f32>,
    pub transforms: Vec<Transform>,
}

#[derive(Debug, Default)]
pub(crate) struct AnimationData {
    pub channels: Vec<ChannelData>,
}

// ============================================================================
// Document
// ============================================================================

/// A parsed COLLADA scene document, ready for assembly via
/// [`create_shared_skeleton`](super::ColladaDocument::create_shared_skeleton).
#[derive(Debug, Default)]
pub struct ColladaDocument {
    pub(crate) geometries: Vec<GeometryMesh>,
    pub(crate) skins: Vec<SkinData>,
    pub(crate) skeletons: Vec<SkeletonCandidate>,
    pub(crate) animations: Vec<AnimationData>,
}

impl ColladaDocument {
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        let xml = roxmltree::Document::parse(text)?;
        let root = xml.root_element();
        if root.tag_name().name() != "COLLADA" {
            return Err(SkelError::MalformedDocument(format!(
                "expected <COLLADA> root, found <{}>",
                root.tag_name().name()
            )));
        }

        let mut doc = Self::default();
        for library in root.children().filter(XmlNode::is_element) {
            match library.tag_name().name() {
                "library_geometries" => doc.parse_geometries(library),
                "library_controllers" => doc.parse_controllers(library)?,
                "library_visual_scenes" => doc.parse_visual_scenes(library),
                "library_animations" => doc.parse_animations(library),
                _ => {}
            }
        }

        log::debug!(
            "parsed COLLADA document: {} geometries, {} skins, {} skeletons, {} animations",
            doc.geometries.len(),
            doc.skins.len(),
            doc.skeletons.len(),
            doc.animations.len()
        );

        Ok(doc)
    }

    // ========================================================================
    // library_geometries
    // ========================================================================

    fn parse_geometries(&mut self, library: XmlNode) {
        for geometry_el in elements(library, "geometry") {
            let Some(id) = geometry_el.attribute("id") else {
                warn!("skipping <geometry> without id");
                continue;
            };

            // Only <mesh> payloads are supported (no splines/convex hulls).
            let Some(mesh_el) = child(geometry_el, "mesh") else {
                warn!("skipping geometry '{id}': no <mesh> element");
                continue;
            };

            let mut mesh = GeometryMesh {
                id: id.to_string(),
                ..GeometryMesh::default()
            };

            for node in mesh_el.children().filter(XmlNode::is_element) {
                match node.tag_name().name() {
                    "source" => {
                        if let Some((src_id, source)) = parse_source(node) {
                            mesh.sources.insert(src_id, source);
                        }
                    }
                    "vertices" => {
                        let Some(vertices_id) = node.attribute("id") else {
                            warn!("skipping <vertices> without id in geometry '{id}'");
                            continue;
                        };
                        let Some(input) =
                            elements(node, "input").find_map(|i| parse_input(i, false))
                        else {
                            warn!("skipping <vertices> '{vertices_id}': no usable input");
                            continue;
                        };
                        mesh.vertices.insert(vertices_id.to_string(), input);
                    }
                    "triangles" => {
                        if let Some(tris) = parse_triangles(node, id) {
                            mesh.triangles.push(tris);
                        }
                    }
                    _ => {}
                }
            }

            self.geometries.push(mesh);
        }
    }

    // ========================================================================
    // library_controllers
    // ========================================================================

    fn parse_controllers(&mut self, library: XmlNode) -> Result<()> {
        for controller_el in elements(library, "controller") {
            let Some(id) = controller_el.attribute("id") else {
                warn!("skipping <controller> without id");
                continue;
            };
            let Some(skin_el) = child(controller_el, "skin") else {
                continue;
            };
            let Some(geometry) = skin_el.attribute("source").map(strip_hash) else {
                warn!("skipping skin '{id}': no source geometry reference");
                continue;
            };

            let bind_shape = child(skin_el, "bind_shape_matrix")
                .and_then(|n| n.text())
                .map_or(Mat4::IDENTITY, |t| parse_matrix_text(t));

            let mut sources: HashMap<String, Source> = HashMap::new();
            for source_el in elements(skin_el, "source") {
                if let Some((src_id, source)) = parse_source(source_el) {
                    sources.insert(src_id, source);
                }
            }

            let Some(skin) = self.parse_skin_body(
                id,
                geometry,
                bind_shape,
                skin_el,
                &sources,
            )?
            else {
                continue;
            };

            self.skins.push(skin);
        }
        Ok(())
    }

    /// Parses the `<joints>` and `<vertex_weights>` blocks. Returns
    /// `Ok(None)` when the skin is malformed enough to skip, `Err` on count
    /// mismatches that would corrupt the resource.
    fn parse_skin_body(
        &self,
        id: &str,
        geometry: &str,
        bind_shape: Mat4,
        skin_el: XmlNode,
        sources: &HashMap<String, Source>,
    ) -> Result<Option<SkinData>> {
        // --- joints: JOINT name list + INV_BIND_MATRIX array ---
        let Some(joints_el) = child(skin_el, "joints") else {
            warn!("skipping skin '{id}': no <joints> block");
            return Ok(None);
        };

        let mut joint_names: Vec<String> = Vec::new();
        let mut inverse_binds: Vec<Mat4> = Vec::new();

        for input in elements(joints_el, "input").filter_map(|i| parse_input(i, false)) {
            let Some(source) = sources.get(&input.source) else {
                warn!("skin '{id}': joints input references missing source '{}'", input.source);
                continue;
            };
            match input.semantic {
                Semantic::Joint => joint_names = source.names.clone(),
                Semantic::InvBindMatrix => {
                    inverse_binds = source
                        .floats
                        .chunks_exact(16)
                        .map(parse_matrix_chunk)
                        .collect();
                }
                _ => {}
            }
        }

        if joint_names.is_empty() {
            warn!("skipping skin '{id}': empty joint name list");
            return Ok(None);
        }
        if inverse_binds.len() != joint_names.len() {
            return Err(SkelError::InvalidResource(format!(
                "skin '{id}': {} inverse bind matrices for {} joints",
                inverse_binds.len(),
                joint_names.len()
            )));
        }

        // --- vertex_weights: vcount/v index pairs ---
        let Some(vw_el) = child(skin_el, "vertex_weights") else {
            warn!("skipping skin '{id}': no <vertex_weights> block");
            return Ok(None);
        };

        let mut joint_offset = None;
        let mut weight_offset = None;
        let mut weight_source = None;
        for input in elements(vw_el, "input").filter_map(|i| parse_input(i, true)) {
            match input.semantic {
                Semantic::Joint => joint_offset = Some(input.offset),
                Semantic::Weight => {
                    weight_offset = Some(input.offset);
                    weight_source = sources.get(&input.source);
                }
                _ => {}
            }
        }
        let (Some(joint_offset), Some(weight_offset), Some(weight_source)) =
            (joint_offset, weight_offset, weight_source)
        else {
            warn!("skipping skin '{id}': incomplete <vertex_weights> inputs");
            return Ok(None);
        };

        let vcount: Vec<usize> = child(vw_el, "vcount")
            .and_then(|n| n.text())
            .map(parse_indices)
            .unwrap_or_default();
        let v: Vec<i64> = child(vw_el, "v")
            .and_then(|n| n.text())
            .map(|t| {
                t.split_ascii_whitespace()
                    .filter_map(|s| s.parse().ok())
                    .collect()
            })
            .unwrap_or_default();

        let pair_stride = joint_offset.max(weight_offset) + 1;
        let total_pairs: usize = vcount.iter().sum();
        if total_pairs * pair_stride != v.len() {
            return Err(SkelError::InvalidResource(format!(
                "skin '{id}': vertex weight stream has {} values, expected {}",
                v.len(),
                total_pairs * pair_stride
            )));
        }

        let mut vertex_weights = Vec::with_capacity(vcount.len());
        let mut cursor = 0;
        for &influence_count in &vcount {
            let mut pairs = InfluencePairs::new();
            for _ in 0..influence_count {
                let joint = v[cursor + joint_offset];
                let weight_idx = v[cursor + weight_offset];
                cursor += pair_stride;

                // Joint index -1 binds to the bind shape; there is nothing
                // to attach, so the pair is dropped like a zero weight.
                if joint < 0 {
                    continue;
                }
                let Some(&weight) = weight_source.floats.get(weight_idx as usize) else {
                    return Err(SkelError::InvalidResource(format!(
                        "skin '{id}': weight index {weight_idx} out of bounds"
                    )));
                };
                if weight != 0.0 {
                    pairs.push((joint as usize, weight));
                }
            }

            // Renormalize only when something positive remains; a vertex
            // whose only nonzero weight was discarded becomes unweighted.
            let sum: f32 = pairs.iter().map(|(_, w)| w).sum();
            if sum > 0.0 {
                for (_, w) in &mut pairs {
                    *w /= sum;
                }
            } else {
                pairs.clear();
            }

            vertex_weights.push(pairs);
        }

        Ok(Some(SkinData {
            id: id.to_string(),
            geometry: geometry.to_string(),
            bind_shape,
            joint_names,
            inverse_binds,
            vertex_weights,
            skeleton_root: None,
        }))
    }

    // ========================================================================
    // library_visual_scenes
    // ========================================================================

    fn parse_visual_scenes(&mut self, library: XmlNode) {
        // Pass 1: record skin → skeleton-root associations from every
        // <instance_controller>.
        let mut roots: Vec<String> = Vec::new();
        for scene_el in elements(library, "visual_scene") {
            collect_controller_refs(scene_el, &mut self.skins, &mut roots);
        }

        // Pass 2: flatten each referenced root's subtree into a candidate.
        for root_name in roots {
            if self.skeletons.iter().any(|s| s.root == root_name) {
                continue;
            }
            let mut found = None;
            for scene_el in elements(library, "visual_scene") {
                if let Some(node_el) = find_node_by_name(scene_el, &root_name) {
                    found = Some(node_el);
                    break;
                }
            }
            let Some(root_el) = found else {
                warn!("skeleton root '{root_name}' referenced but not found in any scene");
                continue;
            };

            let mut candidate = SkeletonCandidate {
                root: root_name,
                nodes: Vec::new(),
            };
            flatten_node(root_el, None, &mut candidate.nodes);
            self.skeletons.push(candidate);
        }
    }

    // ========================================================================
    // library_animations
    // ========================================================================

    fn parse_animations(&mut self, library: XmlNode) {
        for anim_el in elements(library, "animation") {
            let mut data = AnimationData::default();
            collect_animation(anim_el, &mut data);
            if data.channels.is_empty() {
                warn!("skipping <animation> with no usable channels");
                continue;
            }
            self.animations.push(data);
        }
    }
}

// ============================================================================
// Element parsing helpers
// ============================================================================

fn elements<'a>(
    parent: XmlNode<'a, 'a>,
    name: &'static str,
) -> impl Iterator<Item = XmlNode<'a, 'a>> {
    parent
        .children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a>(parent: XmlNode<'a, 'a>, name: &str) -> Option<XmlNode<'a, 'a>> {
    parent
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn strip_hash(s: &str) -> &str {
    s.strip_prefix('#').unwrap_or(s)
}

fn parse_floats(text: &str) -> Vec<f32> {
    text.split_ascii_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn parse_indices(text: &str) -> Vec<usize> {
    text.split_ascii_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}

/// COLLADA matrices are row-major in document order; glam is column-major.
fn parse_matrix_chunk(chunk: &[f32]) -> Mat4 {
    let mut vals = [0.0f32; 16];
    vals.copy_from_slice(chunk);
    Mat4::from_cols_array(&vals).transpose()
}

fn parse_matrix_text(text: &str) -> Mat4 {
    let floats = parse_floats(text);
    if floats.len() == 16 {
        parse_matrix_chunk(&floats)
    } else {
        warn!("matrix element has {} values, expected 16; using identity", floats.len());
        Mat4::IDENTITY
    }
}

fn parse_source(node: XmlNode) -> Option<(String, Source)> {
    let id = node.attribute("id")?;

    let mut source = Source::default();
    if let Some(float_array) = child(node, "float_array") {
        source.floats = float_array.text().map(parse_floats).unwrap_or_default();
    } else if let Some(name_array) = child(node, "Name_array") {
        source.names = name_array
            .text()
            .map(|t| {
                t.split_ascii_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
    } else {
        warn!("skipping source '{id}': no float_array or Name_array payload");
        return None;
    }

    let Some(accessor) = child(node, "technique_common").and_then(|tc| child(tc, "accessor"))
    else {
        warn!("skipping source '{id}': no accessor");
        return None;
    };

    source.count = accessor
        .attribute("count")
        .and_then(|c| c.parse().ok())?;
    source.stride = accessor
        .attribute("stride")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let payload = source.floats.len().max(source.names.len());
    if source.count * source.stride > payload {
        warn!(
            "skipping source '{id}': accessor declares {}x{} values, payload has {payload}",
            source.count, source.stride
        );
        return None;
    }

    Some((id.to_string(), source))
}

/// `require_offset` distinguishes shared inputs (triangles, vertex_weights)
/// from unshared ones (vertices, joints, samplers).
fn parse_input(node: XmlNode, require_offset: bool) -> Option<Input> {
    let semantic = Semantic::parse(node.attribute("semantic")?)?;
    let source = strip_hash(node.attribute("source")?).to_string();

    let offset = match node.attribute("offset").and_then(|o| o.parse().ok()) {
        Some(offset) => offset,
        None if require_offset => return None,
        None => 0,
    };

    Some(Input {
        semantic,
        source,
        offset,
    })
}

fn parse_triangles(node: XmlNode, geometry_id: &str) -> Option<TriangleList> {
    let mut tris = TriangleList {
        count: node.attribute("count").and_then(|c| c.parse().ok())?,
        ..TriangleList::default()
    };

    for input_el in elements(node, "input") {
        // Triangle inputs without a recognized semantic are a layout we
        // cannot place; assembly rejects them, parsing keeps what it can.
        if let Some(input) = parse_input(input_el, true) {
            tris.inputs.push(input);
        }
    }
    tris.prims = child(node, "p")
        .and_then(|p| p.text())
        .map(parse_indices)
        .unwrap_or_default();

    if tris.inputs.is_empty() || tris.prims.is_empty() {
        warn!("skipping empty <triangles> in geometry '{geometry_id}'");
        return None;
    }

    Some(tris)
}

// ============================================================================
// Scene-graph helpers
// ============================================================================

fn collect_controller_refs(node: XmlNode, skins: &mut [SkinData], roots: &mut Vec<String>) {
    for child_el in node.children().filter(XmlNode::is_element) {
        if child_el.tag_name().name() == "instance_controller" {
            let Some(url) = child_el.attribute("url").map(strip_hash) else {
                continue;
            };
            let Some(root) = child(child_el, "skeleton")
                .and_then(|s| s.text())
                .map(|t| strip_hash(t.trim()).to_string())
            else {
                warn!("<instance_controller> '#{url}' has no <skeleton> reference");
                continue;
            };

            if let Some(skin) = skins.iter_mut().find(|s| s.id == url) {
                skin.skeleton_root = Some(root.clone());
            } else {
                warn!("<instance_controller> references unknown controller '{url}'");
            }
            if !roots.contains(&root) {
                roots.push(root);
            }
        } else {
            collect_controller_refs(child_el, skins, roots);
        }
    }
}

fn node_name(el: XmlNode) -> Option<String> {
    el.attribute("id")
        .or_else(|| el.attribute("name"))
        .or_else(|| el.attribute("sid"))
        .map(str::to_string)
}

fn find_node_by_name<'a>(parent: XmlNode<'a, 'a>, name: &str) -> Option<XmlNode<'a, 'a>> {
    for el in parent.children().filter(XmlNode::is_element) {
        if el.tag_name().name() == "node" {
            let matches = el.attribute("id") == Some(name) || el.attribute("name") == Some(name);
            if matches {
                return Some(el);
            }
        }
        if let Some(found) = find_node_by_name(el, name) {
            return Some(found);
        }
    }
    None
}

/// Depth-first flattening: the node's own index is recorded before its
/// children are visited, which is exactly the parent-precedes-child ordering
/// the runtime pose pass relies on.
fn flatten_node(el: XmlNode, parent: Option<usize>, out: &mut Vec<SceneNodeRecord>) {
    let idx = out.len();
    let name = node_name(el).unwrap_or_else(|| format!("node{idx}"));

    out.push(SceneNodeRecord {
        name,
        sid: el.attribute("sid").map(str::to_string),
        parent,
        transform: parse_node_transform(el),
        is_joint: el.attribute("type") == Some("JOINT"),
    });

    for child_el in elements(el, "node") {
        flatten_node(child_el, Some(idx), out);
    }
}

/// Composes the node's local rest transform from its transform elements in
/// document order (`<matrix>`, `<translate>`, `<rotate>`, `<scale>`).
fn parse_node_transform(el: XmlNode) -> Mat4 {
    let mut local = Mat4::IDENTITY;
    for t in el.children().filter(XmlNode::is_element) {
        let Some(text) = t.text() else { continue };
        match t.tag_name().name() {
            "matrix" => local *= parse_matrix_text(text),
            "translate" => {
                let v = parse_floats(text);
                if v.len() == 3 {
                    local *= Mat4::from_translation(glam::Vec3::new(v[0], v[1], v[2]));
                }
            }
            "rotate" => {
                let v = parse_floats(text);
                if v.len() == 4 {
                    let axis = glam::Vec3::new(v[0], v[1], v[2]);
                    if axis.length_squared() > 0.0 {
                        local *=
                            Mat4::from_axis_angle(axis.normalize(), v[3].to_radians());
                    }
                }
            }
            "scale" => {
                let v = parse_floats(text);
                if v.len() == 3 {
                    local *= Mat4::from_scale(glam::Vec3::new(v[0], v[1], v[2]));
                }
            }
            _ => {}
        }
    }
    local
}

// ============================================================================
// Animation helpers
// ============================================================================

#[derive(Default)]
struct SamplerInputs {
    times: Option<String>,
    output: Option<String>,
    interpolation: Option<String>,
}

/// Collects channels from one `<animation>` element, recursing into nested
/// `<animation>` children (exporters commonly nest one animation per
/// channel under a shared parent).
fn collect_animation(el: XmlNode, data: &mut AnimationData) {
    let mut sources: HashMap<String, Source> = HashMap::new();
    for source_el in elements(el, "source") {
        if let Some((id, source)) = parse_source(source_el) {
            sources.insert(id, source);
        }
    }

    let mut samplers: HashMap<String, SamplerInputs> = HashMap::new();
    for sampler_el in elements(el, "sampler") {
        let Some(id) = sampler_el.attribute("id") else {
            continue;
        };
        let mut inputs = SamplerInputs::default();
        for input in elements(sampler_el, "input").filter_map(|i| parse_input(i, false)) {
            match input.semantic {
                Semantic::Input => inputs.times = Some(input.source),
                Semantic::Output => inputs.output = Some(input.source),
                Semantic::Interpolation => inputs.interpolation = Some(input.source),
                _ => {}
            }
        }
        samplers.insert(id.to_string(), inputs);
    }

    for channel_el in elements(el, "channel") {
        let (Some(sampler_id), Some(target)) = (
            channel_el.attribute("source").map(strip_hash),
            channel_el.attribute("target"),
        ) else {
            warn!("skipping <channel> without source/target");
            continue;
        };
        let Some(sampler) = samplers.get(sampler_id) else {
            warn!("skipping channel: unknown sampler '{sampler_id}'");
            continue;
        };

        let times = sampler
            .times
            .as_ref()
            .and_then(|id| sources.get(id))
            .map(|s| s.floats.clone());
        let output = sampler
            .output
            .as_ref()
            .and_then(|id| sources.get(id))
            .map(|s| &s.floats);

        let (Some(times), Some(output)) = (times, output) else {
            warn!("skipping channel '{target}': sampler inputs unresolved");
            continue;
        };

        // Only LINEAR interpolation is supported; anything else degrades to
        // linear sampling rather than failing the import.
        if let Some(interp) = sampler
            .interpolation
            .as_ref()
            .and_then(|id| sources.get(id))
        {
            if interp.names.iter().any(|n| n != "LINEAR") {
                warn!("channel '{target}': non-LINEAR interpolation not supported");
            }
        }

        if output.len() != times.len() * 16 {
            warn!(
                "skipping channel '{target}': {} output floats for {} keys",
                output.len(),
                times.len()
            );
            continue;
        }

        let transforms = output
            .chunks_exact(16)
            .map(|chunk| Transform::from_mat4(&parse_matrix_chunk(chunk)))
            .collect();

        let target_node = target.split('/').next().unwrap_or(target).to_string();
        data.channels.push(ChannelData {
            target_node,
            times,
            transforms,
        });
    }

    for nested in elements(el, "animation") {
        collect_animation(nested, data);
    }
}
