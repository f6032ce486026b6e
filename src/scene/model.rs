use std::path::Path;

use crate::foundation::core::{BezPath, Canvas, Color};
use crate::foundation::error::{StratumError, StratumResult};
use crate::foundation::ids::NodeId;
use crate::root::Root;
use crate::scene::content::{Content, ImageSource};
use crate::style::computed::ComputedStyle;

/// JSON description of a static scene.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneDef {
    /// Output size.
    pub canvas: Canvas,
    /// Frame clear color.
    #[serde(default)]
    pub clear: Color,
    /// Tile edge override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_unit: Option<u32>,
    /// Children of the root, in paint order.
    pub nodes: Vec<NodeDef>,
}

/// One node and its children.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    /// Debug name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Computed style.
    #[serde(default)]
    pub style: ComputedStyle,
    /// Own content.
    #[serde(default)]
    pub content: ContentDef,
    /// Children in paint order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDef>,
}

/// Serializable content kinds.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDef {
    /// Background only.
    #[default]
    None,
    /// SVG path data filled with a solid color.
    Path {
        /// SVG `d` attribute.
        svg_path_d: String,
        /// Fill color.
        fill: Color,
    },
    /// Encoded image file, relative to the scene file.
    Image {
        /// File path.
        source: String,
    },
}

impl SceneDef {
    /// Check sizes, filter parameters and path data.
    pub fn validate(&self) -> StratumResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(StratumError::validation("canvas width/height must be > 0"));
        }
        if self.tile_unit == Some(0) {
            return Err(StratumError::validation("tile_unit must be > 0"));
        }
        let mut stack: Vec<&NodeDef> = self.nodes.iter().collect();
        while let Some(n) = stack.pop() {
            n.validate()?;
            stack.extend(n.children.iter());
        }
        Ok(())
    }

    /// Create every node under `root`, resolving image paths against `base_dir`.
    ///
    /// Returns the created ids in pre-order.
    pub fn build(&self, root: &mut Root, base_dir: &Path) -> StratumResult<Vec<NodeId>> {
        self.validate()?;
        let mut out = Vec::new();
        let mut stack: Vec<(&NodeDef, NodeId)> = self
            .nodes
            .iter()
            .rev()
            .map(|n| (n, root.root_node()))
            .collect();
        while let Some((def, parent)) = stack.pop() {
            let id = root.create_node(def.style.clone(), def.content.resolve(base_dir)?);
            if let Some(name) = &def.name {
                root.set_name(id, name.clone())?;
            }
            root.append_child(parent, id)?;
            out.push(id);
            stack.extend(def.children.iter().rev().map(|c| (c, id)));
        }
        Ok(out)
    }
}

impl NodeDef {
    fn validate(&self) -> StratumResult<()> {
        let label = self.name.as_deref().unwrap_or("<unnamed>");
        let s = &self.style;
        if !(s.width >= 0.0 && s.height >= 0.0) {
            return Err(StratumError::validation(format!(
                "node '{label}' has a negative or NaN size"
            )));
        }
        if !(0.0..=1.0).contains(&s.opacity) {
            return Err(StratumError::validation(format!(
                "node '{label}' opacity must be in [0, 1]"
            )));
        }
        if let Some(problem) = s.filters.iter().find_map(crate::filter::problem) {
            return Err(StratumError::validation(format!("node '{label}': {problem}")));
        }
        if let ContentDef::Path { svg_path_d, .. } = &self.content {
            BezPath::from_svg(svg_path_d).map_err(|e| {
                StratumError::validation(format!("node '{label}' has bad path data: {e}"))
            })?;
        }
        Ok(())
    }
}

impl ContentDef {
    fn resolve(&self, base_dir: &Path) -> StratumResult<Content> {
        Ok(match self {
            Self::None => Content::None,
            Self::Path { svg_path_d, fill } => Content::Path {
                path: BezPath::from_svg(svg_path_d)
                    .map_err(|e| StratumError::validation(format!("bad path data: {e}")))?,
                fill: *fill,
            },
            Self::Image { source } => Content::Image(ImageSource::open(base_dir.join(source))),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
