use indexmap::IndexMap;
use orgchart_core::Rgb;
use serde::{Deserialize, Serialize};

/// Integer grid slot assigned by the tree layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub column: usize,
    pub depth: usize,
}

impl GridPos {
    pub fn new(column: usize, depth: usize) -> Self {
        Self { column, depth }
    }
}

/// Pixel rectangle `(x0, y0)..(x1, y1)` in render-scale coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelBox {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }

    /// Integer center, rounded down like the rest of the geometry.
    pub fn center(&self) -> PixelPoint {
        PixelPoint {
            x: (self.x0 + self.x1).div_euclid(2),
            y: (self.y0 + self.y1).div_euclid(2),
        }
    }

    pub fn contains(&self, other: &PixelBox) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

/// Grid placement of one root's subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLayout {
    pub root: String,
    /// Position per reachable node, in pre-order (parent before children, children left to
    /// right).
    pub positions: IndexMap<String, GridPos>,
    /// Subtree width (leaf slots) per reachable node.
    pub widths: IndexMap<String, usize>,
    /// Occupied column count: max column + 1.
    pub columns: usize,
    /// Level count: max depth + 1.
    pub levels: usize,
}

impl TreeLayout {
    pub fn position(&self, username: &str) -> Option<GridPos> {
        self.positions.get(username).copied()
    }

    pub fn width(&self, username: &str) -> Option<usize> {
        self.widths.get(username).copied()
    }
}

/// Several subtrees side by side. `offsets[i]` is the first global column of `trees[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestLayout {
    pub trees: Vec<TreeLayout>,
    pub offsets: Vec<usize>,
    pub columns: usize,
    pub levels: usize,
}

impl ForestLayout {
    /// Global position of `username` (tree column plus the tree's offset).
    pub fn position(&self, username: &str) -> Option<GridPos> {
        self.trees
            .iter()
            .zip(&self.offsets)
            .find_map(|(t, off)| {
                t.position(username)
                    .map(|p| GridPos::new(p.column + off, p.depth))
            })
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(|t| t.positions.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorStyle {
    /// Title color fills the whole card.
    #[default]
    Background,
    /// Neutral card with a title-colored stripe on the left edge.
    Stripe,
}

impl std::str::FromStr for ColorStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bg" | "background" => Ok(Self::Background),
            "stripe" => Ok(Self::Stripe),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub fill: Rgb,
    pub border: Rgb,
    pub shadow: Rgb,
    pub text_main: Rgb,
    pub text_sub: Rgb,
    pub stripe: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub x: i64,
    pub y: i64,
    pub font_size: i64,
    pub lines: Vec<String>,
    pub fill: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBox {
    pub username: String,
    pub grid: GridPos,
    pub bbox: PixelBox,
    pub radius: i64,
    pub border_width: i64,
    pub stripe_width: i64,
    pub style: NodeStyle,
    pub name: TextBlock,
    pub detail: TextBlock,
    pub mail: Option<TextBlock>,
    pub highlighted: bool,
}

/// Orthogonal parent→child connector: down, across at the row midpoint, down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub from: String,
    pub to: String,
    pub points: [PixelPoint; 4],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendItem {
    pub title: String,
    pub color: Rgb,
    pub swatch: PixelBox,
    pub label: TextBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendLayout {
    pub bbox: PixelBox,
    pub radius: i64,
    pub heading: TextBlock,
    pub swatch_radius: i64,
    pub items: Vec<LegendItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub line_width: i64,
    pub highlight_width: i64,
    pub connectors: Vec<Connector>,
    pub nodes: Vec<NodeBox>,
    pub legend: Option<LegendLayout>,
    /// Node bounding boxes keyed by username, in draw order.
    pub bboxes: IndexMap<String, PixelBox>,
}

impl ChartLayout {
    /// Canvas with no nodes.
    pub fn blank(width: u32, height: u32, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            line_width: 1,
            highlight_width: 2,
            connectors: Vec::new(),
            nodes: Vec::new(),
            legend: None,
            bboxes: IndexMap::new(),
        }
    }

    pub fn node(&self, username: &str) -> Option<&NodeBox> {
        self.nodes.iter().find(|n| n.username == username)
    }

    pub fn to_json(&self, pretty: bool) -> crate::Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}
