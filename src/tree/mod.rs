//! Node tree model: typed nodes, named slots and schema-checked attributes

pub mod attrs;
mod model;
mod node;
mod outline;
pub mod schema;

pub use attrs::{keys, AttrValue, Attributes, ButtonStyle, FlexDirection, LayoutMode};
pub use model::{Direction, NodeTree, ObserverId, TreeEvent};
pub use node::{Kind, Node, NodeId, SlotName, SlotRef, Variant};
pub use outline::render_outline;
pub use schema::{schema_for, AttrDef, AttrSchema, AttrType, MAX_GRID_COLUMNS};
