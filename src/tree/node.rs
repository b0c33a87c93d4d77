//! Core node types: identifiers, kinds, variants and slots

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::attrs::Attributes;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identifier, assigned at creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n_{:07}", self.0)
    }
}

/// Whether a node may hold children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Container,
    Component,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Container => write!(f, "container"),
            Kind::Component => write!(f, "component"),
        }
    }
}

/// The closed set of placeable component variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Section,
    Card,
    Form,
    Splitter,
    Button,
    Input,
    Text,
    #[serde(rename = "radiogroup")]
    RadioGroup,
    Datagrid,
    Tabs,
    Header,
    List,
}

impl Variant {
    pub const ALL: [Variant; 12] = [
        Variant::Section,
        Variant::Card,
        Variant::Form,
        Variant::Splitter,
        Variant::Button,
        Variant::Input,
        Variant::Text,
        Variant::RadioGroup,
        Variant::Datagrid,
        Variant::Tabs,
        Variant::Header,
        Variant::List,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Section => "section",
            Variant::Card => "card",
            Variant::Form => "form",
            Variant::Splitter => "splitter",
            Variant::Button => "button",
            Variant::Input => "input",
            Variant::Text => "text",
            Variant::RadioGroup => "radiogroup",
            Variant::Datagrid => "datagrid",
            Variant::Tabs => "tabs",
            Variant::Header => "header",
            Variant::List => "list",
        }
    }

    /// The kind a palette payload for this variant carries
    pub fn kind(self) -> Kind {
        match self {
            Variant::Section | Variant::Card | Variant::Form | Variant::Splitter => {
                Kind::Container
            }
            _ => Kind::Component,
        }
    }

    /// Default display name for a freshly created node
    pub fn default_name(self) -> &'static str {
        match self {
            Variant::Button => "Button",
            Variant::Input => "Input",
            Variant::Text => "Text",
            Variant::RadioGroup => "Radio Group",
            Variant::Datagrid => "Datagrid",
            Variant::Tabs => "Tabs",
            Variant::Header => "Header",
            Variant::List => "List",
            other => other.as_str(),
        }
    }

    /// Slots exposed by this variant, in document order
    pub fn slots(self) -> &'static [SlotName] {
        match self {
            Variant::Section | Variant::Card | Variant::Form => &[SlotName::Children],
            Variant::Splitter => &[SlotName::LeftPanel, SlotName::RightPanel],
            Variant::Header => &[SlotName::Actions],
            _ => &[],
        }
    }

    /// Whether a pointer walking up the tree stops here to drop
    pub fn is_drop_container(self) -> bool {
        !self.slots().is_empty()
    }

    /// At most one instance may exist, always at root
    pub fn is_singleton(self) -> bool {
        matches!(self, Variant::Header | Variant::Splitter)
    }

    /// Form controls that need a form ancestor
    pub fn requires_form(self) -> bool {
        matches!(self, Variant::Input | Variant::Button | Variant::RadioGroup)
    }

    /// Variants accepted anywhere inside a form subtree
    pub fn allowed_in_form(self) -> bool {
        matches!(
            self,
            Variant::Section | Variant::Text | Variant::Input | Variant::Button | Variant::RadioGroup
        )
    }

    /// Variants whose selection overlay shows a layout badge
    pub fn has_layout_mode(self) -> bool {
        matches!(self, Variant::Section | Variant::Form | Variant::Card)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown variant '{}'", s))
    }
}

/// Named insertion point inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotName {
    Children,
    Actions,
    LeftPanel,
    RightPanel,
}

impl SlotName {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotName::Children => "children",
            SlotName::Actions => "actions",
            SlotName::LeftPanel => "leftPanel",
            SlotName::RightPanel => "rightPanel",
        }
    }

    pub fn is_panel(self) -> bool {
        matches!(self, SlotName::LeftPanel | SlotName::RightPanel)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parent position: the canvas root, or a named slot of a container node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRef {
    Root,
    Child { owner: NodeId, name: SlotName },
}

impl SlotRef {
    pub fn child(owner: NodeId, name: SlotName) -> Self {
        SlotRef::Child { owner, name }
    }

    pub fn owner(self) -> Option<NodeId> {
        match self {
            SlotRef::Root => None,
            SlotRef::Child { owner, .. } => Some(owner),
        }
    }

    pub fn name(self) -> Option<SlotName> {
        match self {
            SlotRef::Root => None,
            SlotRef::Child { name, .. } => Some(name),
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, SlotRef::Root)
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRef::Root => write!(f, "root"),
            SlotRef::Child { owner, name } => write!(f, "{}.{}", owner, name),
        }
    }
}

/// A placed component instance
///
/// Nodes are owned by a [`NodeTree`](super::NodeTree); structure and
/// attributes only change through the tree so that observers see every
/// mutation.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: Kind,
    pub(crate) variant: Variant,
    pub(crate) name: String,
    pub(crate) attributes: Attributes,
    pub(crate) slots: Vec<(SlotName, Vec<NodeId>)>,
    pub(crate) parent: Option<SlotRef>,
    pub(crate) locked: bool,
}

impl Node {
    pub(crate) fn new(kind: Kind, variant: Variant) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            variant,
            name: variant.default_name().to_string(),
            attributes: Attributes::new(),
            slots: variant.slots().iter().map(|s| (*s, Vec::new())).collect(),
            parent: None,
            locked: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Parent slot, `None` while detached
    pub fn parent(&self) -> Option<SlotRef> {
        self.parent
    }

    /// Locked nodes cannot be deleted, dragged or reordered
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn has_slot(&self, name: SlotName) -> bool {
        self.slots.iter().any(|(n, _)| *n == name)
    }

    pub fn slot_names(&self) -> impl Iterator<Item = SlotName> + '_ {
        self.slots.iter().map(|(n, _)| *n)
    }

    pub fn slot(&self, name: SlotName) -> Option<&[NodeId]> {
        self.slots
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ids)| ids.as_slice())
    }

    pub(crate) fn slot_mut(&mut self, name: SlotName) -> Option<&mut Vec<NodeId>> {
        self.slots
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, ids)| ids)
    }

    /// All children across every slot, slots in document order
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().flat_map(|(_, ids)| ids.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("n_"));
    }

    #[test]
    fn test_variant_round_trips_through_str() {
        for v in Variant::ALL {
            assert_eq!(v.as_str().parse::<Variant>().unwrap(), v);
        }
        assert!("widget".parse::<Variant>().is_err());
    }

    #[test]
    fn test_slots_follow_variant() {
        let splitter = Node::new(Kind::Container, Variant::Splitter);
        assert!(splitter.has_slot(SlotName::LeftPanel));
        assert!(splitter.has_slot(SlotName::RightPanel));
        assert!(!splitter.has_slot(SlotName::Children));

        let header = Node::new(Kind::Component, Variant::Header);
        assert_eq!(header.slot_names().collect::<Vec<_>>(), vec![SlotName::Actions]);

        let button = Node::new(Kind::Component, Variant::Button);
        assert_eq!(button.slot_names().count(), 0);
        assert_eq!(button.name(), "Button");
    }

    #[test]
    fn test_rule_tables() {
        assert!(Variant::Header.is_singleton());
        assert!(!Variant::Section.is_singleton());
        assert!(Variant::RadioGroup.requires_form());
        assert!(!Variant::Card.allowed_in_form());
        assert_eq!(Variant::Splitter.kind(), Kind::Container);
        assert_eq!(Variant::Header.kind(), Kind::Component);
    }
}
