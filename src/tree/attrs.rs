//! Typed attribute storage for nodes
//!
//! Attributes are an open key → value map, but every value is typed and
//! every write goes through the variant's schema (see [`super::schema`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known attribute keys
pub mod keys {
    pub const LAYOUT: &str = "layout";
    pub const COLS: &str = "cols";
    pub const FLEX_DIR: &str = "flexDir";
    pub const GRID_COLUMN: &str = "gridColumn";
    pub const TITLE: &str = "title";
    pub const TITLE_VISIBLE: &str = "titleVisible";
    pub const BTN_STYLE: &str = "btnStyle";
    pub const ICON: &str = "icon";
    pub const LABEL: &str = "label";
    pub const CONTENT: &str = "content";
    pub const PLACEHOLDER: &str = "placeholder";
}

/// Layout mode of a container's children slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Grid,
    Flex,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Grid => "grid",
            LayoutMode::Flex => "flex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grid" => Some(LayoutMode::Grid),
            "flex" => Some(LayoutMode::Flex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

impl FlexDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            FlexDirection::Row => "row",
            FlexDirection::Column => "column",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "row" => Some(FlexDirection::Row),
            "column" => Some(FlexDirection::Column),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Tertiary,
    Icon,
}

impl ButtonStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonStyle::Primary => "primary",
            ButtonStyle::Secondary => "secondary",
            ButtonStyle::Tertiary => "tertiary",
            ButtonStyle::Icon => "icon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(ButtonStyle::Primary),
            "secondary" => Some(ButtonStyle::Secondary),
            "tertiary" => Some(ButtonStyle::Tertiary),
            "icon" => Some(ButtonStyle::Icon),
            _ => None,
        }
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(u32),
    Str(String),
    Layout(LayoutMode),
    FlexDir(FlexDirection),
    ButtonStyle(ButtonStyle),
}

impl AttrValue {
    pub fn str(s: impl Into<String>) -> Self {
        AttrValue::Str(s.into())
    }

    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Str(_) => "string",
            AttrValue::Layout(_) => "layout",
            AttrValue::FlexDir(_) => "flex direction",
            AttrValue::ButtonStyle(_) => "button style",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(n) => write!(f, "{}", n),
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Layout(l) => f.write_str(l.as_str()),
            AttrValue::FlexDir(d) => f.write_str(d.as_str()),
            AttrValue::ButtonStyle(s) => f.write_str(s.as_str()),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<LayoutMode> for AttrValue {
    fn from(v: LayoutMode) -> Self {
        AttrValue::Layout(v)
    }
}

impl From<FlexDirection> for AttrValue {
    fn from(v: FlexDirection) -> Self {
        AttrValue::FlexDir(v)
    }
}

impl From<ButtonStyle> for AttrValue {
    fn from(v: ButtonStyle) -> Self {
        AttrValue::ButtonStyle(v)
    }
}

/// Attribute container: key → typed value, iterated in key order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    map: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value without schema validation; callers on the edit
    /// boundary go through [`NodeTree::set_attribute`](super::NodeTree::set_attribute).
    pub(crate) fn insert(&mut self, key: impl Into<String>, value: AttrValue) -> Option<AttrValue> {
        self.map.insert(key.into(), value)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.map.get(key) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Layout mode, defaulting to grid when unset
    pub fn layout_mode(&self) -> LayoutMode {
        match self.map.get(keys::LAYOUT) {
            Some(AttrValue::Layout(l)) => *l,
            _ => LayoutMode::default(),
        }
    }

    pub fn flex_direction(&self) -> FlexDirection {
        match self.map.get(keys::FLEX_DIR) {
            Some(AttrValue::FlexDir(d)) => *d,
            _ => FlexDirection::default(),
        }
    }

    pub fn button_style(&self) -> Option<ButtonStyle> {
        match self.map.get(keys::BTN_STYLE) {
            Some(AttrValue::ButtonStyle(s)) => Some(*s),
            _ => None,
        }
    }

    /// Grid span, defaulting to 1
    pub fn grid_column(&self) -> u32 {
        self.get_u32(keys::GRID_COLUMN).unwrap_or(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
