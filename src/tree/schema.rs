//! Static attribute schemas for every variant.
//!
//! Each schema lists the keys a variant accepts, their value types and
//! flags. Used at the property-edit boundary by `NodeTree::set_attribute`
//! and to decide whether an edit needs an overlay re-sync.

use crate::error::AttrError;

use super::attrs::{keys, AttrValue, ButtonStyle, FlexDirection, LayoutMode};
use super::node::Variant;

/// Upper bound for `cols` and `gridColumn`
pub const MAX_GRID_COLUMNS: u32 = 4;

/// Changing the value moves boxes on screen
pub const FLAG_LAYOUT: u8 = 1 << 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Int { min: u32, max: u32 },
    Str,
    Layout,
    FlexDir,
    ButtonStyle,
}

impl AttrType {
    fn name(self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Int { .. } => "int",
            AttrType::Str => "string",
            AttrType::Layout => "layout",
            AttrType::FlexDir => "flex direction",
            AttrType::ButtonStyle => "button style",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttrDef {
    pub key: &'static str,
    pub ty: AttrType,
    pub flags: u8,
}

impl AttrDef {
    pub const fn new(key: &'static str, ty: AttrType, flags: u8) -> Self {
        Self { key, ty, flags }
    }

    pub fn affects_layout(&self) -> bool {
        self.flags & FLAG_LAYOUT != 0
    }

    /// Check a typed value against this definition
    pub fn check(&self, value: &AttrValue) -> Result<(), AttrError> {
        match (self.ty, value) {
            (AttrType::Bool, AttrValue::Bool(_))
            | (AttrType::Str, AttrValue::Str(_))
            | (AttrType::Layout, AttrValue::Layout(_))
            | (AttrType::FlexDir, AttrValue::FlexDir(_))
            | (AttrType::ButtonStyle, AttrValue::ButtonStyle(_)) => Ok(()),
            (AttrType::Int { min, max }, AttrValue::Int(v)) => {
                if (min..=max).contains(v) {
                    Ok(())
                } else {
                    Err(AttrError::out_of_range(self.key, *v, min, max))
                }
            }
            (ty, other) => Err(AttrError::TypeMismatch {
                key: self.key.to_string(),
                expected: ty.name(),
                found: other.type_name(),
            }),
        }
    }

    /// Parse a raw string (as typed into the properties panel) into a value
    pub fn parse(&self, raw: &str) -> Result<AttrValue, AttrError> {
        let raw = raw.trim();
        let invalid = || AttrError::invalid_value(self.key, raw);
        let value = match self.ty {
            AttrType::Bool => match raw {
                "true" => AttrValue::Bool(true),
                "false" => AttrValue::Bool(false),
                _ => return Err(invalid()),
            },
            AttrType::Int { .. } => AttrValue::Int(raw.parse().map_err(|_| invalid())?),
            AttrType::Str => AttrValue::Str(raw.to_string()),
            AttrType::Layout => AttrValue::Layout(LayoutMode::parse(raw).ok_or_else(invalid)?),
            AttrType::FlexDir => {
                AttrValue::FlexDir(FlexDirection::parse(raw).ok_or_else(invalid)?)
            }
            AttrType::ButtonStyle => {
                AttrValue::ButtonStyle(ButtonStyle::parse(raw).ok_or_else(invalid)?)
            }
        };
        self.check(&value)?;
        Ok(value)
    }
}

/// The attribute set accepted by one variant
#[derive(Debug)]
pub struct AttrSchema {
    pub variant: Variant,
    defs: &'static [AttrDef],
}

impl AttrSchema {
    pub const fn new(variant: Variant, defs: &'static [AttrDef]) -> Self {
        Self { variant, defs }
    }

    pub fn get(&self, key: &str) -> Option<&AttrDef> {
        self.defs.iter().find(|d| d.key == key)
    }

    pub fn defs(&self) -> &[AttrDef] {
        self.defs
    }

    fn def(&self, key: &str) -> Result<&AttrDef, AttrError> {
        self.get(key).ok_or_else(|| AttrError::UnknownKey {
            variant: self.variant,
            key: key.to_string(),
        })
    }

    pub fn validate(&self, key: &str, value: &AttrValue) -> Result<(), AttrError> {
        self.def(key)?.check(value)
    }

    pub fn parse(&self, key: &str, raw: &str) -> Result<AttrValue, AttrError> {
        self.def(key)?.parse(raw)
    }
}

const SPAN: AttrType = AttrType::Int {
    min: 1,
    max: MAX_GRID_COLUMNS,
};

const GRID_SPAN: AttrDef = AttrDef::new(keys::GRID_COLUMN, SPAN, FLAG_LAYOUT);

// ============================================================================
// Containers
// ============================================================================

const SECTION_DEFS: &[AttrDef] = &[
    AttrDef::new(keys::LAYOUT, AttrType::Layout, FLAG_LAYOUT),
    AttrDef::new(keys::COLS, SPAN, FLAG_LAYOUT),
    AttrDef::new(keys::FLEX_DIR, AttrType::FlexDir, FLAG_LAYOUT),
    GRID_SPAN,
    AttrDef::new(keys::TITLE, AttrType::Str, 0),
    // Showing the title pushes the children down
    AttrDef::new(keys::TITLE_VISIBLE, AttrType::Bool, FLAG_LAYOUT),
];

const CARD_DEFS: &[AttrDef] = &[
    AttrDef::new(keys::LAYOUT, AttrType::Layout, FLAG_LAYOUT),
    AttrDef::new(keys::COLS, SPAN, FLAG_LAYOUT),
    AttrDef::new(keys::FLEX_DIR, AttrType::FlexDir, FLAG_LAYOUT),
    GRID_SPAN,
    AttrDef::new(keys::TITLE, AttrType::Str, 0),
];

const SPLITTER_DEFS: &[AttrDef] = &[GRID_SPAN];

// ============================================================================
// Components
// ============================================================================

const BUTTON_DEFS: &[AttrDef] = &[
    GRID_SPAN,
    AttrDef::new(keys::LABEL, AttrType::Str, 0),
    AttrDef::new(keys::BTN_STYLE, AttrType::ButtonStyle, FLAG_LAYOUT),
    AttrDef::new(keys::ICON, AttrType::Str, 0),
];

const INPUT_DEFS: &[AttrDef] = &[
    GRID_SPAN,
    AttrDef::new(keys::LABEL, AttrType::Str, 0),
    AttrDef::new(keys::PLACEHOLDER, AttrType::Str, 0),
];

const TEXT_DEFS: &[AttrDef] = &[GRID_SPAN, AttrDef::new(keys::CONTENT, AttrType::Str, 0)];

const LABELLED_DEFS: &[AttrDef] = &[GRID_SPAN, AttrDef::new(keys::LABEL, AttrType::Str, 0)];

const TITLED_DEFS: &[AttrDef] = &[GRID_SPAN, AttrDef::new(keys::TITLE, AttrType::Str, 0)];

const PLAIN_DEFS: &[AttrDef] = &[GRID_SPAN];

// Header sits at root and never spans grid columns
const HEADER_DEFS: &[AttrDef] = &[AttrDef::new(keys::TITLE, AttrType::Str, 0)];

pub static SECTION_SCHEMA: AttrSchema = AttrSchema::new(Variant::Section, SECTION_DEFS);
pub static FORM_SCHEMA: AttrSchema = AttrSchema::new(Variant::Form, SECTION_DEFS);
pub static CARD_SCHEMA: AttrSchema = AttrSchema::new(Variant::Card, CARD_DEFS);
pub static SPLITTER_SCHEMA: AttrSchema = AttrSchema::new(Variant::Splitter, SPLITTER_DEFS);
pub static BUTTON_SCHEMA: AttrSchema = AttrSchema::new(Variant::Button, BUTTON_DEFS);
pub static INPUT_SCHEMA: AttrSchema = AttrSchema::new(Variant::Input, INPUT_DEFS);
pub static TEXT_SCHEMA: AttrSchema = AttrSchema::new(Variant::Text, TEXT_DEFS);
pub static RADIOGROUP_SCHEMA: AttrSchema = AttrSchema::new(Variant::RadioGroup, LABELLED_DEFS);
pub static DATAGRID_SCHEMA: AttrSchema = AttrSchema::new(Variant::Datagrid, TITLED_DEFS);
pub static TABS_SCHEMA: AttrSchema = AttrSchema::new(Variant::Tabs, PLAIN_DEFS);
pub static LIST_SCHEMA: AttrSchema = AttrSchema::new(Variant::List, PLAIN_DEFS);
pub static HEADER_SCHEMA: AttrSchema = AttrSchema::new(Variant::Header, HEADER_DEFS);

pub fn schema_for(variant: Variant) -> &'static AttrSchema {
    match variant {
        Variant::Section => &SECTION_SCHEMA,
        Variant::Form => &FORM_SCHEMA,
        Variant::Card => &CARD_SCHEMA,
        Variant::Splitter => &SPLITTER_SCHEMA,
        Variant::Button => &BUTTON_SCHEMA,
        Variant::Input => &INPUT_SCHEMA,
        Variant::Text => &TEXT_SCHEMA,
        Variant::RadioGroup => &RADIOGROUP_SCHEMA,
        Variant::Datagrid => &DATAGRID_SCHEMA,
        Variant::Tabs => &TABS_SCHEMA,
        Variant::List => &LIST_SCHEMA,
        Variant::Header => &HEADER_SCHEMA,
    }
}
