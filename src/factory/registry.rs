//! Component registry mapping variants to constructors

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::ComponentDefaults;
use crate::error::{AttrError, EditorError};
use crate::tree::{schema_for, AttrValue, Attributes, Kind, NodeId, NodeTree, SlotName, Variant};

/// Errors that can occur while building a component
#[derive(Debug, Error)]
pub enum FactoryError {
    /// No constructor registered for the variant
    #[error("unknown variant: {0}")]
    UnknownVariant(Variant),

    /// Payload kind does not match the variant
    #[error("{variant} is a {expected}, not a {found}")]
    KindMismatch {
        variant: Variant,
        expected: Kind,
        found: Kind,
    },

    /// Blueprint fills a slot the variant does not expose
    #[error("{variant} has no slot '{slot}'")]
    MissingSlot { variant: Variant, slot: SlotName },

    /// Constructor failed
    #[error("failed to construct {variant}: {reason}")]
    Construction { variant: Variant, reason: String },
}

impl FactoryError {
    pub fn construction(variant: Variant, reason: impl Into<String>) -> Self {
        Self::Construction {
            variant,
            reason: reason.into(),
        }
    }
}

/// A detached description of a node and its seeded subtree.
///
/// Constructors produce blueprints; a blueprint only becomes part of the
/// tree through [`Blueprint::instantiate`], which builds the whole subtree
/// detached so that insertion stays a single tree mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub kind: Kind,
    pub variant: Variant,
    pub name: String,
    pub attributes: Attributes,
    pub locked: bool,
    pub slots: Vec<(SlotName, Vec<Blueprint>)>,
}

impl Blueprint {
    pub fn new(variant: Variant) -> Self {
        Self {
            kind: variant.kind(),
            variant,
            name: variant.default_name().to_string(),
            attributes: Attributes::new(),
            locked: false,
            slots: variant.slots().iter().map(|s| (*s, Vec::new())).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set an attribute; checked against the schema by [`Blueprint::validate`]
    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn with_child(mut self, slot: SlotName, child: Blueprint) -> Self {
        match self.slots.iter_mut().find(|(n, _)| *n == slot) {
            Some((_, children)) => children.push(child),
            None => self.slots.push((slot, vec![child])),
        }
        self
    }

    pub fn slot(&self, name: SlotName) -> Option<&[Blueprint]> {
        self.slots
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c.as_slice())
    }

    pub fn slot_mut(&mut self, name: SlotName) -> Option<&mut Vec<Blueprint>> {
        self.slots
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    /// Check slots and attributes of the whole blueprint
    pub fn validate(&self) -> Result<(), FactoryError> {
        if self.kind != self.variant.kind() {
            return Err(FactoryError::KindMismatch {
                variant: self.variant,
                expected: self.variant.kind(),
                found: self.kind,
            });
        }
        let schema = schema_for(self.variant);
        for (key, value) in self.attributes.iter() {
            schema
                .validate(key, value)
                .map_err(|e: AttrError| FactoryError::construction(self.variant, e.to_string()))?;
        }
        for (slot, children) in &self.slots {
            if !self.variant.slots().contains(slot) {
                return Err(FactoryError::MissingSlot {
                    variant: self.variant,
                    slot: *slot,
                });
            }
            for child in children {
                child.validate()?;
            }
        }
        Ok(())
    }

    /// Build the subtree in `tree`, detached, and return its root
    pub fn instantiate(self, tree: &mut NodeTree) -> Result<NodeId, EditorError> {
        let id = tree.create_node(self.kind, self.variant);
        {
            let node = tree.node_mut(id)?;
            node.name = self.name;
            node.attributes = self.attributes;
            node.locked = self.locked;
        }
        for (slot, children) in self.slots {
            for child in children {
                let attached = child
                    .instantiate(tree)
                    .and_then(|child_id| match tree.adopt(id, slot, child_id) {
                        Ok(()) => Ok(()),
                        Err(e) => {
                            tree.discard(child_id);
                            Err(e)
                        }
                    });
                if let Err(e) = attached {
                    tree.discard(id);
                    return Err(e);
                }
            }
        }
        Ok(id)
    }
}

/// Builds the blueprint for one variant
pub type Constructor = Box<dyn Fn(&ComponentFactory) -> Result<Blueprint, FactoryError>>;

/// Registry of component constructors.
///
/// One instance is built at startup and passed by reference to whatever
/// needs to create nodes; tests build their own.
pub struct ComponentFactory {
    constructors: HashMap<Variant, Constructor>,
    defaults: ComponentDefaults,
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("variants", &self.registered_variants())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Default for ComponentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::with_defaults(ComponentDefaults::default())
    }

    /// Create an empty factory whose constructors read `defaults`
    pub fn with_defaults(defaults: ComponentDefaults) -> Self {
        Self {
            constructors: HashMap::new(),
            defaults,
        }
    }

    /// Create a factory with every built-in variant registered
    pub fn with_builtins(defaults: ComponentDefaults) -> Self {
        let mut factory = Self::with_defaults(defaults);
        super::templates::register_builtins(&mut factory);
        factory
    }

    pub fn defaults(&self) -> &ComponentDefaults {
        &self.defaults
    }

    /// Register a constructor, replacing any previous one for the variant
    pub fn register<F>(&mut self, variant: Variant, constructor: F) -> bool
    where
        F: Fn(&ComponentFactory) -> Result<Blueprint, FactoryError> + 'static,
    {
        let replaced = self
            .constructors
            .insert(variant, Box::new(constructor))
            .is_some();
        debug!(%variant, replaced, "registered constructor");
        replaced
    }

    pub fn unregister(&mut self, variant: Variant) -> bool {
        self.constructors.remove(&variant).is_some()
    }

    pub fn is_registered(&self, variant: Variant) -> bool {
        self.constructors.contains_key(&variant)
    }

    /// Registered variants in palette order
    pub fn registered_variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.is_registered(*v))
            .collect()
    }

    pub fn variants_by_kind(&self, kind: Kind) -> Vec<Variant> {
        self.registered_variants()
            .into_iter()
            .filter(|v| v.kind() == kind)
            .collect()
    }

    /// Build a validated blueprint for `(kind, variant)`
    pub fn try_create(&self, kind: Kind, variant: Variant) -> Result<Blueprint, FactoryError> {
        let constructor = self
            .constructors
            .get(&variant)
            .ok_or(FactoryError::UnknownVariant(variant))?;
        if kind != variant.kind() {
            return Err(FactoryError::KindMismatch {
                variant,
                expected: variant.kind(),
                found: kind,
            });
        }
        let blueprint = constructor(self)?;
        if blueprint.variant != variant {
            return Err(FactoryError::construction(
                variant,
                format!("constructor produced a {}", blueprint.variant),
            ));
        }
        blueprint.validate()?;
        Ok(blueprint)
    }

    /// Build a blueprint, or `None` when the variant is unknown or its
    /// constructor fails. Callers treat `None` as a no-op drop.
    pub fn create(&self, kind: Kind, variant: Variant) -> Option<Blueprint> {
        match self.try_create(kind, variant) {
            Ok(blueprint) => Some(blueprint),
            Err(e @ FactoryError::UnknownVariant(_)) => {
                warn!(error = %e, "no constructor for dropped component");
                None
            }
            Err(e) => {
                error!(error = %e, "component construction failed");
                None
            }
        }
    }
}
