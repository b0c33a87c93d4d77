//! Scripted editing sessions
//!
//! A scenario is a TOML list of steps replayed against an [`Editor`]. Nodes
//! created by `drop` steps can be given an alias and referred to later.
//!
//! ```toml
//! [[steps]]
//! action = "drop"
//! variant = "form"
//! as = "signup"
//!
//! [[steps]]
//! action = "drop"
//! variant = "input"
//! into = "signup"
//!
//! [[steps]]
//! action = "set"
//! node = "signup"
//! key = "cols"
//! value = "2"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::drag::DropOutcome;
use crate::editor::{Editor, Key};
use crate::error::EditorError;
use crate::overlay::{GeometryProvider, PointerHit};
use crate::placement::Payload;
use crate::tree::{Direction, Kind, NodeId, SlotName, SlotRef, Variant};

/// Errors that abort a scenario
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("step {step}: unknown node alias '{alias}'")]
    UnknownAlias { step: usize, alias: String },
    #[error("step {step}: {message}")]
    InvalidStep { step: usize, message: String },
    #[error("step {step}: {source}")]
    Editor {
        step: usize,
        #[source]
        source: EditorError,
    },
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Drag a palette item and drop it on `into` (the canvas when absent)
    Drop {
        variant: Variant,
        /// Overrides the variant's own kind, to exercise malformed payloads
        kind: Option<Kind>,
        into: Option<String>,
        slot: Option<SlotName>,
        #[serde(rename = "as")]
        alias: Option<String>,
    },
    /// Drag an existing node onto `into`
    Drag {
        node: String,
        into: Option<String>,
        slot: Option<SlotName>,
    },
    Select {
        node: String,
    },
    SelectParent,
    Delete,
    Move {
        direction: Direction,
    },
    Clear,
    Set {
        node: String,
        key: String,
        value: String,
    },
    Rename {
        node: String,
        name: String,
    },
    Key {
        key: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    /// Replay every step, returning one report line per step
    pub fn run<G: GeometryProvider>(&self, editor: &mut Editor<G>) -> Result<Vec<String>, ScenarioError> {
        let mut runner = Runner {
            editor,
            aliases: HashMap::new(),
        };
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| runner.step(i + 1, step))
            .collect()
    }
}

struct Runner<'e, G: GeometryProvider> {
    editor: &'e mut Editor<G>,
    aliases: HashMap<String, NodeId>,
}

impl<G: GeometryProvider> Runner<'_, G> {
    fn lookup(&self, step: usize, alias: &str) -> Result<NodeId, ScenarioError> {
        self.aliases
            .get(alias)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownAlias {
                step,
                alias: alias.to_string(),
            })
    }

    fn hit(&self, step: usize, into: Option<&str>, slot: Option<SlotName>) -> Result<PointerHit, ScenarioError> {
        match (into, slot) {
            (None, None) => Ok(PointerHit::Canvas),
            (None, Some(_)) => Err(ScenarioError::InvalidStep {
                step,
                message: "'slot' needs 'into'".to_string(),
            }),
            (Some(alias), None) => Ok(PointerHit::Node(self.lookup(step, alias)?)),
            (Some(alias), Some(name)) => Ok(PointerHit::Slot(SlotRef::child(
                self.lookup(step, alias)?,
                name,
            ))),
        }
    }

    /// Alias of a node if it has one, else its display name
    fn label(&self, node: NodeId) -> String {
        self.aliases
            .iter()
            .find(|(_, id)| **id == node)
            .map(|(alias, _)| alias.clone())
            .or_else(|| self.editor.tree().get(node).map(|n| n.name().to_string()))
            .unwrap_or_else(|| node.to_string())
    }

    fn describe_drop(&self, outcome: &DropOutcome) -> String {
        match outcome {
            DropOutcome::Inserted(id) | DropOutcome::Moved(id) => {
                let verb = if matches!(outcome, DropOutcome::Inserted(_)) {
                    "inserted"
                } else {
                    "moved"
                };
                let parent = match self.editor.tree().parent_slot(*id) {
                    Some(SlotRef::Child { owner, name }) => format!("{}.{}", self.label(owner), name),
                    _ => "canvas".to_string(),
                };
                format!("{} {} into {}", verb, self.label(*id), parent)
            }
            DropOutcome::Rejected(reason) => format!("rejected: {}", reason),
            DropOutcome::FactoryFailed(variant) => format!("no component built for {}", variant),
            DropOutcome::NotDragging => "no drag in progress".to_string(),
            DropOutcome::Failed(e) => format!("failed: {}", e),
        }
    }

    fn selection_line(&self) -> String {
        match self.editor.selected_node() {
            Some(node) => format!("selected {}", self.label(node)),
            None => "nothing selected".to_string(),
        }
    }

    fn step(&mut self, index: usize, step: &Step) -> Result<String, ScenarioError> {
        debug!(step = index, ?step, "replaying");
        let line = match step {
            Step::Drop {
                variant,
                kind,
                into,
                slot,
                alias,
            } => {
                let hit = self.hit(index, into.as_deref(), *slot)?;
                let payload = Payload::new(kind.unwrap_or(variant.kind()), *variant);
                self.editor.drag_start(payload);
                self.editor.drag_over_hit(hit);
                let outcome = self.editor.drop_on(hit);
                self.editor.drag_end();
                if let (Some(alias), Some(id)) = (alias, outcome.placed()) {
                    self.aliases.insert(alias.clone(), id);
                }
                format!("drop {}: {}", variant, self.describe_drop(&outcome))
            }
            Step::Drag { node, into, slot } => {
                let id = self.lookup(index, node)?;
                let hit = self.hit(index, into.as_deref(), *slot)?;
                if !self.editor.drag_start_node(id) {
                    format!("drag {}: not draggable", node)
                } else {
                    self.editor.drag_over_hit(hit);
                    let outcome = self.editor.drop_on(hit);
                    self.editor.drag_end();
                    format!("drag {}: {}", node, self.describe_drop(&outcome))
                }
            }
            Step::Select { node } => {
                let id = self.lookup(index, node)?;
                self.editor.select(id);
                format!("select: {}", self.selection_line())
            }
            Step::SelectParent => {
                self.editor.select_parent();
                format!("select-parent: {}", self.selection_line())
            }
            Step::Delete => match self.editor.delete_selected() {
                Some(deletion) => {
                    let mut line = format!("delete: removed {}", self.label(deletion.removed));
                    if deletion.canvas_empty {
                        line.push_str(", canvas empty");
                    }
                    line
                }
                None => "delete: nothing deleted".to_string(),
            },
            Step::Move { direction } => {
                let moved = self.editor.move_selected(*direction);
                let direction = match direction {
                    Direction::Left => "left",
                    Direction::Right => "right",
                };
                format!("move {}: {}", direction, if moved { "moved" } else { "unchanged" })
            }
            Step::Clear => {
                self.editor.clear_selection();
                format!("clear: {}", self.selection_line())
            }
            Step::Set { node, key, value } => {
                let id = self.lookup(index, node)?;
                match self.editor.set_attribute_str(id, key, value) {
                    Ok(()) => {
                        let stored = self
                            .editor
                            .tree()
                            .get(id)
                            .and_then(|n| n.attributes().get(key))
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                        format!("set {}.{} = {}", node, key, stored)
                    }
                    Err(EditorError::Attribute(e)) => format!("set {}.{}: rejected: {}", node, key, e),
                    Err(source) => return Err(ScenarioError::Editor { step: index, source }),
                }
            }
            Step::Rename { node, name } => {
                let id = self.lookup(index, node)?;
                self.editor
                    .rename(id, name.as_str())
                    .map_err(|source| ScenarioError::Editor { step: index, source })?;
                format!("rename {}: {}", node, name)
            }
            Step::Key { key } => {
                let parsed: Key = key.parse().map_err(|message| ScenarioError::InvalidStep {
                    step: index,
                    message,
                })?;
                let handled = self.editor.handle_key(parsed);
                format!(
                    "key {}: {}",
                    key,
                    if handled { self.selection_line() } else { "ignored".to_string() }
                )
            }
        };
        // Let the overlay catch up between steps, as a frame would
        self.editor.animation_frame();
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::from_str(
            r#"
[[steps]]
action = "drop"
variant = "splitter"
as = "split"

[[steps]]
action = "drop"
variant = "card"
into = "split"
slot = "rightPanel"

[[steps]]
action = "select-parent"

[[steps]]
action = "move"
direction = "left"
"#,
        )
        .unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[1],
            Step::Drop {
                variant: Variant::Card,
                kind: None,
                into: Some("split".to_string()),
                slot: Some(SlotName::RightPanel),
                alias: None,
            }
        );
        assert_eq!(scenario.steps[2], Step::SelectParent);
    }

    #[test]
    fn test_unknown_alias_aborts() {
        let scenario = Scenario::from_str(
            r#"
[[steps]]
action = "select"
node = "ghost"
"#,
        )
        .unwrap();
        let mut editor = Editor::new(EditorConfig::default());
        let err = scenario.run(&mut editor).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownAlias { step: 1, .. }));
    }

    #[test]
    fn test_unknown_action_fails_to_parse() {
        let err = Scenario::from_str("[[steps]]\naction = \"explode\"\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }
}
