//! Plain-text outline of the canvas, used by the scenario runner and tests

use std::fmt::Write;

use super::model::NodeTree;
use super::node::{NodeId, SlotRef};

/// Render the placed tree as an indented outline.
///
/// One line per node: `name (variant)`, two spaces of indent per level.
/// Children of multi-slot owners are grouped under a `[slot]` line. The
/// selected node is marked with a leading `*`.
pub fn render_outline(tree: &NodeTree, selected: Option<NodeId>) -> String {
    let mut out = String::new();
    if tree.is_empty() {
        out.push_str("(empty canvas)\n");
        return out;
    }
    for root in tree.roots() {
        write_node(tree, *root, 0, selected, &mut out);
    }
    out
}

fn write_node(tree: &NodeTree, id: NodeId, depth: usize, selected: Option<NodeId>, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let marker = if selected == Some(id) { "*" } else { "" };
    let lock = if node.is_locked() { " [locked]" } else { "" };
    let _ = writeln!(
        out,
        "{}{}{} ({}){}",
        "  ".repeat(depth),
        marker,
        node.name(),
        node.variant(),
        lock
    );

    let slots: Vec<_> = node.slot_names().collect();
    let labelled = slots.len() > 1;
    for name in slots {
        let children = tree
            .slot_children(SlotRef::child(id, name))
            .unwrap_or_default();
        let depth = if labelled {
            let _ = writeln!(out, "{}[{}]", "  ".repeat(depth + 1), name);
            depth + 2
        } else {
            depth + 1
        };
        for child in children {
            write_node(tree, *child, depth, selected, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Kind, SlotName, Variant};

    #[test]
    fn test_outline_marks_selection() {
        let mut tree = NodeTree::new();
        let form = tree.create_node(Kind::Container, Variant::Form);
        tree.insert(SlotRef::Root, form, 0).unwrap();
        let input = tree.create_node(Kind::Component, Variant::Input);
        tree.insert(SlotRef::child(form, SlotName::Children), input, 0)
            .unwrap();

        let text = render_outline(&tree, Some(input));
        assert_eq!(text, "form (form)\n  *Input (input)\n");
    }

    #[test]
    fn test_outline_of_empty_canvas() {
        assert_eq!(render_outline(&NodeTree::new(), None), "(empty canvas)\n");
    }
}
