//! Built-in component constructors

use crate::tree::{keys, ButtonStyle, Kind, LayoutMode, SlotName, Variant};

use super::registry::{Blueprint, ComponentFactory, FactoryError};

const PANEL_TITLES: [(SlotName, &str); 2] = [
    (SlotName::LeftPanel, "Left Panel"),
    (SlotName::RightPanel, "Right Panel"),
];

/// Icon used for icon-style actions that have none set
pub const DEFAULT_ACTION_ICON: &str = "more";

/// Register constructors for all twelve variants
pub fn register_builtins(factory: &mut ComponentFactory) {
    factory.register(Variant::Section, |f| {
        let d = f.defaults();
        Ok(grid_container(Variant::Section, d.section_cols, &d.section_title))
    });
    factory.register(Variant::Form, |f| {
        let d = f.defaults();
        Ok(grid_container(Variant::Form, d.form_cols, &d.form_title))
    });
    factory.register(Variant::Card, |f| {
        let d = f.defaults();
        Ok(Blueprint::new(Variant::Card)
            .with_attr(keys::LAYOUT, LayoutMode::Grid)
            .with_attr(keys::COLS, d.card_cols)
            .with_attr(keys::TITLE, d.card_title.as_str()))
    });
    factory.register(Variant::Splitter, splitter);
    factory.register(Variant::Header, |f| {
        let actions = [
            ("Export", ButtonStyle::Primary, None),
            ("Print", ButtonStyle::Icon, Some("print")),
            ("More", ButtonStyle::Icon, Some(DEFAULT_ACTION_ICON)),
        ];
        let mut header = Blueprint::new(Variant::Header)
            .with_attr(keys::TITLE, f.defaults().header_title.as_str());
        for (label, style, icon) in actions {
            let mut button = Blueprint::new(Variant::Button)
                .named(label)
                .with_attr(keys::LABEL, label)
                .with_attr(keys::BTN_STYLE, style);
            if let Some(icon) = icon {
                button = button.with_attr(keys::ICON, icon);
            }
            header = header.with_child(SlotName::Actions, button);
        }
        Ok(header)
    });
    factory.register(Variant::Button, |f| {
        let label = f.defaults().button_label.as_str();
        Ok(Blueprint::new(Variant::Button)
            .named(label)
            .with_attr(keys::LABEL, label)
            .with_attr(keys::BTN_STYLE, ButtonStyle::Primary))
    });
    factory.register(Variant::Input, |_| {
        Ok(Blueprint::new(Variant::Input)
            .with_attr(keys::LABEL, "Input")
            .with_attr(keys::PLACEHOLDER, "Enter value"))
    });
    factory.register(Variant::Text, |_| {
        Ok(Blueprint::new(Variant::Text).with_attr(keys::CONTENT, "Sample text"))
    });
    factory.register(Variant::RadioGroup, |_| {
        Ok(Blueprint::new(Variant::RadioGroup).with_attr(keys::LABEL, "Radio Group"))
    });
    factory.register(Variant::Datagrid, |_| {
        Ok(Blueprint::new(Variant::Datagrid).with_attr(keys::TITLE, "Datagrid"))
    });
    factory.register(Variant::Tabs, |_| Ok(Blueprint::new(Variant::Tabs)));
    factory.register(Variant::List, |_| Ok(Blueprint::new(Variant::List)));
}

fn grid_container(variant: Variant, cols: u32, title: &str) -> Blueprint {
    Blueprint::new(variant)
        .with_attr(keys::LAYOUT, LayoutMode::Grid)
        .with_attr(keys::COLS, cols)
        .with_attr(keys::TITLE, title)
        .with_attr(keys::TITLE_VISIBLE, false)
}

/// Both panels are seeded with a locked section built by the registered
/// section constructor, so a splitter cannot exist without one.
fn splitter(factory: &ComponentFactory) -> Result<Blueprint, FactoryError> {
    let mut splitter = Blueprint::new(Variant::Splitter);
    for (slot, title) in PANEL_TITLES {
        let panel = factory
            .try_create(Kind::Container, Variant::Section)
            .map_err(|e| FactoryError::construction(Variant::Splitter, format!("panel section: {}", e)))?
            .named(title)
            .with_attr(keys::TITLE, title)
            .with_attr(keys::TITLE_VISIBLE, true)
            .locked();
        splitter = splitter.with_child(slot, panel);
    }
    Ok(splitter)
}

/// Normalize a header's action buttons after construction: the first is
/// primary, the second and third are icon buttons, and icon buttons
/// without an icon get the default one.
pub fn style_header_actions(header: &mut Blueprint) {
    let Some(actions) = header.slot_mut(SlotName::Actions) else {
        return;
    };
    for (index, button) in actions.iter_mut().enumerate() {
        match index {
            0 => {
                button.attributes.insert(keys::BTN_STYLE, ButtonStyle::Primary.into());
            }
            1 | 2 => {
                button.attributes.insert(keys::BTN_STYLE, ButtonStyle::Icon.into());
            }
            _ => {}
        }
        if button.attributes.button_style() == Some(ButtonStyle::Icon)
            && button.attributes.get_str(keys::ICON).is_none()
        {
            button.attributes.insert(keys::ICON, DEFAULT_ACTION_ICON.into());
        }
    }
}
