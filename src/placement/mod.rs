//! Placement constraint validation

mod rules;

pub use rules::{
    can_accept_at_root, check_slot, resolve_drop_target, resolve_slot, DropTarget, Payload,
    Rejection, Resolution,
};
