//! Menu model shared between the host and mods.
//!
//! The core does not draw menus. A [`MenuHandle`] records what mods put into a
//! menu (labelled items with Lua actions, separators, submenus) so the menu
//! host can render it and later activate the chosen item.

use mlua::{AnyUserData, Function, UserData, UserDataFields, UserDataMethods};
use std::sync::{Arc, Mutex};

use crate::error::lock;

#[derive(Debug, Clone)]
pub enum MenuEntry {
    Item {
        label: String,
        action: Option<Function>,
    },
    Line,
    Submenu {
        title: String,
        menu: MenuHandle,
    },
}

#[derive(Debug)]
struct MenuState {
    title: String,
    entries: Vec<MenuEntry>,
}

/// Cheaply cloneable handle; clones edit the same menu.
#[derive(Debug, Clone)]
pub struct MenuHandle(Arc<Mutex<MenuState>>);

impl MenuHandle {
    pub fn new(title: &str) -> Self {
        Self(Arc::new(Mutex::new(MenuState {
            title: title.to_string(),
            entries: Vec::new(),
        })))
    }

    pub fn title(&self) -> String {
        lock(&self.0, "menu").title.clone()
    }

    pub fn add_item(&self, label: &str, action: Option<Function>) {
        lock(&self.0, "menu").entries.push(MenuEntry::Item {
            label: label.to_string(),
            action,
        });
    }

    pub fn add_line(&self) {
        lock(&self.0, "menu").entries.push(MenuEntry::Line);
    }

    pub fn add_submenu(&self, title: &str, menu: MenuHandle) {
        lock(&self.0, "menu").entries.push(MenuEntry::Submenu {
            title: title.to_string(),
            menu,
        });
    }

    pub fn entries(&self) -> Vec<MenuEntry> {
        lock(&self.0, "menu").entries.clone()
    }

    /// Labels of items and submenus, in order; separators are skipped.
    pub fn labels(&self) -> Vec<String> {
        lock(&self.0, "menu")
            .entries
            .iter()
            .filter_map(|entry| match entry {
                MenuEntry::Item { label, .. } => Some(label.clone()),
                MenuEntry::Submenu { title, .. } => Some(title.clone()),
                MenuEntry::Line => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.0, "menu").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the action of the first item labelled `label`.
    ///
    /// Returns `false` when no such item exists or it has no action.
    pub fn activate(&self, label: &str) -> mlua::Result<bool> {
        let action = lock(&self.0, "menu").entries.iter().find_map(|entry| match entry {
            MenuEntry::Item { label: l, action } if l == label => action.clone(),
            _ => None,
        });
        match action {
            Some(action) => {
                action.call::<()>(())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn same_menu(&self, other: &MenuHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl UserData for MenuHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("title", |_, this| Ok(this.title()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method(
            "addItem",
            |_, this, (label, action): (String, Option<Function>)| {
                this.add_item(&label, action);
                Ok(())
            },
        );
        methods.add_method("addLine", |_, this, ()| {
            this.add_line();
            Ok(())
        });
        methods.add_method("addMenu", |_, this, (title, submenu): (String, AnyUserData)| {
            let submenu = submenu.borrow::<MenuHandle>()?.clone();
            this.add_submenu(&title, submenu);
            Ok(())
        });
        methods.add_method("itemCount", |_, this, ()| Ok(this.len()));
        methods.add_method("labels", |_, this, ()| Ok(this.labels()));
    }
}
