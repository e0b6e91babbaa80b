// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The structural element tree the drum machine renders into.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::pads::Pad;

/// The id of the outer container.
pub const CONTAINER_ID: &str = "drum-machine";
/// The id of the display element.
pub const DISPLAY_ID: &str = "display";
/// The class of each pad element.
pub const PAD_CLASS: &str = "drum-pad";
/// The class of each clip element.
pub const CLIP_CLASS: &str = "clip";
/// The attribute holding a clip's locator.
pub const SRC_ATTR: &str = "src";

/// The number of pad columns in the grid.
const GRID_COLUMNS: usize = 3;

/// A node in the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    classes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

impl Element {
    /// Creates an empty element with the given tag.
    pub fn new(tag: &str) -> Element {
        Element {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Element {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Element {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Element {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Element {
        self.text = text.to_string();
        self
    }

    pub fn with_child(mut self, child: Element) -> Element {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Returns true if the element carries the given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Returns the first direct child with the given class.
    pub fn child_by_class(&self, class: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.has_class(class))
    }

    /// Depth-first search for the element with the given id, including this one.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_id(id))
    }

    /// Mutable variant of [`Element::find_by_id`].
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_by_id_mut(id))
    }

    /// Returns every descendant carrying the given class, in document order.
    pub fn find_all_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_by_class(class, &mut found);
        found
    }

    fn collect_by_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        for child in self.children.iter() {
            if child.has_class(class) {
                found.push(child);
            }
            child.collect_by_class(class, found);
        }
    }

    /// Detaches the descendant with the given id and returns it.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Element> {
        if let Some(index) = self.children.iter().position(|c| c.id() == Some(id)) {
            return Some(self.children.remove(index));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.remove_by_id(id))
    }
}

/// Renders the drum machine for the given pads and display text.
pub fn render(pads: &[Pad], display: &str) -> Element {
    pads.iter().fold(
        Element::new("article")
            .with_id(CONTAINER_ID)
            .with_child(Element::new("div").with_id(DISPLAY_ID).with_text(display)),
        |container, pad| container.with_child(render_pad(pad)),
    )
}

fn render_pad(pad: &Pad) -> Element {
    let key = pad.key_str();
    Element::new("button")
        .with_id(pad.id())
        .with_class(PAD_CLASS)
        .with_text(&key)
        .with_child(
            Element::new("audio")
                .with_id(&key)
                .with_class(CLIP_CLASS)
                .with_attribute(SRC_ATTR, pad.clip()),
        )
}

/// Draws the display line and a grid of pad keys.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display = self.find_by_id(DISPLAY_ID).map_or("", Element::text);
        writeln!(f, "[ {:^17} ]", display)?;

        let pads = self.find_all_by_class(PAD_CLASS);
        for row in pads.chunks(GRID_COLUMNS) {
            let line = row
                .iter()
                .map(|pad| format!("( {} )", pad.text()))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}
