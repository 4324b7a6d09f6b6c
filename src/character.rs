use std::fmt;

use indexmap::IndexMap;

use crate::separator;
use crate::tree::{TreeChild, TreeNode};
use crate::word::WordId;

slotmap::new_key_type! {
    pub struct CharId;
}

/// A single character of text together with its formatting flags.
///
/// `value == None` is the terminator: an empty placeholder that keeps an
/// otherwise empty Word alive (the last Word of a Document always ends with
/// one).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Character {
    value: Option<char>,
    props: IndexMap<String, bool>,
    pub(crate) parent: Option<WordId>,
}

impl Character {
    pub fn new(value: char) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn terminator() -> Self {
        Self::default()
    }

    pub fn with_props<I, S>(value: Option<char>, props: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Self {
            value,
            props: props
                .into_iter()
                .map(|(name, enabled)| (name.into(), enabled))
                .collect(),
            parent: None,
        }
    }

    pub fn value(&self) -> Option<char> {
        self.value
    }

    pub fn parent(&self) -> Option<WordId> {
        self.parent
    }

    pub fn is_terminator(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_newline(&self) -> bool {
        self.value.is_some_and(separator::is_newline)
    }

    pub fn is_space(&self) -> bool {
        self.value.is_some_and(separator::is_space)
    }

    pub fn is_separator(&self) -> bool {
        self.value.is_some_and(separator::is_separator)
    }

    pub fn prop(&self, name: &str) -> bool {
        self.props.get(name).copied().unwrap_or(false)
    }

    pub fn set_prop(&mut self, name: &str, enabled: bool) {
        match self.props.get_mut(name) {
            Some(slot) => *slot = enabled,
            None => {
                self.props.insert(name.to_string(), enabled);
            }
        }
    }

    /// Names of the properties currently switched on, in the order they were
    /// first set.
    pub fn get_props(&self) -> Vec<&str> {
        self.props
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.push_html(&mut out);
        out
    }

    pub(crate) fn push_html(&self, out: &mut String) {
        match self.value {
            Some('&') => out.push_str("&amp;"),
            Some('<') => out.push_str("&lt;"),
            Some('>') => out.push_str("&gt;"),
            Some('"') => out.push_str("&quot;"),
            Some(ch) => out.push(ch),
            None => {}
        }
    }

    pub fn to_tree(&self, id: &str) -> TreeNode {
        let name = if self.is_newline() {
            "\\n".to_string()
        } else if self.is_space() {
            "[ ]".to_string()
        } else {
            self.to_string()
        };
        TreeNode::new(format!("c{id}"), name).with_children(
            self.get_props()
                .into_iter()
                .map(|prop| TreeChild::Prop(prop.to_string()))
                .collect(),
        )
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(ch) => write!(f, "{ch}"),
            None => Ok(()),
        }
    }
}
