use k2e_sexpr::{Item, Node};

use crate::error::ConvertError;
use crate::js::escape_template;
use crate::nets::NetNamer;
use crate::rules::{self, Disposition};

/// Kinds of the nodes enclosing the one being written, root first.
///
/// Each link lives on the stack frame of the visit that created it, so descending
/// never mutates the parent's chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ancestry<'a> {
    head: Option<&'a Link<'a>>,
}

#[derive(Debug)]
pub struct Link<'a> {
    kind: &'a str,
    parent: Ancestry<'a>,
}

impl<'a> Link<'a> {
    pub fn new(kind: &'a str, parent: Ancestry<'a>) -> Self {
        Self { kind, parent }
    }
}

impl<'a> Ancestry<'a> {
    #[must_use]
    pub fn root() -> Self {
        Self { head: None }
    }

    #[must_use]
    pub fn with(link: &'a Link<'a>) -> Self {
        Self { head: Some(link) }
    }

    /// Kind of the direct parent.
    #[must_use]
    pub fn parent(&self) -> Option<&'a str> {
        self.head.map(|link| link.kind)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        let mut kinds = Vec::new();
        let mut cursor = self.head;
        while let Some(link) = cursor {
            kinds.push(link.kind.to_string());
            cursor = link.parent.head;
        }
        kinds.reverse();
        kinds
    }
}

/// State for writing one node: the node, where it sits, the run's namer and the sink.
pub struct WriterContext<'a> {
    pub node: &'a Node,
    pub ancestry: Ancestry<'a>,
    namer: &'a mut NetNamer,
    out: &'a mut String,
}

impl<'a> WriterContext<'a> {
    pub fn new(
        node: &'a Node,
        ancestry: Ancestry<'a>,
        namer: &'a mut NetNamer,
        out: &'a mut String,
    ) -> Self {
        Self {
            node,
            ancestry,
            namer,
            out,
        }
    }

    /// Appends generated template text as-is.
    pub fn push_raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Appends source text, escaped so it stays literal inside the template.
    pub fn push_literal(&mut self, text: &str) {
        self.out.push_str(&escape_template(text));
    }

    pub fn net_name(&mut self, pad: &str) -> String {
        self.namer.net_name(pad)
    }

    /// Writes each item preceded by a space. Children whose rule drops them leave no
    /// separator behind.
    pub fn write_items(&mut self, items: &[Item]) -> Result<(), ConvertError> {
        for item in items {
            match item {
                Item::Atom(atom) => {
                    self.push_raw(" ");
                    self.push_literal(atom);
                }
                Item::Node(node) => self.write_child(node, " ")?,
            }
        }
        Ok(())
    }

    /// Dispatches `node` as a child of the current node.
    pub fn write_child(&mut self, node: &Node, separator: &str) -> Result<(), ConvertError> {
        let link = Link::new(&self.node.kind, self.ancestry);
        let mut child = WriterContext {
            node,
            ancestry: Ancestry::with(&link),
            namer: &mut *self.namer,
            out: &mut *self.out,
        };
        let rule = rules::select(&child)?;
        if rule.disposition == Disposition::Skip {
            return Ok(());
        }
        child.push_raw(separator);
        (rule.write)(&mut child)
    }
}
