//! Markup parse/render capability consumed by the document pipeline.
use std::collections::VecDeque;
use std::io::{self, Write};

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to parse document: {0}")]
    Parse(String),
    #[error("failed to render document: {0}")]
    Render(#[from] io::Error),
}

/// Turns text into a mutable document tree and back.
///
/// Implementations must keep element, attribute, text and comment structure
/// and sibling order intact across a parse/render round trip.
pub trait MarkupCodec {
    fn parse(&self, text: &str) -> Result<RcDom, CodecError>;
    fn render(&self, dom: &RcDom, out: &mut dyn Write) -> Result<(), CodecError>;
}

/// HTML5 codec backed by html5ever and its reference-counted DOM.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html5everCodec;

impl MarkupCodec for Html5everCodec {
    fn parse(&self, text: &str) -> Result<RcDom, CodecError> {
        // HTML5 parsing recovers from every syntax error, so this cannot fail.
        Ok(parse_document(RcDom::default(), ParseOpts::default()).one(text))
    }

    fn render(&self, dom: &RcDom, out: &mut dyn Write) -> Result<(), CodecError> {
        serialize(out, &Renderable(dom.document.clone()), SerializeOpts::default())?;
        Ok(())
    }
}

/// Serializable view of an rcdom subtree that also emits `<template>` contents,
/// which the parser keeps in a separate fragment instead of the child list.
struct Renderable(Handle);

enum RenderOp {
    Open(Handle),
    Close(QualName),
}

impl Serialize for Renderable {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut ops = VecDeque::new();
        match traversal_scope {
            TraversalScope::IncludeNode => ops.push_back(RenderOp::Open(self.0.clone())),
            TraversalScope::ChildrenOnly(_) => ops.extend(child_ops(&self.0)),
        }

        while let Some(op) = ops.pop_front() {
            let handle = match op {
                RenderOp::Open(handle) => handle,
                RenderOp::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
            };
            match &handle.data {
                NodeData::Element {
                    name,
                    attrs,
                    template_contents,
                    ..
                } => {
                    serializer.start_elem(
                        name.clone(),
                        attrs.borrow().iter().map(|attr| (&attr.name, &attr.value[..])),
                    )?;
                    ops.push_front(RenderOp::Close(name.clone()));
                    for op in child_ops(&handle).into_iter().rev() {
                        ops.push_front(op);
                    }
                    if let Some(contents) = template_contents.borrow().as_ref() {
                        for op in child_ops(contents).into_iter().rev() {
                            ops.push_front(op);
                        }
                    }
                }
                NodeData::Doctype { name, .. } => serializer.write_doctype(name)?,
                NodeData::Text { contents } => serializer.write_text(&contents.borrow())?,
                NodeData::Comment { contents } => serializer.write_comment(contents)?,
                NodeData::ProcessingInstruction { target, contents } => {
                    serializer.write_processing_instruction(target, contents)?
                }
                NodeData::Document => {
                    for op in child_ops(&handle).into_iter().rev() {
                        ops.push_front(op);
                    }
                }
            }
        }
        Ok(())
    }
}

fn child_ops(node: &Handle) -> Vec<RenderOp> {
    node.children
        .borrow()
        .iter()
        .map(|child| RenderOp::Open(child.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(html: &str) -> String {
        let codec = Html5everCodec;
        let dom = codec.parse(html).unwrap();
        let mut out = Vec::new();
        codec.render(&dom, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn round_trip_keeps_structure_and_order() {
        let html = "<!DOCTYPE html><html><head><title>t</title></head><body><!-- c --><p id=\"a\" class=\"b\" data-x=\"1\">one</p><p>two</p></body></html>";
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn template_contents_are_rendered() {
        let html = "<html><head><template><img src=\"https://h.test/t.avif\"><p>inner</p></template></head><body></body></html>";
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn rendering_is_stable_after_first_pass() {
        let once = round_trip("<p>unclosed<img src=x.png>");
        assert_eq!(round_trip(&once), once);
    }
}
