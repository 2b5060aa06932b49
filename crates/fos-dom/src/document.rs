//! Document - High-level document API

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new document with an `<html><head/><body/></html>` skeleton
    pub fn new() -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes cannot violate hierarchy rules
        let _ = tree.append_child(NodeId::ROOT, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            html_element: html,
            body_element: body,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty() -> Self {
        Self {
            tree: DomTree::new(),
            html_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Get <html> element
    pub fn document_element(&self) -> Option<NodeId> {
        self.html_element.some()
    }

    /// Get <body> element
    pub fn body(&self) -> Option<NodeId> {
        self.body_element.some()
    }

    /// Whether `node` is currently reachable from the document root
    pub fn is_in_document(&self, node: NodeId) -> bool {
        node == NodeId::ROOT
            || (self.tree.get(node).is_some() && self.tree.is_ancestor(NodeId::ROOT, node))
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        assert!(doc.is_in_document(body));
        assert_eq!(doc.tree().parent(body), doc.document_element());
    }

    #[test]
    fn test_is_in_document_tracks_insertion() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let div = doc.tree_mut().create_element("div");
        let span = doc.tree_mut().create_element("span");
        doc.tree_mut().append_child(div, span).unwrap();
        assert!(!doc.is_in_document(span));

        doc.tree_mut().append_child(body, div).unwrap();
        assert!(doc.is_in_document(span));

        doc.tree_mut().remove_child(body, div).unwrap();
        assert!(!doc.is_in_document(div));
    }

    #[test]
    fn test_empty_document_has_no_body() {
        let doc = Document::empty();
        assert!(doc.body().is_none());
        assert!(doc.tree().is_empty());
    }
}
