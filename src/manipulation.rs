use crate::document::{Document, Node};
use crate::error::Error;
use crate::xmlvalue::{AttributeData, Value, ValueType};

/// ## Manipulation
///
/// Every live node is either part of the tree under the document node, or
/// unlinked. Inserting a node that already has a parent moves it; inserting
/// an unlinked node links it. Deleting a node releases it and all of its
/// descendants.
impl Document {
    pub(crate) fn check_node(&self, node: Node) -> Result<(), Error> {
        if node.document != self.id {
            return Err(Error::WrongDocument);
        }
        if self.try_data(node).is_none() {
            return Err(Error::Removed);
        }
        Ok(())
    }

    fn check_element(&self, node: Node) -> Result<(), Error> {
        self.check_node(node)?;
        if !self.is_element(node) {
            return Err(Error::NotAnElement);
        }
        Ok(())
    }

    fn check_insert(&self, parent: Node, child: Node) -> Result<(), Error> {
        self.check_node(parent)?;
        self.check_node(child)?;
        if !matches!(
            self.value_type(parent),
            ValueType::Document | ValueType::Element
        ) {
            return Err(Error::InvalidOperation(
                "children can only be added to the document or an element".into(),
            ));
        }
        if self.is_document(child) {
            return Err(Error::InvalidOperation(
                "the document node cannot be inserted".into(),
            ));
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(Error::InvalidOperation(
                "a node cannot be inserted below itself".into(),
            ));
        }
        Ok(())
    }

    /// Take a node out of its parent's child list. Unlinked nodes become
    /// part of the structure they are about to be linked into.
    fn detach(&mut self, node: Node) {
        let data = self.data_mut(node);
        let Some(parent) = data.parent.take() else {
            self.mark_in_use(node);
            return;
        };
        let prev = data.prev.take();
        let next = data.next.take();
        match prev {
            Some(prev) => self.data_mut(prev).next = next,
            None => self.data_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.data_mut(next).prev = prev,
            None => self.data_mut(parent).last_child = prev,
        }
    }

    /// Link a detached node into `parent` after `after`, or as the first
    /// child.
    fn link(&mut self, parent: Node, after: Option<Node>, child: Node) {
        let next = match after {
            Some(after) => self.data(after).next,
            None => self.data(parent).first_child,
        };
        let data = self.data_mut(child);
        data.parent = Some(parent);
        data.prev = after;
        data.next = next;
        match after {
            Some(after) => self.data_mut(after).next = Some(child),
            None => self.data_mut(parent).first_child = Some(child),
        }
        match next {
            Some(next) => self.data_mut(next).prev = Some(child),
            None => self.data_mut(parent).last_child = Some(child),
        }
    }

    /// Append a fresh node created by this crate.
    pub(crate) fn append_unchecked(&mut self, parent: Node, child: Node) {
        self.detach(child);
        let last = self.last_child(parent);
        self.link(parent, last, child);
    }

    /// Add a child to the end of the children of `parent`.
    ///
    /// Returns the inserted node.
    ///
    /// ```rust
    /// let mut doc = tinydom::parse("<p><a/></p>").unwrap();
    /// let p = doc.root_element().unwrap();
    /// let b = doc.new_element("b");
    /// doc.insert_end_child(p, b).unwrap();
    /// assert_eq!(doc.print(true), "<p><a/><b/></p>");
    /// ```
    pub fn insert_end_child(&mut self, parent: Node, child: Node) -> Result<Node, Error> {
        self.check_insert(parent, child)?;
        self.detach(child);
        let last = self.last_child(parent);
        self.link(parent, last, child);
        Ok(child)
    }

    /// Add a child to the beginning of the children of `parent`.
    pub fn insert_first_child(&mut self, parent: Node, child: Node) -> Result<Node, Error> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.link(parent, None, child);
        Ok(child)
    }

    /// Add a child after `after`, which must be a child of `parent`.
    ///
    /// Returns [`Error::NotAChild`] if it isn't.
    pub fn insert_after_child(
        &mut self,
        parent: Node,
        after: Node,
        child: Node,
    ) -> Result<Node, Error> {
        self.check_insert(parent, child)?;
        self.check_node(after)?;
        if self.parent(after) != Some(parent) {
            return Err(Error::NotAChild);
        }
        if after == child {
            return Ok(child);
        }
        self.detach(child);
        self.link(parent, Some(after), child);
        Ok(child)
    }

    /// Take a node (and its descendants) out of the tree without deleting
    /// it. It can be inserted again later.
    pub fn unlink(&mut self, node: Node) -> Result<(), Error> {
        self.check_node(node)?;
        if self.is_document(node) {
            return Err(Error::InvalidOperation(
                "the document node cannot be unlinked".into(),
            ));
        }
        if self.parent(node).is_some() {
            self.detach(node);
            self.mark_unlinked(node);
        }
        Ok(())
    }

    /// Delete a child of `parent` and all of its descendants.
    pub fn delete_child(&mut self, parent: Node, child: Node) -> Result<(), Error> {
        self.check_node(parent)?;
        self.check_node(child)?;
        if self.parent(child) != Some(parent) {
            return Err(Error::NotAChild);
        }
        self.detach(child);
        self.free_subtree(child);
        Ok(())
    }

    /// Delete all children of a node.
    pub fn delete_children(&mut self, node: Node) -> Result<(), Error> {
        self.check_node(node)?;
        self.free_children(node);
        Ok(())
    }

    pub(crate) fn free_children(&mut self, node: Node) {
        while let Some(child) = self.first_child(node) {
            self.detach(child);
            self.free_subtree(child);
        }
    }

    /// Delete a node and its descendants, whether it is linked or not.
    ///
    /// ```rust
    /// let mut doc = tinydom::parse("<p><a/>text</p>").unwrap();
    /// let p = doc.root_element().unwrap();
    /// let a = doc.first_child(p).unwrap();
    /// doc.delete_node(a).unwrap();
    /// assert_eq!(doc.print(true), "<p>text</p>");
    /// assert!(doc.is_removed(a));
    /// ```
    pub fn delete_node(&mut self, node: Node) -> Result<(), Error> {
        self.check_node(node)?;
        if self.is_document(node) {
            return Err(Error::InvalidOperation(
                "the document node cannot be deleted".into(),
            ));
        }
        if self.parent(node).is_some() {
            self.detach(node);
        }
        self.free_subtree(node);
        Ok(())
    }

    /// Replace the value of a node: the name of an element, the text of the
    /// other kinds. The new value is taken literally.
    pub fn set_value(&mut self, node: Node, value: &str) -> Result<(), Error> {
        self.check_node(node)?;
        match self.data_mut(node).value.span_mut() {
            Some(span) => {
                span.set_owned(value);
                Ok(())
            }
            None => Err(Error::InvalidOperation(
                "the document node has no value".into(),
            )),
        }
    }

    /// Mark a text node as CDATA, or as plain text.
    pub fn set_cdata(&mut self, node: Node, cdata: bool) -> Result<(), Error> {
        self.check_node(node)?;
        match &mut self.data_mut(node).value {
            Value::Text(text) => {
                text.cdata = cdata;
                Ok(())
            }
            _ => Err(Error::InvalidOperation("not a text node".into())),
        }
    }

    /// Attach opaque data to a node.
    pub fn set_user_data(&mut self, node: Node, user_data: Option<usize>) -> Result<(), Error> {
        self.check_node(node)?;
        self.data_mut(node).user_data = user_data;
        Ok(())
    }

    /// Append an attribute without looking for an existing one.
    pub(crate) fn push_attribute(&mut self, node: Node, name: &str, value: &str) {
        let mut attribute = AttributeData::new(0);
        attribute.name.set_owned(name);
        attribute.value.set_owned(value);
        let id = self.attribute_pool.alloc(attribute);
        self.attribute_pool.set_tracked();

        let mut last = None;
        let mut current = self.first_attribute_id(node);
        while let Some(existing) = current {
            last = Some(existing);
            current = self.attribute_data(existing).next;
        }
        match last {
            Some(last) => self.attribute_pool[last].next = Some(id),
            None => {
                if let Value::Element(element) = &mut self.data_mut(node).value {
                    element.first_attribute = Some(id);
                }
            }
        }
    }

    /// Set an attribute on an element. An existing attribute keeps its
    /// position, a new one is added at the end.
    ///
    /// ```rust
    /// let mut doc = tinydom::parse(r#"<p a="1" b="2"/>"#).unwrap();
    /// let p = doc.root_element().unwrap();
    /// doc.set_attribute(p, "a", "3").unwrap();
    /// doc.set_attribute(p, "c", "4").unwrap();
    /// assert_eq!(doc.print(true), r#"<p a="3" b="2" c="4"/>"#);
    /// ```
    pub fn set_attribute(&mut self, node: Node, name: &str, value: &str) -> Result<(), Error> {
        self.check_element(node)?;
        match self.find_attribute(node, name) {
            Some(id) => self.attribute_pool[id].value.set_owned(value),
            None => self.push_attribute(node, name, value),
        }
        Ok(())
    }

    /// Remove an attribute from an element. Nothing happens if there is no
    /// such attribute.
    pub fn delete_attribute(&mut self, node: Node, name: &str) -> Result<(), Error> {
        self.check_element(node)?;
        let mut prev = None;
        let mut current = self.first_attribute_id(node);
        while let Some(id) = current {
            let next = self.attribute_data(id).next;
            if self.attribute_data(id).name.get(&self.buffer) == name {
                match prev {
                    Some(prev) => self.attribute_pool[prev].next = next,
                    None => {
                        if let Value::Element(element) = &mut self.data_mut(node).value {
                            element.first_attribute = next;
                        }
                    }
                }
                self.attribute_pool.free(id);
                return Ok(());
            }
            prev = Some(id);
            current = next;
        }
        Ok(())
    }

    fn snapshot(&self, node: Node, deep: bool) -> Result<crate::fixed::Content, Error> {
        self.check_node(node)?;
        self.to_fixed(node, deep).ok_or_else(|| {
            Error::InvalidOperation("the document node cannot be cloned".into())
        })
    }

    /// Copy a node without its children. The copy is unlinked.
    pub fn shallow_clone(&mut self, node: Node) -> Result<Node, Error> {
        let content = self.snapshot(node, false)?;
        Ok(content.build(self))
    }

    /// Copy a node without its children into another document.
    pub fn shallow_clone_into(&self, node: Node, target: &mut Document) -> Result<Node, Error> {
        let content = self.snapshot(node, false)?;
        Ok(content.build(target))
    }

    /// Copy a node and all of its descendants. The copy is unlinked.
    ///
    /// ```rust
    /// let mut doc = tinydom::parse("<p><a x=\"1\">t</a></p>").unwrap();
    /// let p = doc.root_element().unwrap();
    /// let a = doc.first_child(p).unwrap();
    /// let copy = doc.deep_clone(a).unwrap();
    /// doc.insert_end_child(p, copy).unwrap();
    /// assert_eq!(doc.print(true), r#"<p><a x="1">t</a><a x="1">t</a></p>"#);
    /// ```
    pub fn deep_clone(&mut self, node: Node) -> Result<Node, Error> {
        let content = self.snapshot(node, true)?;
        Ok(content.build(self))
    }

    /// Copy a node and all of its descendants into another document.
    pub fn deep_clone_into(&self, node: Node, target: &mut Document) -> Result<Node, Error> {
        let content = self.snapshot(node, true)?;
        Ok(content.build(target))
    }

    /// Replace the content of `target` with a copy of this document.
    pub fn deep_copy_to(&self, target: &mut Document) {
        target.clear();
        self.to_fixed_document().build(target);
    }

    /// Compare the data of two nodes, ignoring their children. The nodes
    /// may belong to different documents.
    ///
    /// Elements compare by name and attributes, the other kinds by value.
    pub fn shallow_equal(&self, node: Node, other: &Document, other_node: Node) -> bool {
        let a = &self.data(node).value;
        let b = &other.data(other_node).value;
        match (a, b) {
            (Value::Document, Value::Document) => true,
            (Value::Element(_), Value::Element(_)) => {
                self.name(node) == other.name(other_node)
                    && self
                        .attributes(node)
                        .map(|a| (a.name(), a.value()))
                        .eq(other.attributes(other_node).map(|a| (a.name(), a.value())))
            }
            (Value::Text(x), Value::Text(y)) => {
                x.cdata == y.cdata && self.value(node) == other.value(other_node)
            }
            (Value::Comment(_), Value::Comment(_))
            | (Value::Declaration(_), Value::Declaration(_))
            | (Value::Unknown(_), Value::Unknown(_)) => {
                self.value(node) == other.value(other_node)
            }
            _ => false,
        }
    }

    /// Compare two subtrees node by node.
    pub fn deep_equal(&self, node: Node, other: &Document, other_node: Node) -> bool {
        if !self.shallow_equal(node, other, other_node) {
            return false;
        }
        let mut ours = self.children(node);
        let mut theirs = other.children(other_node);
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    if !self.deep_equal(a, other, b) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}
