//! Ordered, named rule chains.

use crate::error::{MultimarkError, RulerKind};

/// An ordered list of named rules.
///
/// Rules run in list order; extensions position themselves relative to an
/// existing rule with [`Ruler::before`] / [`Ruler::after`].
pub struct Ruler<R: ?Sized> {
    kind: RulerKind,
    entries: Vec<(String, Box<R>)>,
}

impl<R: ?Sized> Ruler<R> {
    /// Creates an empty chain.
    pub fn empty(kind: RulerKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Appends a rule to the end of the chain.
    pub fn push(&mut self, name: impl Into<String>, rule: Box<R>) {
        self.entries.push((name.into(), rule));
    }

    /// Inserts a rule immediately before `anchor`.
    pub fn before(
        &mut self,
        anchor: &str,
        name: impl Into<String>,
        rule: Box<R>,
    ) -> Result<(), MultimarkError> {
        let index = self.position(anchor)?;
        self.entries.insert(index, (name.into(), rule));
        Ok(())
    }

    /// Inserts a rule immediately after `anchor`.
    pub fn after(
        &mut self,
        anchor: &str,
        name: impl Into<String>,
        rule: Box<R>,
    ) -> Result<(), MultimarkError> {
        let index = self.position(anchor)?;
        self.entries.insert(index + 1, (name.into(), rule));
        Ok(())
    }

    /// Rule names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns true if a rule with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub(crate) fn rules(&self) -> impl Iterator<Item = &R> {
        self.entries.iter().map(|(_, rule)| rule.as_ref())
    }

    fn position(&self, anchor: &str) -> Result<usize, MultimarkError> {
        self.entries
            .iter()
            .position(|(name, _)| name == anchor)
            .ok_or_else(|| MultimarkError::rule_not_found(self.kind, anchor))
    }
}

impl<R: ?Sized> std::fmt::Debug for Ruler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ruler")
            .field("kind", &self.kind)
            .field("rules", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
