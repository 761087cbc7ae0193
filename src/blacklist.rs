//! Identifiers whose canonical (reference-language) text changed upstream.
//!
//! Translations for these entries were written against the old source text,
//! so their modifications must not be carried over to the release branch.
use std::collections::{HashSet, hash_set};

use crate::{
   diff::classify_stream,
   error::Result,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
   identifiers: HashSet<String>,
}

impl Blacklist {
   /// Collect every identifier added or removed by the reference file's diff.
   ///
   /// Headers, blank separators and context lines never contribute. An edit
   /// shows up as a removal plus an addition and lands here once.
   pub fn from_reference_diff(diff: &str) -> Result<Self> {
      let mut identifiers = HashSet::new();

      for (_, line) in classify_stream(diff) {
         if let Some(identifier) = line?.identifier() {
            identifiers.insert(identifier.to_string());
         }
      }

      tracing::debug!(count = identifiers.len(), "built identifier blacklist");
      Ok(Self { identifiers })
   }

   pub fn contains(&self, identifier: &str) -> bool {
      self.identifiers.contains(identifier)
   }

   pub fn len(&self) -> usize {
      self.identifiers.len()
   }

   pub fn is_empty(&self) -> bool {
      self.identifiers.is_empty()
   }

   pub fn iter(&self) -> hash_set::Iter<'_, String> {
      self.identifiers.iter()
   }
}

impl<S: Into<String>> FromIterator<S> for Blacklist {
   fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
      Self { identifiers: iter.into_iter().map(Into::into).collect() }
   }
}
