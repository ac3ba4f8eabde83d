//! Map-backed metadata lookup for offline builds

use crate::error::DbResult;
use crate::traits::MetadataLookup;
use async_trait::async_trait;
use std::collections::HashMap;
use wf_core::{TableMetadata, Target};

/// Warehouse state known up front
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    relations: HashMap<Target, TableMetadata>,
}

impl StaticMetadata {
    /// An empty warehouse: nothing exists yet
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metadata: TableMetadata) -> &mut Self {
        self.relations.insert(metadata.target.clone(), metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl FromIterator<TableMetadata> for StaticMetadata {
    fn from_iter<I: IntoIterator<Item = TableMetadata>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for metadata in iter {
            lookup.insert(metadata);
        }
        lookup
    }
}

#[async_trait]
impl MetadataLookup for StaticMetadata {
    async fn describe(&self, target: &Target) -> DbResult<Option<TableMetadata>> {
        Ok(self.relations.get(target).cloned())
    }
}
