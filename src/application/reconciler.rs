//! Find-or-create by natural key
//!
//! Every entity the passes need goes through [`Reconciler::reconcile`]: the
//! identity cache answers repeat requests, otherwise the shop is searched
//! with an exact-match filter, and only when nothing matches is the entity
//! created. Failed lookups and creates are never cached, so a later request
//! for the same key starts over.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::application::identity_cache::IdentityCache;
use crate::domain::document::Element;
use crate::domain::entities::{NaturalKey, RemoteId};
use crate::domain::repositories::RemoteResource;
use crate::infrastructure::api_error::{ApiError, ApiResult};

/// Where a reconciled id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    Cached,
    Found,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub id: RemoteId,
    pub origin: Origin,
}

/// Counters for the end-of-pass summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub cache_hits: usize,
    pub lookups: usize,
    pub found: usize,
    pub created: usize,
    pub failures: usize,
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache hits {}, lookups {}, found {}, created {}, failures {}",
            self.cache_hits, self.lookups, self.found, self.created, self.failures
        )
    }
}

pub struct Reconciler<'a> {
    client: &'a dyn RemoteResource,
    cache: IdentityCache<NaturalKey>,
    stats: ReconcileStats,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn RemoteResource) -> Self {
        Self {
            client,
            cache: IdentityCache::new(),
            stats: ReconcileStats::default(),
        }
    }

    pub fn client(&self) -> &'a dyn RemoteResource {
        self.client
    }

    pub const fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    pub fn cached(&self, key: &NaturalKey) -> Option<&RemoteId> {
        self.cache.get(key)
    }

    /// Id for `key`, creating the entity from `build_payload` if the shop
    /// has no match. The builder only runs on a miss.
    pub async fn reconcile<F>(&mut self, key: NaturalKey, build_payload: F) -> ApiResult<Reconciled>
    where
        F: FnOnce() -> Element,
    {
        if let Some(id) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return Ok(Reconciled {
                id: id.clone(),
                origin: Origin::Cached,
            });
        }

        if let Some(id) = self.lookup(&key).await? {
            let id = self.cache.insert(key, id).clone();
            return Ok(Reconciled {
                id,
                origin: Origin::Found,
            });
        }

        let resource = key.resource();
        let response = match self.client.create(resource, &build_payload()).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.failures += 1;
                return Err(e);
            }
        };
        let Some(id) = response
            .single_item(resource.element())
            .and_then(Element::entity_id)
        else {
            self.stats.failures += 1;
            return Err(ApiError::missing_element(resource.element()));
        };

        self.stats.created += 1;
        debug!("➕ Created {} -> {}", key, id);
        let id = self.cache.insert(key, id).clone();
        Ok(Reconciled {
            id,
            origin: Origin::Created,
        })
    }

    /// Lookup-only variant: cached or found id, never creates.
    pub async fn find(&mut self, key: &NaturalKey) -> ApiResult<Option<RemoteId>> {
        if let Some(id) = self.cache.get(key) {
            self.stats.cache_hits += 1;
            return Ok(Some(id.clone()));
        }
        let Some(id) = self.lookup(key).await? else {
            return Ok(None);
        };
        Ok(Some(self.cache.insert(key.clone(), id).clone()))
    }

    /// Record an id obtained outside [`Self::reconcile`].
    pub fn remember(&mut self, key: NaturalKey, id: RemoteId) {
        self.cache.insert(key, id);
    }

    async fn lookup(&mut self, key: &NaturalKey) -> ApiResult<Option<RemoteId>> {
        let resource = key.resource();
        self.stats.lookups += 1;

        let response = match self.client.get(resource, &key.lookup_query()).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.failures += 1;
                return Err(e);
            }
        };

        let matches: Vec<RemoteId> = response
            .collection_items(resource.path(), resource.element())
            .into_iter()
            .filter_map(Element::entity_id)
            .collect();

        let Some(first) = matches.first() else {
            return Ok(None);
        };
        if matches.len() > 1 {
            warn!(
                "⚠️ {} matches for {}, using first id {}",
                matches.len(),
                key,
                first
            );
        }
        self.stats.found += 1;
        Ok(Some(first.clone()))
    }
}
