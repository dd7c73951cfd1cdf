//! Entity lifecycle builders.
//!
//! [`FromResource`] builds an entity from a wire resource during sync, resolving its parents
//! through a [`SyncContext`]. [`ToResource`] produces the wire resource sent back to the server.

use crate::association::{find_optional_parent, resolve_parent};
use crate::config::CoreConfig;
use crate::entity_ref::EntityRef;
use crate::mapper::{to_entity, Entity};
use crate::store::EntityStore;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fieldcare_types::EntityType;
use fieldcare_wire::{Resource, ResourcePage};

/// Everything a builder may consult while turning a resource into an entity.
pub struct SyncContext<'a> {
    store: &'a mut dyn EntityStore,
    page: &'a ResourcePage,
    config: &'a CoreConfig,
    now: DateTime<Utc>,
    depth: usize,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        store: &'a mut dyn EntityStore,
        page: &'a ResourcePage,
        config: &'a CoreConfig,
    ) -> Self {
        Self {
            store,
            page,
            config,
            now: Utc::now(),
            depth: 0,
        }
    }

    /// Pins the clock used for "now" comparisons.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn store(&self) -> &dyn EntityStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn EntityStore {
        &mut *self.store
    }

    /// The page currently being applied.
    pub fn page(&self) -> &ResourcePage {
        self.page
    }

    pub fn config(&self) -> &CoreConfig {
        self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Loads a required parent named by `foreign_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Association`] if the parent is missing and [`CoreError::Mapping`] if
    /// its record does not fit `T`.
    pub fn parent<T: Entity>(
        &self,
        child_type: EntityType,
        resource: &Resource,
        foreign_key: &str,
    ) -> CoreResult<T> {
        let record = resolve_parent(self.store(), child_type, resource, foreign_key, T::TYPE)?;
        to_entity(record)
    }

    /// Loads an optional parent; absent or unknown references read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Mapping`] if a found record does not fit `T`.
    pub fn optional_parent<T: Entity>(
        &self,
        resource: &Resource,
        foreign_key: &str,
    ) -> CoreResult<Option<T>> {
        find_optional_parent(self.store(), resource, foreign_key, T::TYPE)
            .map(to_entity)
            .transpose()
    }

    /// A back-reference to a required parent, after checking that the parent exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Association`] if the parent is missing.
    pub fn parent_ref<T: Entity>(
        &self,
        child_type: EntityType,
        resource: &Resource,
        foreign_key: &str,
    ) -> CoreResult<EntityRef<T>> {
        resolve_parent(self.store(), child_type, resource, foreign_key, T::TYPE)?;
        let uuid = resource
            .uuid_for(foreign_key)
            .ok_or_else(|| CoreError::InvalidInput(format!("{foreign_key} vanished")))?;
        Ok(EntityRef::new(uuid))
    }

    /// A back-reference to an optional parent that exists in the store.
    pub fn optional_parent_ref<T: Entity>(
        &self,
        resource: &Resource,
        foreign_key: &str,
    ) -> Option<EntityRef<T>> {
        find_optional_parent(self.store(), resource, foreign_key, T::TYPE)?;
        resource.uuid_for(foreign_key).map(EntityRef::new)
    }

    /// Runs `build` one level deeper in a forward-reference chain.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ForwardReferenceDepth`] once the configured depth is reached.
    pub fn follow_forward_reference<R>(
        &mut self,
        entity_type: EntityType,
        uuid: &str,
        build: impl FnOnce(&mut Self) -> CoreResult<R>,
    ) -> CoreResult<R> {
        if self.depth >= self.config.forward_reference_depth() {
            return Err(CoreError::ForwardReferenceDepth {
                entity_type,
                uuid: uuid.to_owned(),
                depth: self.depth,
            });
        }
        self.depth += 1;
        let result = build(self);
        self.depth -= 1;
        result
    }
}

/// Builds an entity from a wire resource.
pub trait FromResource: Sized {
    /// # Errors
    ///
    /// Returns [`CoreError::Association`] for an unresolved required parent and
    /// [`CoreError::Wire`] for malformed mandatory data.
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self>;
}

/// Produces the wire resource for an entity.
pub trait ToResource {
    fn to_resource(&self) -> Resource;
}
