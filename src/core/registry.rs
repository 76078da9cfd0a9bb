use log::debug;

use super::body::Body;
use crate::{
    error::RegistryError,
    utils::allocator::{Arena, BodyHandle},
};

/// Owns every simulated body and hands out stable handles.
///
/// Iteration follows insertion order so that repeated runs visit bodies
/// identically.
#[derive(Default)]
pub struct BodyRegistry {
    bodies: Arena<Body>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a body under its requested handle, or a fresh one.
    pub fn add(&mut self, mut body: Body) -> Result<BodyHandle, RegistryError> {
        let handle = match body.requested_handle() {
            Some(BodyHandle::PLACEHOLDER) => {
                return Err(RegistryError::ReservedHandle(BodyHandle::PLACEHOLDER));
            }
            Some(requested) => {
                body.set_handle(requested);
                self.bodies
                    .insert_with_handle(requested, body)
                    .map_err(|_| RegistryError::DuplicateHandle(requested))?;
                requested
            }
            None => {
                let handle = self
                    .bodies
                    .insert(body)
                    .map_err(|_| RegistryError::HandlesExhausted)?;
                if let Some(stored) = self.bodies.get_mut(handle) {
                    stored.set_handle(handle);
                }
                handle
            }
        };
        debug!("registered body {handle}");
        Ok(handle)
    }

    pub fn get(&self, handle: BodyHandle) -> Result<&Body, RegistryError> {
        self.bodies
            .get(handle)
            .ok_or(RegistryError::NotFound(handle))
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut Body, RegistryError> {
        self.bodies
            .get_mut(handle)
            .ok_or(RegistryError::NotFound(handle))
    }

    /// Removes a body; its handle is retired for good.
    pub fn remove(&mut self, handle: BodyHandle) -> Result<Body, RegistryError> {
        let body = self
            .bodies
            .remove(handle)
            .ok_or(RegistryError::NotFound(handle))?;
        debug!("removed body {handle}");
        Ok(body)
    }

    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Body),
    {
        for body in self.bodies.iter() {
            visitor(body);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies.iter()
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.handles()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Whether `handle` was ever issued, including removed bodies.
    pub fn was_issued(&self, handle: BodyHandle) -> bool {
        self.bodies.was_issued(handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Working copy of all live bodies, in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<Body> {
        self.bodies.iter().cloned().collect()
    }

    /// Writes back the kinematic state of a working copy produced by
    /// [`snapshot`](Self::snapshot).
    pub(crate) fn commit(&mut self, working: &[Body]) {
        for updated in working {
            if let Some(stored) = self.bodies.get_mut(updated.handle()) {
                stored.copy_state_from(updated);
            }
        }
    }
}
