//! In-memory store implementing all three store ports over plain vectors.
//!
//! Used by tests and by the server when no database URL is configured.
//! Listing order is insertion order.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CanigoError;
use crate::ports::{PassLevelStore, PlaceStore, Result, Stores, UserStore};
use crate::types::{PassLevel, Place, User};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    pass_levels: RwLock<Vec<PassLevel>>,
    places: RwLock<Vec<Place>>,
}

// A poisoned lock only means another test thread panicked mid-write; the
// vectors themselves are still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|p| p.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|p| p.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store handles backed by this instance.
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            users: self.clone(),
            pass_levels: self.clone(),
            places: self.clone(),
        }
    }

    /// Insert or replace without uniqueness checks. Seeding/test helper.
    pub fn put_user(&self, user: User) {
        upsert(&mut *write(&self.users), user, |u| u.id);
    }

    pub fn put_pass_level(&self, pass: PassLevel) {
        upsert(&mut *write(&self.pass_levels), pass, |p| p.id);
    }

    pub fn put_place(&self, place: Place) {
        upsert(&mut *write(&self.places), place, |p| p.id);
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> Uuid) {
    let key = id(&item);
    match items.iter_mut().find(|existing| id(existing) == key) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn replace<T>(items: &mut [T], item: &T, id: impl Fn(&T) -> Uuid, what: &str) -> Result<()>
where
    T: Clone,
{
    let key = id(item);
    let slot = items
        .iter_mut()
        .find(|existing| id(existing) == key)
        .ok_or_else(|| CanigoError::not_found(format!("No {what} found")))?;
    *slot = item.clone();
    Ok(())
}

fn remove<T>(items: &mut Vec<T>, key: Uuid, id: impl Fn(&T) -> Uuid) -> bool {
    let before = items.len();
    items.retain(|existing| id(existing) != key);
    items.len() != before
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(read(&self.users).iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(read(&self.users).iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        Ok(read(&self.users)
            .iter()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token_hash)
                    && u.password_reset_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(read(&self.users).clone())
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = write(&self.users);
        if users.iter().any(|u| u.email == user.email) {
            return Err(CanigoError::conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = write(&self.users);
        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(CanigoError::conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        replace(&mut users[..], user, |u| u.id, "user")
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(remove(&mut *write(&self.users), id, |u| u.id))
    }
}

#[async_trait]
impl PassLevelStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PassLevel>> {
        Ok(read(&self.pass_levels).iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<PassLevel>> {
        Ok(read(&self.pass_levels).clone())
    }

    async fn insert(&self, pass: &PassLevel) -> Result<()> {
        let mut passes = write(&self.pass_levels);
        if passes.iter().any(|p| p.level == pass.level) {
            return Err(CanigoError::conflict(format!(
                "pass level {} already exists",
                pass.level
            )));
        }
        passes.push(pass.clone());
        Ok(())
    }

    async fn update(&self, pass: &PassLevel) -> Result<()> {
        let mut passes = write(&self.pass_levels);
        if passes.iter().any(|p| p.level == pass.level && p.id != pass.id) {
            return Err(CanigoError::conflict(format!(
                "pass level {} already exists",
                pass.level
            )));
        }
        replace(&mut passes[..], pass, |p| p.id, "pass level")
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut passes = write(&self.pass_levels);
        if read(&self.users).iter().any(|u| u.pass_level_id == id) {
            return Err(CanigoError::conflict("pass level is still in use"));
        }
        Ok(remove(&mut *passes, id, |p| p.id))
    }
}

#[async_trait]
impl PlaceStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Place>> {
        Ok(read(&self.places).iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Place>> {
        Ok(read(&self.places).clone())
    }

    async fn insert(&self, place: &Place) -> Result<()> {
        let mut places = write(&self.places);
        if places.iter().any(|p| p.address == place.address) {
            return Err(CanigoError::conflict(format!(
                "a place already exists at {}",
                place.address
            )));
        }
        places.push(place.clone());
        Ok(())
    }

    async fn update(&self, place: &Place) -> Result<()> {
        let mut places = write(&self.places);
        if places
            .iter()
            .any(|p| p.address == place.address && p.id != place.id)
        {
            return Err(CanigoError::conflict(format!(
                "a place already exists at {}",
                place.address
            )));
        }
        replace(&mut places[..], place, |p| p.id, "place")
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(remove(&mut *write(&self.places), id, |p| p.id))
    }
}
