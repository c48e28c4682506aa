//! Per-kind repositories over the state store.

use std::marker::PhantomData;

use chrono::Utc;
use okctl_core::Id;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::store::StateStore;
use crate::stored::Storable;
use crate::types::{Envelope, Metadata};

/// Persistence seam the resource services are written against.
pub trait ResourceStore<R>: Send + Sync {
    /// Insert or update, keyed by the resource's business key.
    fn save(&self, value: &R) -> StateResult<()>;

    /// Live row under `key`, if any.
    fn get(&self, id: &Id, key: &str) -> StateResult<Option<R>>;

    /// Every live row of the kind.
    fn list(&self, id: &Id) -> StateResult<Vec<R>>;

    /// Delete by key with the kind's delete semantics. Returns whether a
    /// live row was removed.
    fn remove(&self, id: &Id, key: &str) -> StateResult<bool>;
}

/// Typed access to one kind's table.
pub struct Repository<R> {
    store: StateStore,
    _kind: PhantomData<fn() -> R>,
}

impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _kind: PhantomData,
        }
    }
}

impl<R: Storable> Repository<R> {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    fn decode(bytes: &[u8]) -> StateResult<Envelope<R::Stored>> {
        serde_json::from_slice(bytes).map_err(|e| StateError::Deserialize(e.to_string()))
    }

    fn encode(envelope: &Envelope<R::Stored>) -> StateResult<Vec<u8>> {
        serde_json::to_vec(envelope).map_err(|e| StateError::Serialize(e.to_string()))
    }

    /// Upsert. A re-save keeps the original `created_at`, refreshes
    /// `updated_at` and revives a soft-deleted row.
    pub fn save(&self, value: &R) -> StateResult<()> {
        let key = value.key();
        let data = value.to_stored();
        let now = Utc::now();
        self.store
            .update(&value.id().cluster_name, R::TABLE, &key, |current| {
                let metadata = match current {
                    Some(bytes) => Self::decode(&bytes)?.metadata.touched(now),
                    None => Metadata::new(now),
                };
                let envelope = Envelope {
                    key: key.clone(),
                    metadata,
                    data,
                };
                Ok(Some(Self::encode(&envelope)?))
            })?;
        debug!(kind = R::KIND, %key, "saved");
        Ok(())
    }

    fn envelope(&self, id: &Id, key: &str) -> StateResult<Option<Envelope<R::Stored>>> {
        match self.store.get(&id.cluster_name, R::TABLE, key)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Exact match on the business key; `NotFound` when absent or deleted.
    pub fn one(&self, id: &Id, key: &str) -> StateResult<R> {
        self.get(id, key)?
            .ok_or_else(|| StateError::NotFound(format!("{} {key}", R::KIND)))
    }

    pub fn get(&self, id: &Id, key: &str) -> StateResult<Option<R>> {
        Ok(self
            .envelope(id, key)?
            .filter(|e| !e.metadata.deleted)
            .map(|e| R::from_stored(e.data)))
    }

    /// Metadata of the row under `key`, including soft-deleted rows.
    pub fn metadata(&self, id: &Id, key: &str) -> StateResult<Option<Metadata>> {
        Ok(self.envelope(id, key)?.map(|e| e.metadata))
    }

    fn live(&self, id: &Id) -> StateResult<Vec<Envelope<R::Stored>>> {
        let mut out = Vec::new();
        for (_, bytes) in self.store.scan(&id.cluster_name, R::TABLE)? {
            let envelope = Self::decode(&bytes)?;
            if !envelope.metadata.deleted {
                out.push(envelope);
            }
        }
        Ok(out)
    }

    /// Every live row, ordered by business key.
    pub fn all(&self, id: &Id) -> StateResult<Vec<R>> {
        Ok(self
            .live(id)?
            .into_iter()
            .map(|e| R::from_stored(e.data))
            .collect())
    }

    /// Every live row, ordered by the storage field `field`.
    pub fn all_by_index(&self, id: &Id, field: &str) -> StateResult<Vec<R>> {
        let mut rows = self
            .live(id)?
            .into_iter()
            .map(|e| Ok((index_value::<R>(&e.data, field)?, e.data)))
            .collect::<StateResult<Vec<_>>>()?;
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows.into_iter().map(|(_, data)| R::from_stored(data)).collect())
    }

    /// Live rows whose storage field `field` equals `value`.
    pub fn find(&self, id: &Id, field: &str, value: &str) -> StateResult<Vec<R>> {
        let mut out = Vec::new();
        for e in self.live(id)? {
            if index_value::<R>(&e.data, field)? == value {
                out.push(R::from_stored(e.data));
            }
        }
        Ok(out)
    }

    /// Hard delete. Returns true if the row existed.
    pub fn delete(&self, id: &Id, key: &str) -> StateResult<bool> {
        self.store.remove(&id.cluster_name, R::TABLE, key)
    }

    /// Mark the row deleted, keeping it on disk. Returns true if a live row
    /// was marked.
    pub fn soft_delete(&self, id: &Id, key: &str) -> StateResult<bool> {
        let now = Utc::now();
        self.store.update(&id.cluster_name, R::TABLE, key, |current| {
            let Some(bytes) = current else {
                return Ok(None);
            };
            let mut envelope = Self::decode(&bytes)?;
            if envelope.metadata.deleted {
                return Ok(None);
            }
            envelope.metadata.deleted = true;
            envelope.metadata.updated_at = now;
            Ok(Some(Self::encode(&envelope)?))
        })
    }
}

/// String form of a storage field, used for ordering and lookup.
fn index_value<R: Storable>(data: &R::Stored, field: &str) -> StateResult<String> {
    let value = serde_json::to_value(data).map_err(|e| StateError::Serialize(e.to_string()))?;
    match value.get(field) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(StateError::Read(format!("{} has no field {field}", R::KIND))),
    }
}

impl<R: Storable> ResourceStore<R> for Repository<R> {
    fn save(&self, value: &R) -> StateResult<()> {
        Repository::save(self, value)
    }

    fn get(&self, id: &Id, key: &str) -> StateResult<Option<R>> {
        Repository::get(self, id, key)
    }

    fn list(&self, id: &Id) -> StateResult<Vec<R>> {
        self.all(id)
    }

    fn remove(&self, id: &Id, key: &str) -> StateResult<bool> {
        if R::SOFT_DELETE {
            self.soft_delete(id, key)
        } else {
            self.delete(id, key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okctl_core::types::{Certificate, HostedZone, SecretParameter};

    fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    fn zone(domain: &str) -> HostedZone {
        HostedZone {
            id: id(),
            managed: true,
            fqdn: format!("{domain}."),
            domain: domain.to_string(),
            hosted_zone_id: format!("Z-{domain}"),
            name_servers: vec!["ns-1.awsdns-00.org".to_string()],
            stack_name: format!("okctl-hostedzone-okctl-staging-{domain}"),
            template: b"zone".to_vec(),
        }
    }

    fn cert(domain: &str, zone_id: &str) -> Certificate {
        Certificate {
            id: id(),
            fqdn: format!("{domain}."),
            domain: domain.to_string(),
            hosted_zone_id: zone_id.to_string(),
            arn: format!("arn:aws:acm:eu-west-1:123456789012:certificate/{domain}"),
            stack_name: format!("okctl-certificate-okctl-staging-{domain}"),
            template: Vec::new(),
        }
    }

    #[test]
    fn save_and_one() {
        let repo = Repository::<HostedZone>::new(StateStore::open_in_memory().unwrap());
        repo.save(&zone("okctl.io")).unwrap();
        assert_eq!(repo.one(&id(), "okctl.io").unwrap(), zone("okctl.io"));
    }

    #[test]
    fn one_missing_is_not_found() {
        let repo = Repository::<HostedZone>::new(StateStore::open_in_memory().unwrap());
        let err = repo.one(&id(), "nope.io").unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
        let err: okctl_core::Error = err.into();
        assert_eq!(err.kind(), okctl_core::Kind::NotExist);
    }

    #[test]
    fn resave_preserves_created_at() {
        let repo = Repository::<HostedZone>::new(StateStore::open_in_memory().unwrap());
        let mut z = zone("okctl.io");
        repo.save(&z).unwrap();
        let first = repo.metadata(&id(), "okctl.io").unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        z.name_servers.push("ns-2.awsdns-01.net".to_string());
        repo.save(&z).unwrap();

        let second = repo.metadata(&id(), "okctl.io").unwrap().unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(repo.one(&id(), "okctl.io").unwrap().name_servers.len(), 2);
    }

    #[test]
    fn soft_deleted_rows_are_invisible() {
        let repo = Repository::<HostedZone>::new(StateStore::open_in_memory().unwrap());
        repo.save(&zone("a.io")).unwrap();
        repo.save(&zone("b.io")).unwrap();

        assert!(ResourceStore::remove(&repo, &id(), "a.io").unwrap());
        assert!(!ResourceStore::remove(&repo, &id(), "a.io").unwrap());

        assert!(repo.get(&id(), "a.io").unwrap().is_none());
        assert_eq!(repo.all(&id()).unwrap(), vec![zone("b.io")]);
        // still on disk
        assert!(repo.metadata(&id(), "a.io").unwrap().unwrap().deleted);
    }

    #[test]
    fn resave_revives_soft_deleted_row() {
        let repo = Repository::<SecretParameter>::new(StateStore::open_in_memory().unwrap());
        let secret = SecretParameter {
            id: id(),
            name: "argocd/secret_key".to_string(),
            path: "/okctl/okctl-staging/argocd/secret_key".to_string(),
            version: 1,
        };
        repo.save(&secret).unwrap();
        let created = repo.metadata(&id(), &secret.name).unwrap().unwrap().created_at;
        repo.soft_delete(&id(), &secret.name).unwrap();

        repo.save(&secret).unwrap();
        let meta = repo.metadata(&id(), &secret.name).unwrap().unwrap();
        assert!(!meta.deleted);
        assert_eq!(meta.created_at, created);
        assert_eq!(repo.one(&id(), &secret.name).unwrap(), secret);
    }

    #[test]
    fn hard_delete_removes_row() {
        let repo = Repository::<Certificate>::new(StateStore::open_in_memory().unwrap());
        repo.save(&cert("argocd.okctl.io", "Z1")).unwrap();
        assert!(ResourceStore::remove(&repo, &id(), "argocd.okctl.io").unwrap());
        assert!(repo.metadata(&id(), "argocd.okctl.io").unwrap().is_none());
        assert!(!repo.delete(&id(), "argocd.okctl.io").unwrap());
    }

    #[test]
    fn all_by_index_orders_by_field() {
        let repo = Repository::<Certificate>::new(StateStore::open_in_memory().unwrap());
        repo.save(&cert("a.okctl.io", "Z3")).unwrap();
        repo.save(&cert("b.okctl.io", "Z1")).unwrap();
        repo.save(&cert("c.okctl.io", "Z2")).unwrap();

        let domains: Vec<String> = repo
            .all_by_index(&id(), "hosted_zone_id")
            .unwrap()
            .into_iter()
            .map(|c| c.domain)
            .collect();
        assert_eq!(domains, ["b.okctl.io", "c.okctl.io", "a.okctl.io"]);

        assert!(repo.all_by_index(&id(), "no_such_field").is_err());
    }

    #[test]
    fn find_matches_field_value() {
        let repo = Repository::<Certificate>::new(StateStore::open_in_memory().unwrap());
        repo.save(&cert("a.okctl.io", "Z1")).unwrap();
        repo.save(&cert("b.okctl.io", "Z1")).unwrap();
        repo.save(&cert("c.okctl.io", "Z2")).unwrap();
        assert_eq!(repo.find(&id(), "hosted_zone_id", "Z1").unwrap().len(), 2);
        assert!(repo.find(&id(), "hosted_zone_id", "Z9").unwrap().is_empty());
    }
}
