use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use dormdesk::booking::{
    DirectoryError, IdentityDirectory, ResidencyDirectory, ResidencyId, ResidencySnapshot,
    StudentIdentity, UserId,
};
use dormdesk::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Residency catalog backed by process memory. The real catalog lives in a
/// separate service; this directory holds whatever the seed file provides.
#[derive(Default)]
pub(crate) struct InMemoryResidencyDirectory {
    records: Mutex<HashMap<ResidencyId, ResidencySnapshot>>,
}

impl InMemoryResidencyDirectory {
    pub(crate) fn insert(&self, snapshot: ResidencySnapshot) {
        let mut records = self.records.lock().expect("directory mutex poisoned");
        records.insert(snapshot.id.clone(), snapshot);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("directory mutex poisoned").len()
    }
}

impl ResidencyDirectory for InMemoryResidencyDirectory {
    fn residency(&self, id: &ResidencyId) -> Result<Option<ResidencySnapshot>, DirectoryError> {
        let records = self.records.lock().expect("directory mutex poisoned");
        Ok(records.get(id).cloned())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryIdentityDirectory {
    records: Mutex<HashMap<UserId, StudentIdentity>>,
}

impl InMemoryIdentityDirectory {
    pub(crate) fn insert(&self, id: UserId, identity: StudentIdentity) {
        let mut records = self.records.lock().expect("identity mutex poisoned");
        records.insert(id, identity);
    }
}

impl IdentityDirectory for InMemoryIdentityDirectory {
    fn identity(&self, id: &UserId) -> Option<StudentIdentity> {
        let records = self.records.lock().expect("identity mutex poisoned");
        records.get(id).cloned()
    }
}

/// Bootstrap data for the in-memory directories.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedFile {
    #[serde(default)]
    pub(crate) residencies: Vec<ResidencySnapshot>,
    #[serde(default)]
    pub(crate) identities: Vec<SeedIdentity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeedIdentity {
    pub(crate) id: UserId,
    pub(crate) name: String,
    pub(crate) email: String,
}

pub(crate) fn load_seed(path: &Path) -> Result<SeedFile, AppError> {
    let raw = std::fs::read(path)?;
    let seed = serde_json::from_slice(&raw)?;
    Ok(seed)
}

pub(crate) fn apply_seed(
    seed: SeedFile,
    residencies: &InMemoryResidencyDirectory,
    identities: &InMemoryIdentityDirectory,
) -> (usize, usize) {
    let residency_count = seed.residencies.len();
    for snapshot in seed.residencies {
        residencies.insert(snapshot);
    }
    let identity_count = seed.identities.len();
    for entry in seed.identities {
        identities.insert(
            entry.id,
            StudentIdentity {
                name: entry.name,
                email: entry.email,
            },
        );
    }
    (residency_count, identity_count)
}
