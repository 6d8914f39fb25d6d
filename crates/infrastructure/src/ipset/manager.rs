use super::backend::{SetBackend, SetFamily};
use async_trait::async_trait;
use compact_str::CompactString;
use dnsieve_application::ports::IpsetManager;
use dnsieve_domain::{DomainError, IpsetMapping};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A configured set together with its address family.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SetRef {
    name: Arc<str>,
    family: SetFamily,
}

type Sets = SmallVec<[SetRef; 2]>;

/// Adds resolved addresses to the sets mapped to a host's closest configured
/// ancestor domain.
pub struct SetManager<B> {
    backend: B,
    /// Configured domain → its sets. The empty domain is the root zone.
    domains: FxHashMap<CompactString, Sets>,
    /// (set, ip) pairs added or being added.
    added: Mutex<FxHashSet<(Arc<str>, IpAddr)>>,
    closed: AtomicBool,
}

impl<B: SetBackend> SetManager<B> {
    /// Resolve each configured set's family through `backend`. Any lookup
    /// failure fails construction.
    pub async fn new(backend: B, mappings: Vec<IpsetMapping>) -> Result<Self, DomainError> {
        let mut families: FxHashMap<Arc<str>, SetFamily> = FxHashMap::default();
        let mut domains: FxHashMap<CompactString, Sets> = FxHashMap::default();

        for mapping in mappings {
            let mut sets = Sets::new();
            for name in &mapping.sets {
                let family = match families.get(name) {
                    Some(family) => *family,
                    None => {
                        let family = backend.family(name).await?;
                        families.insert(Arc::clone(name), family);
                        family
                    }
                };
                sets.push(SetRef {
                    name: Arc::clone(name),
                    family,
                });
            }

            for domain in &mapping.domains {
                let entry = domains.entry(CompactString::new(domain)).or_default();
                for set in &sets {
                    if !entry.contains(set) {
                        entry.push(set.clone());
                    }
                }
            }
        }

        info!(
            domains = domains.len(),
            sets = families.len(),
            "ipset manager initialized"
        );

        Ok(Self {
            backend,
            domains,
            added: Mutex::new(FxHashSet::default()),
            closed: AtomicBool::new(false),
        })
    }

    /// Forget reservations whose entries never reached the backend.
    async fn release(&self, batches: &[(&SetRef, SmallVec<[IpAddr; 8]>)]) {
        let mut added = self.added.lock().await;
        for (set, ips) in batches {
            for ip in ips {
                added.remove(&(Arc::clone(&set.name), *ip));
            }
        }
    }

    /// Sets of the closest configured ancestor of `host`, `host` included.
    fn lookup(&self, host: &str) -> Option<&Sets> {
        let mut name = host;
        loop {
            if let Some(sets) = self.domains.get(name) {
                return Some(sets);
            }
            if name.is_empty() {
                return None;
            }
            name = name.split_once('.').map_or("", |(_, parent)| parent);
        }
    }
}

#[async_trait]
impl<B: SetBackend> IpsetManager for SetManager<B> {
    async fn add(
        &self,
        host: &str,
        ip4s: &[Ipv4Addr],
        ip6s: &[Ipv6Addr],
    ) -> Result<usize, DomainError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::Ipset("manager is closed".to_string()));
        }

        let Some(sets) = self.lookup(host) else {
            return Ok(0);
        };

        // Reserve fresh (set, ip) pairs under the lock; the backend runs unlocked.
        let mut batches: SmallVec<[(&SetRef, SmallVec<[IpAddr; 8]>); 2]> = SmallVec::new();
        {
            let mut added = self.added.lock().await;
            for set in sets {
                let candidates: SmallVec<[IpAddr; 8]> = match set.family {
                    SetFamily::Inet => ip4s.iter().copied().map(IpAddr::V4).collect(),
                    SetFamily::Inet6 => ip6s.iter().copied().map(IpAddr::V6).collect(),
                };
                let fresh: SmallVec<[IpAddr; 8]> = candidates
                    .into_iter()
                    .filter(|ip| added.insert((Arc::clone(&set.name), *ip)))
                    .collect();
                if !fresh.is_empty() {
                    batches.push((set, fresh));
                }
            }
        }

        let mut n = 0;
        for (idx, (set, fresh)) in batches.iter().enumerate() {
            if let Err(e) = self.backend.add_entries(&set.name, fresh).await {
                self.release(&batches[idx..]).await;
                return Err(e);
            }
            n += fresh.len();
            debug!(host, set = %set.name, family = %set.family, entries = fresh.len(), "Added ipset entries");
        }

        Ok(n)
    }

    async fn close(&self) -> Result<(), DomainError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.added.lock().await.clear();
        info!("ipset manager closed");
        Ok(())
    }
}
