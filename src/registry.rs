//! Monitored-entity registry: hosts, services, and weak references to them
//!
//! Comments never own the entity they annotate. They hold lookup keys
//! ([`HostRef`], [`ServiceRef`]) that are resolved against this registry on
//! demand; resolution returns `None` once the entity is gone, so a stale
//! reference can never dangle. Whoever removes an entity gets back the list
//! of references that died and is expected to drop dependent comments.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weak reference to a host, keyed by its unique name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostRef(String);

impl HostRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weak reference to a service, keyed by owning host and service description
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceRef {
    host: HostRef,
    description: String,
}

impl ServiceRef {
    pub fn new(host: HostRef, description: impl Into<String>) -> Self {
        Self {
            host,
            description: description.into(),
        }
    }

    pub fn host(&self) -> &HostRef {
        &self.host
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.host, self.description)
    }
}

/// Reference to exactly one host, or exactly one (host, service) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Host(HostRef),
    Service(ServiceRef),
}

impl EntityRef {
    /// The anchoring host; a service entity reports its owning host
    pub fn host(&self) -> &HostRef {
        match self {
            EntityRef::Host(host) => host,
            EntityRef::Service(service) => service.host(),
        }
    }

    /// The service part, present only for service entities
    pub fn service(&self) -> Option<&ServiceRef> {
        match self {
            EntityRef::Host(_) => None,
            EntityRef::Service(service) => Some(service),
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self, EntityRef::Service(_))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Host(host) => write!(f, "{}", host),
            EntityRef::Service(service) => write!(f, "{}", service),
        }
    }
}

/// A monitored host entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub display: Option<String>,
}

/// A monitored service entry, always scoped to exactly one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub display: Option<String>,
}

/// Errors from registry mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A service was registered for a host the registry does not know
    UnknownHost(HostRef),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownHost(host) => {
                write!(f, "unknown host: {}", host)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Owner of all monitored hosts and services
///
/// Explicit state with explicit init; never a process-wide singleton.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    hosts: BTreeMap<HostRef, Host>,
    services: BTreeMap<ServiceRef, Service>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host; returns false when the name was already taken
    pub fn add_host(&mut self, host: HostRef, display: Option<String>) -> bool {
        debug!("registering host {host}");
        self.hosts.insert(host, Host { display }).is_none()
    }

    /// Register a service on an already-registered host
    pub fn add_service(
        &mut self,
        service: ServiceRef,
        display: Option<String>,
    ) -> Result<(), RegistryError> {
        if !self.hosts.contains_key(service.host()) {
            return Err(RegistryError::UnknownHost(service.host().clone()));
        }

        debug!("registering service {service}");
        self.services.insert(service, Service { display });
        Ok(())
    }

    /// Resolve a host reference; absence means the host is gone
    pub fn resolve_host(&self, host: &HostRef) -> Option<&Host> {
        self.hosts.get(host)
    }

    /// Resolve a service reference; absence means the service is gone
    pub fn resolve_service(&self, service: &ServiceRef) -> Option<&Service> {
        self.services.get(service)
    }

    /// Whether the referenced entity currently exists
    pub fn contains(&self, entity: &EntityRef) -> bool {
        match entity {
            EntityRef::Host(host) => self.hosts.contains_key(host),
            EntityRef::Service(service) => self.services.contains_key(service),
        }
    }

    /// Remove a host and every service scoped to it
    ///
    /// Returns all entity references that just died, the host itself
    /// included, so the caller can drop dependent comments.
    pub fn remove_host(&mut self, host: &HostRef) -> Vec<EntityRef> {
        let mut removed = Vec::new();

        if self.hosts.remove(host).is_some() {
            removed.push(EntityRef::Host(host.clone()));
        }

        let dead_services: Vec<ServiceRef> = self
            .services
            .keys()
            .filter(|service| service.host() == host)
            .cloned()
            .collect();

        for service in dead_services {
            self.services.remove(&service);
            removed.push(EntityRef::Service(service));
        }

        if !removed.is_empty() {
            debug!("removed host {host} and {} dependent entities", removed.len() - 1);
        }

        removed
    }

    /// Remove a single service; the owning host stays
    pub fn remove_service(&mut self, service: &ServiceRef) -> Option<EntityRef> {
        self.services.remove(service).map(|_| {
            debug!("removed service {service}");
            EntityRef::Service(service.clone())
        })
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
