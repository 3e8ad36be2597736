//! # Dependency Container
//!
//! Registers named service instances and resolves constructor-style
//! dependency lists recursively.
//!
//! There is no runtime reflection: a type that the container may construct is
//! described up front by a [`ServiceFactory`] — a build closure plus the
//! explicit list of dependency keys its constructor needs. Scoped bindings
//! are resolved through that registry, depth-first, and are never cached; a
//! fresh object graph is built on every resolution.

use crate::error::{Error, Result};
use crate::request::ParamBag;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased service instance shared out of the container
pub type SharedService = Arc<dyn Any + Send + Sync>;

/// Canonical string key for a Rust type
///
/// Used for typed bindings, configuration lookup and supplied-object
/// matching, so the same type always resolves to the same key.
#[must_use]
pub fn service_key<T: Any>() -> &'static str {
    std::any::type_name::<T>()
}

/// A live object pre-supplied for a single resolution call
///
/// Supplied objects short-circuit container lookup: the current request and
/// parameter bag travel through dependency resolution this way, without ever
/// being bound.
#[derive(Clone)]
pub struct Supplied {
    key: String,
    value: SharedService,
}

impl Supplied {
    /// Wrap a value under its own type key
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            key: service_key::<T>().to_string(),
            value: Arc::new(value),
        }
    }

    /// Wrap an already shared value under its own type key
    pub fn from_shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            key: service_key::<T>().to_string(),
            value,
        }
    }

    /// The type key this object satisfies
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Explicit constructor description for a container-built type
///
/// Replaces constructor introspection: `dependencies` lists the keys the
/// build closure expects, in order, and `build` receives them resolved.
pub struct ServiceFactory {
    dependencies: Vec<String>,
    build: Box<dyn Fn(Vec<SharedService>) -> Result<SharedService> + Send + Sync>,
}

impl ServiceFactory {
    /// Describe a constructible type
    pub fn new<F>(dependencies: Vec<String>, build: F) -> Self
    where
        F: Fn(Vec<SharedService>) -> Result<SharedService> + Send + Sync + 'static,
    {
        Self {
            dependencies,
            build: Box::new(build),
        }
    }

    /// The declared dependency keys, in constructor order
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

enum Binding {
    /// Ready instance, shared for the container's lifetime
    Instance(SharedService),
    /// Type identifier, constructed fresh through the factory registry
    Scoped(String),
}

/// Dependency injection container
///
/// Keys are bound at most once; instances are cached for the container's
/// lifetime while scoped bindings are rebuilt per resolution. All mutation
/// happens during application setup, before requests are served.
#[derive(Default)]
pub struct Container {
    bindings: HashMap<String, Binding>,
    configurations: HashMap<String, SharedService>,
    factories: HashMap<String, ServiceFactory>,
}

impl Container {
    /// Create an empty container
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a ready instance under its own type key
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateBinding`] if the key is taken,
    /// [`Error::InvalidService`] for placeholder values
    pub fn bind<T: Any + Send + Sync>(&mut self, value: T) -> Result<()> {
        self.bind_as(service_key::<T>(), Arc::new(value))
    }

    /// Bind a ready instance under an explicit key
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateBinding`] if the key is taken,
    /// [`Error::InvalidService`] for placeholder values
    pub fn bind_as(&mut self, key: &str, value: SharedService) -> Result<()> {
        ensure_allowed(key, Some(&value))?;
        self.ensure_unbound(key)?;
        self.bindings
            .insert(key.to_string(), Binding::Instance(value));
        Ok(())
    }

    /// Bind a type identifier for deferred, uncached construction
    ///
    /// The identifier must have a registered [`ServiceFactory`] by the time
    /// it is first resolved.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateBinding`] if the key is taken
    pub fn bind_scoped(&mut self, key: &str) -> Result<()> {
        ensure_allowed(key, None)?;
        self.ensure_unbound(key)?;
        self.bindings
            .insert(key.to_string(), Binding::Scoped(key.to_string()));
        Ok(())
    }

    /// Bind a typed configuration object, keyed by its own type
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateBinding`] if the type is already configured,
    /// [`Error::InvalidService`] for placeholder values
    pub fn bind_configuration<T: Any + Send + Sync>(&mut self, value: T) -> Result<()> {
        let key = service_key::<T>();
        let shared: SharedService = Arc::new(value);
        ensure_allowed(key, Some(&shared))?;
        if self.configurations.contains_key(key) {
            return Err(Error::DuplicateBinding {
                key: key.to_string(),
            });
        }
        self.configurations.insert(key.to_string(), shared);
        Ok(())
    }

    /// Register the constructor description for a container-built type
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateBinding`] if the key already has a factory
    pub fn register_factory(&mut self, key: &str, factory: ServiceFactory) -> Result<()> {
        if self.factories.contains_key(key) {
            return Err(Error::DuplicateBinding {
                key: key.to_string(),
            });
        }
        self.factories.insert(key.to_string(), factory);
        Ok(())
    }

    /// Check whether a service key is bound
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// Get a bound service
    ///
    /// Instance bindings return the cached value; scoped bindings construct
    /// a fresh instance through the factory registry.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for unknown keys
    pub fn get(&self, key: &str) -> Result<SharedService> {
        match self.bindings.get(key) {
            Some(Binding::Instance(value)) => Ok(Arc::clone(value)),
            Some(Binding::Scoped(type_id)) => self.construct(type_id, &[]),
            None => Err(Error::NotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Get a bound service downcast to its concrete type
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for unknown keys, [`Error::InvalidService`] if the
    /// bound value is not a `T`
    pub fn get_typed<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let key = service_key::<T>();
        let value = self.get(key)?;
        value.downcast::<T>().map_err(|_| Error::InvalidService {
            key: key.to_string(),
            reason: "bound value has a different concrete type".to_string(),
        })
    }

    /// Construct a registered type, resolving its dependencies depth-first
    ///
    /// Nothing is cached: every call builds a fresh object graph. Supplied
    /// objects remain visible to nested constructions.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no factory is registered,
    /// [`Error::CircularDependency`] when construction revisits a type,
    /// [`Error::DependencyNotFound`] when a parameter cannot be satisfied
    pub fn construct(&self, key: &str, supplied: &[Supplied]) -> Result<SharedService> {
        let mut stack = Vec::new();
        self.construct_inner(key, supplied, &mut stack)
    }

    /// Resolve a constructor-style parameter list
    ///
    /// Per parameter: supplied objects first (exact key match), then
    /// configurations, then service bindings. Scoped bindings are built
    /// fresh through the registry.
    ///
    /// # Errors
    ///
    /// [`Error::DependencyNotFound`] when a parameter cannot be satisfied
    pub fn resolve_dependencies(
        &self,
        params: &[&str],
        supplied: &[Supplied],
    ) -> Result<Vec<SharedService>> {
        let mut stack = Vec::new();
        params
            .iter()
            .map(|key| self.resolve_inner(key, supplied, &mut stack))
            .collect()
    }

    fn construct_inner(
        &self,
        key: &str,
        supplied: &[Supplied],
        stack: &mut Vec<String>,
    ) -> Result<SharedService> {
        if stack.iter().any(|k| k == key) {
            return Err(Error::CircularDependency {
                key: key.to_string(),
            });
        }
        let factory = self.factories.get(key).ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })?;

        stack.push(key.to_string());
        let mut resolved = Vec::with_capacity(factory.dependencies.len());
        for dep in &factory.dependencies {
            resolved.push(self.resolve_inner(dep, supplied, stack)?);
        }
        stack.pop();

        (factory.build)(resolved)
    }

    fn resolve_inner(
        &self,
        key: &str,
        supplied: &[Supplied],
        stack: &mut Vec<String>,
    ) -> Result<SharedService> {
        if let Some(object) = supplied.iter().find(|s| s.key == key) {
            return Ok(Arc::clone(&object.value));
        }
        if let Some(config) = self.configurations.get(key) {
            return Ok(Arc::clone(config));
        }
        match self.bindings.get(key) {
            Some(Binding::Instance(value)) => Ok(Arc::clone(value)),
            Some(Binding::Scoped(type_id)) => self.construct_inner(type_id, supplied, stack),
            None => Err(Error::DependencyNotFound {
                key: key.to_string(),
            }),
        }
    }

    fn ensure_unbound(&self, key: &str) -> Result<()> {
        if self.bindings.contains_key(key) {
            return Err(Error::DuplicateBinding {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

/// Reject placeholder types that must never live in the container
///
/// The parameter bag (and the unit type) only exist per request; they reach
/// resolution as supplied objects.
fn ensure_allowed(key: &str, value: Option<&SharedService>) -> Result<()> {
    let disallowed_key = key == service_key::<ParamBag>() || key == service_key::<()>();
    let disallowed_value = value.is_some_and(|v| {
        let id = v.as_ref().type_id();
        id == TypeId::of::<ParamBag>() || id == TypeId::of::<()>()
    });
    if disallowed_key || disallowed_value {
        return Err(Error::InvalidService {
            key: key.to_string(),
            reason: "placeholder types cannot be bound".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Clock {
        epoch: u64,
    }

    #[derive(Debug)]
    struct Greeter {
        prefix: String,
    }

    #[test]
    fn test_bind_and_get() {
        let mut container = Container::new();
        container.bind(Clock { epoch: 7 }).unwrap();

        assert!(container.has(service_key::<Clock>()));
        let clock = container.get_typed::<Clock>().unwrap();
        assert_eq!(clock.epoch, 7);
    }

    #[test]
    fn test_duplicate_binding_fails() {
        let mut container = Container::new();
        container.bind(Clock { epoch: 1 }).unwrap();
        let err = container.bind(Clock { epoch: 2 }).unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding { .. }));
    }

    #[test]
    fn test_get_unknown_key_fails() {
        let container = Container::new();
        let err = container.get("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_unresolvable_dependency_fails() {
        let container = Container::new();
        let err = container
            .resolve_dependencies(&[service_key::<Clock>()], &[])
            .unwrap_err();
        assert!(matches!(err, Error::DependencyNotFound { .. }));
    }

    #[test]
    fn test_supplied_object_short_circuits_lookup() {
        let container = Container::new();
        let supplied = [Supplied::new(Clock { epoch: 99 })];
        let resolved = container
            .resolve_dependencies(&[service_key::<Clock>()], &supplied)
            .unwrap();
        let clock = resolved[0].downcast_ref::<Clock>().unwrap();
        assert_eq!(clock.epoch, 99);
    }

    #[test]
    fn test_configuration_resolved_by_type() {
        #[derive(Debug)]
        struct MailConfig {
            host: String,
        }

        let mut container = Container::new();
        container
            .bind_configuration(MailConfig {
                host: "smtp.local".to_string(),
            })
            .unwrap();

        let resolved = container
            .resolve_dependencies(&[service_key::<MailConfig>()], &[])
            .unwrap();
        let config = resolved[0].downcast_ref::<MailConfig>().unwrap();
        assert_eq!(config.host, "smtp.local");
    }

    #[test]
    fn test_duplicate_configuration_fails() {
        #[derive(Debug)]
        struct Flag(bool);

        let mut container = Container::new();
        container.bind_configuration(Flag(true)).unwrap();
        let err = container.bind_configuration(Flag(false)).unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding { .. }));
    }

    #[test]
    fn test_scoped_binding_builds_fresh_instances() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);

        let mut container = Container::new();
        container.bind(Clock { epoch: 1 }).unwrap();
        container
            .register_factory(
                service_key::<Greeter>(),
                ServiceFactory::new(vec![service_key::<Clock>().to_string()], |deps| {
                    BUILDS.fetch_add(1, Ordering::Relaxed);
                    let clock = deps[0].downcast_ref::<Clock>().unwrap();
                    Ok(Arc::new(Greeter {
                        prefix: format!("hello-{}", clock.epoch),
                    }))
                }),
            )
            .unwrap();
        container.bind_scoped(service_key::<Greeter>()).unwrap();

        let first = container.get_typed::<Greeter>().unwrap();
        let second = container.get_typed::<Greeter>().unwrap();

        assert_eq!(first.prefix, "hello-1");
        assert_eq!(second.prefix, "hello-1");
        assert_eq!(BUILDS.load(Ordering::Relaxed), 2);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_nested_construction_is_depth_first() {
        struct Inner;
        struct Outer {
            _inner: Arc<Inner>,
        }

        let mut container = Container::new();
        container
            .register_factory(
                service_key::<Inner>(),
                ServiceFactory::new(vec![], |_| Ok(Arc::new(Inner))),
            )
            .unwrap();
        container.bind_scoped(service_key::<Inner>()).unwrap();
        container
            .register_factory(
                service_key::<Outer>(),
                ServiceFactory::new(vec![service_key::<Inner>().to_string()], |deps| {
                    let inner = Arc::clone(&deps[0]).downcast::<Inner>().unwrap();
                    Ok(Arc::new(Outer { _inner: inner }))
                }),
            )
            .unwrap();
        container.bind_scoped(service_key::<Outer>()).unwrap();

        assert!(container.get_typed::<Outer>().is_ok());
    }

    #[test]
    fn test_circular_dependency_detected() {
        struct A;
        struct B;

        let mut container = Container::new();
        container
            .register_factory(
                service_key::<A>(),
                ServiceFactory::new(vec![service_key::<B>().to_string()], |_| Ok(Arc::new(A))),
            )
            .unwrap();
        container
            .register_factory(
                service_key::<B>(),
                ServiceFactory::new(vec![service_key::<A>().to_string()], |_| Ok(Arc::new(B))),
            )
            .unwrap();
        container.bind_scoped(service_key::<A>()).unwrap();
        container.bind_scoped(service_key::<B>()).unwrap();

        let err = container.get(service_key::<A>()).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    #[test]
    fn test_binding_param_bag_is_invalid() {
        let mut container = Container::new();
        let err = container.bind(ParamBag::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidService { .. }));

        let err = container.bind_configuration(ParamBag::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidService { .. }));
    }

    #[test]
    fn test_binding_unit_is_invalid() {
        let mut container = Container::new();
        let err = container.bind(()).unwrap_err();
        assert!(matches!(err, Error::InvalidService { .. }));
    }

    #[test]
    fn test_supplied_key_matches_type() {
        let supplied = Supplied::new(Clock { epoch: 3 });
        assert_eq!(supplied.key(), service_key::<Clock>());
    }
}
