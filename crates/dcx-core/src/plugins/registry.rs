//! Process-wide plugin registry: a named holder for every extension axis.
//!
//! Rust has no runtime package-metadata registry to query plugins through,
//! so discovery is explicit: a caller builds a `Vec<Box<dyn PluginFactory>>`
//! (by whatever means it wants — a config file naming linked plugin crates,
//! a build-time `inventory`-style collection, or just a literal list) and
//! passes it to `PluginRegistry::load`. `PLUGIN_GROUP` survives only as a
//! named constant for log lines and test fixtures.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::CoreError;
use crate::hooks::{ApiResponseHook, ErrorHook, RequestHook, ResponseHook};
use crate::ports::provider::{ConfigProvider, DataProvider, SchemaProvider, TransformProvider};

/// Documented name for the plugin discovery group, kept for log lines.
pub const PLUGIN_GROUP: &str = "dcx.plugins";

type AnyMap = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// Named maps for every extension axis, plus the four hook lists.
///
/// Lifecycle: `init()` is idempotent, `load()` performs discovery, and after
/// `freeze()` the registry is read-only and lookups take no lock-upgrade
/// path (all mutating methods reject once frozen).
#[derive(Default)]
pub struct PluginRegistry {
    adapters: AnyMap,
    auth_providers: AnyMap,
    pagination_providers: AnyMap,
    schema_providers: HashMap<String, Arc<dyn SchemaProvider>>,
    config_providers: HashMap<String, Arc<dyn ConfigProvider>>,
    data_providers: HashMap<String, Arc<dyn DataProvider>>,
    transform_providers: HashMap<String, Arc<dyn TransformProvider>>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
    error_hooks: Vec<Arc<dyn ErrorHook>>,
    api_response_hooks: Vec<Arc<dyn ApiResponseHook>>,
    initialized: bool,
    frozen: bool,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: calling this more than once is a no-op.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        tracing::debug!(group = PLUGIN_GROUP, "plugin registry initialized");
    }

    fn guard_mutation(&self) -> Result<(), CoreError> {
        if self.frozen {
            return Err(CoreError::Other(
                "plugin registry is frozen; cannot register".to_string(),
            ));
        }
        Ok(())
    }

    pub fn register_adapter<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        adapter: Arc<T>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.adapters.insert(name.into(), adapter);
        Ok(())
    }

    pub fn register_auth_provider<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        provider: Arc<T>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.auth_providers.insert(name.into(), provider);
        Ok(())
    }

    pub fn register_pagination_provider<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        provider: Arc<T>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.pagination_providers.insert(name.into(), provider);
        Ok(())
    }

    pub fn register_schema_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn SchemaProvider>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.schema_providers.insert(name.into(), provider);
        Ok(())
    }

    pub fn register_config_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn ConfigProvider>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.config_providers.insert(name.into(), provider);
        Ok(())
    }

    pub fn register_data_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn DataProvider>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.data_providers.insert(name.into(), provider);
        Ok(())
    }

    pub fn register_transform_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn TransformProvider>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.transform_providers.insert(name.into(), provider);
        Ok(())
    }

    pub fn register_request_hook(&mut self, hook: Arc<dyn RequestHook>) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.request_hooks.push(hook);
        Ok(())
    }

    pub fn register_response_hook(&mut self, hook: Arc<dyn ResponseHook>) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.response_hooks.push(hook);
        Ok(())
    }

    pub fn register_error_hook(&mut self, hook: Arc<dyn ErrorHook>) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.error_hooks.push(hook);
        Ok(())
    }

    pub fn register_api_response_hook(
        &mut self,
        hook: Arc<dyn ApiResponseHook>,
    ) -> Result<(), CoreError> {
        self.guard_mutation()?;
        self.api_response_hooks.push(hook);
        Ok(())
    }

    /// Discover and register every factory in `factories`. A single failing
    /// factory is logged and skipped; it does not prevent the rest from
    /// loading.
    pub fn load(&mut self, factories: Vec<Box<dyn PluginFactory>>) {
        self.init();
        for factory in factories {
            let name = factory.name();
            if let Err(err) = factory.register(self) {
                tracing::warn!(plugin = name, error = %err, "plugin registration failed");
            } else {
                tracing::debug!(plugin = name, "plugin registered");
            }
        }
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[must_use]
    pub fn get_adapter<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.adapters.get(name)?.clone().downcast::<T>().ok()
    }

    #[must_use]
    pub fn get_auth_provider<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.auth_providers.get(name)?.clone().downcast::<T>().ok()
    }

    #[must_use]
    pub fn get_schema_provider(&self, name: &str) -> Option<Arc<dyn SchemaProvider>> {
        self.schema_providers.get(name).cloned()
    }

    #[must_use]
    pub fn get_data_provider(&self, name: &str) -> Option<Arc<dyn DataProvider>> {
        self.data_providers.get(name).cloned()
    }

    #[must_use]
    pub fn request_hooks(&self) -> &[Arc<dyn RequestHook>] {
        &self.request_hooks
    }

    #[must_use]
    pub fn response_hooks(&self) -> &[Arc<dyn ResponseHook>] {
        &self.response_hooks
    }

    #[must_use]
    pub fn error_hooks(&self) -> &[Arc<dyn ErrorHook>] {
        &self.error_hooks
    }

    #[must_use]
    pub fn api_response_hooks(&self) -> &[Arc<dyn ApiResponseHook>] {
        &self.api_response_hooks
    }
}

/// A source of plugin registrations: one method per registration hook named
/// in the configuration surface's plugin entry point section. All default
/// to no-ops so a factory only implements the axes it cares about.
pub trait PluginFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Run every registration hook this factory implements against
    /// `registry`, stopping at (and propagating) the first failure.
    fn register(&self, registry: &mut PluginRegistry) -> Result<(), CoreError> {
        self.register_adapters(registry)?;
        self.register_auth_providers(registry)?;
        self.register_schema_providers(registry)?;
        self.register_config_providers(registry)?;
        self.register_data_providers(registry)?;
        self.register_transform_providers(registry)?;
        self.register_pagination_providers(registry)?;
        self.register_request_hooks(registry)?;
        self.register_response_hooks(registry)?;
        self.register_error_hooks(registry)?;
        self.register_api_response_hooks(registry)?;
        Ok(())
    }

    fn register_adapters(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_auth_providers(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_schema_providers(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_config_providers(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_data_providers(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_transform_providers(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_pagination_providers(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_request_hooks(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_response_hooks(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_error_hooks(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
    fn register_api_response_hooks(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
        Ok(())
    }
}

static GLOBAL_REGISTRY: OnceLock<RwLock<PluginRegistry>> = OnceLock::new();

/// The single process-wide registry instance, per the "the plugin registry
/// is the only mutable global the core permits" ownership rule.
pub fn global() -> &'static RwLock<PluginRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(PluginRegistry::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingFactory;
    impl PluginFactory for FailingFactory {
        fn name(&self) -> &str {
            "failing"
        }
        fn register_adapters(&self, _registry: &mut PluginRegistry) -> Result<(), CoreError> {
            Err(CoreError::Other("boom".to_string()))
        }
    }

    struct GoodFactory;
    impl PluginFactory for GoodFactory {
        fn name(&self) -> &str {
            "good"
        }
        fn register_request_hooks(&self, registry: &mut PluginRegistry) -> Result<(), CoreError> {
            use crate::hooks::builtin::LoggingHook;
            registry.register_request_hook(Arc::new(LoggingHook))
        }
    }

    #[test]
    fn one_failing_factory_does_not_block_others() {
        let mut registry = PluginRegistry::new();
        registry.load(vec![Box::new(FailingFactory), Box::new(GoodFactory)]);
        assert_eq!(registry.request_hooks().len(), 1);
    }

    #[test]
    fn frozen_registry_rejects_new_registrations() {
        let mut registry = PluginRegistry::new();
        registry.freeze();
        let err = registry.register_adapter("x", Arc::new(42i32));
        assert!(err.is_err());
    }

    #[test]
    fn typed_lookup_round_trips() {
        let mut registry = PluginRegistry::new();
        registry.register_adapter("counter", Arc::new(7i32)).unwrap();
        let value: Option<Arc<i32>> = registry.get_adapter("counter");
        assert_eq!(*value.unwrap(), 7);
    }
}
