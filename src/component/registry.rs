use super::{Capability, ComponentSchema, OptionHandler, SchemaComponent, catalog};
use crate::error::ComponentError;
use crate::options::split_component;
use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Creates a default-configured instance of one component type.
pub type ComponentFactory =
    Arc<dyn Fn(&ComponentRegistry) -> Result<Box<dyn OptionHandler>, ComponentError> + Send + Sync>;

/// A registered component type: its name, capability tags and factory.
#[derive(Clone)]
pub struct ComponentEntry {
    type_name: String,
    capabilities: Vec<Capability>,
    factory: ComponentFactory,
}

impl ComponentEntry {
    pub fn new<F>(type_name: impl Into<String>, capabilities: &[Capability], factory: F) -> Self
    where
        F: Fn(&ComponentRegistry) -> Result<Box<dyn OptionHandler>, ComponentError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            type_name: type_name.into(),
            capabilities: capabilities.to_vec(),
            factory: Arc::new(factory),
        }
    }

    /// An entry whose instances are [`SchemaComponent`]s built from `schema`.
    pub fn from_schema(schema: &'static ComponentSchema) -> Self {
        Self::new(schema.type_name, schema.capabilities, move |registry| {
            SchemaComponent::new(schema, registry).map(|c| Box::new(c) as Box<dyn OptionHandler>)
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Maps type names to component factories.
///
/// Type resolution goes through the registry only: a value "names a type" exactly when its
/// first token is a registered type name.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    entries: AHashMap<String, ComponentEntry>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("component_count", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with the reference catalog.
    pub fn with_default_components() -> Self {
        let mut registry = Self::new();
        catalog::register_default_components(&mut registry);
        registry
    }

    /// Registers a component type, returning the entry it replaced, if any.
    pub fn register(&mut self, entry: ComponentEntry) -> Option<ComponentEntry> {
        let type_name = entry.type_name.clone();
        debug!(component = %type_name, "Registering component");
        let previous = self.entries.insert(type_name.clone(), entry);
        if previous.is_some() {
            warn!(component = %type_name, "Component replaced in registry");
        }
        previous
    }

    pub fn resolve(&self, type_name: &str) -> Option<&ComponentEntry> {
        self.entries.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered type names in lexical order.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates a default-configured component.
    pub fn create(&self, type_name: &str) -> Result<Box<dyn OptionHandler>, ComponentError> {
        let entry = self
            .resolve(type_name)
            .ok_or_else(|| ComponentError::UnknownType(type_name.to_string()))?;
        (entry.factory)(self)
    }

    /// Instantiates a component and applies `options` to it.
    pub fn create_with_options(
        &self,
        type_name: &str,
        options: &[String],
    ) -> Result<Box<dyn OptionHandler>, ComponentError> {
        let mut component = self.create(type_name)?;
        component.set_options(options, self)?;
        Ok(component)
    }

    /// Instantiates a component from its single-token form, e.g. `"RBFKernel -G 0.1"`.
    pub fn create_from_spec(&self, spec: &str) -> Result<Box<dyn OptionHandler>, ComponentError> {
        let (type_name, options) =
            split_component(spec)?.ok_or(ComponentError::EmptySpecification)?;
        self.create_with_options(&type_name, &options)
    }
}
