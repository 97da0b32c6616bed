//! Injected extension points: custom widgets, custom fields and templates.
//!
//! Registries are plain values handed to the form at construction; there is
//! no global state. Each entry is a trait object producing the host's output
//! type `O`. Closures with the matching signature implement the traits.

use std::{collections::HashMap, fmt, sync::Arc};

use super::{FieldProps, TemplateProps, WidgetProps};

/// Renders one leaf value with the full widget contract.
pub trait CustomWidget<O> {
    fn render(&self, props: WidgetProps<'_>) -> O;
}

/// A fuller leaf renderer that reports changes with a value-only callback.
pub trait CustomField<O> {
    fn render(&self, props: FieldProps<'_>) -> O;
}

/// Page chrome wrapping the rendered content.
pub trait Template<O> {
    fn render(&self, props: TemplateProps<'_, O>) -> O;
}

impl<O, F> CustomWidget<O> for F
where
    F: Fn(WidgetProps<'_>) -> O,
{
    fn render(&self, props: WidgetProps<'_>) -> O {
        self(props)
    }
}

impl<O, F> CustomField<O> for F
where
    F: Fn(FieldProps<'_>) -> O,
{
    fn render(&self, props: FieldProps<'_>) -> O {
        self(props)
    }
}

impl<O, F> Template<O> for F
where
    F: Fn(TemplateProps<'_, O>) -> O,
{
    fn render(&self, props: TemplateProps<'_, O>) -> O {
        self(props)
    }
}

/// Name to component lookup table.
pub struct Registry<T: ?Sized> {
    entries: HashMap<String, Arc<T>>,
}

/// Custom widgets by widget kind.
pub type WidgetRegistry<O> = Registry<dyn CustomWidget<O>>;

/// Custom fields by `ui:field` name.
pub type FieldRegistry<O> = Registry<dyn CustomField<O>>;

/// Templates by `template` name.
pub type TemplateRegistry<O> = Registry<dyn Template<O>>;

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, component: Arc<T>) {
        self.entries.insert(name.into(), component);
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<O> Registry<dyn CustomWidget<O>> {
    /// Builder-style registration of a widget.
    pub fn with(mut self, name: impl Into<String>, widget: impl CustomWidget<O> + 'static) -> Self {
        self.insert(name, Arc::new(widget));
        self
    }
}

impl<O> Registry<dyn CustomField<O>> {
    /// Builder-style registration of a field.
    pub fn with(mut self, name: impl Into<String>, field: impl CustomField<O> + 'static) -> Self {
        self.insert(name, Arc::new(field));
        self
    }
}

impl<O> Registry<dyn Template<O>> {
    /// Builder-style registration of a template.
    pub fn with(mut self, name: impl Into<String>, template: impl Template<O> + 'static) -> Self {
        self.insert(name, Arc::new(template));
        self
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}
