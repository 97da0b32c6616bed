//! Field and widget resolution.
//!
//! For every schema node this module decides which rendering strategy
//! applies and computes the per-field presentation attributes (label
//! visibility, classes, required marker). Drawing is delegated to a host
//! [`Backend`], so the crate stays independent of any UI toolkit. Custom
//! components come from the registries in [`registry`].
//!
//! Resolution order for a leaf:
//!
//! 1. `ui:field` naming an entry of the field registry
//! 2. the built-in control table, keyed by `ui:widget || format || type`
//! 3. the widget registry, keyed by the same widget kind
//! 4. an inline "unsupported field schema" notice
//!
//! Object nodes always render as a group of their properties.

use indexmap::IndexSet;

use crate::{
    data::{
        FlatState, UiNode, UiSchema,
        schema::{Choice, SchemaNode},
        ui::{LayoutEntry, LayoutSection, ResetButtonOptions, SubmitButtonOptions, UiOptions},
        walker::{collect_required_paths, find_field_schema_by_name, join_path, short_name},
    },
    validate::ErrorMap,
    value::FormValue,
};

/// Custom component traits and registries.
pub mod registry;

/// Plain-text outline backend.
pub mod text;

pub use registry::{
    CustomField, CustomWidget, FieldRegistry, Registry, Template, TemplateRegistry, WidgetRegistry,
};

/// Built-in control kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Text,
    AltDate,
    Password,
    Email,
    File,
    Button,
    Calendar,
    Checkboxes,
    Date,
    DateRange,
    DateTime,
    Day,
    Month,
    Progress,
    Radio,
    Range,
    Select,
    Time,
    UpDown,
    Year,
    TextArea,
    Hidden,
}

impl ControlKind {
    /// Look up a widget kind in the built-in table.
    pub fn from_widget(kind: &str) -> Option<Self> {
        let control = match kind {
            "string" | "text" | "TextWidget" => ControlKind::Text,
            "alt-date" => ControlKind::AltDate,
            "password" => ControlKind::Password,
            "email" => ControlKind::Email,
            "file" => ControlKind::File,
            "button" => ControlKind::Button,
            "calendar" => ControlKind::Calendar,
            "checkboxes" => ControlKind::Checkboxes,
            "date" => ControlKind::Date,
            "daterange" => ControlKind::DateRange,
            "datetime" => ControlKind::DateTime,
            "day" => ControlKind::Day,
            "month" => ControlKind::Month,
            "progress" => ControlKind::Progress,
            "radio" | "numberEnum" => ControlKind::Radio,
            "range" => ControlKind::Range,
            "select" => ControlKind::Select,
            "time" => ControlKind::Time,
            "UpDownWidget" | "updown" | "number" => ControlKind::UpDown,
            "year" => ControlKind::Year,
            "textarea" => ControlKind::TextArea,
            "hidden" => ControlKind::Hidden,
            _ => return None,
        };
        Some(control)
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::AltDate => "alt-date",
            ControlKind::Password => "password",
            ControlKind::Email => "email",
            ControlKind::File => "file",
            ControlKind::Button => "button",
            ControlKind::Calendar => "calendar",
            ControlKind::Checkboxes => "checkboxes",
            ControlKind::Date => "date",
            ControlKind::DateRange => "daterange",
            ControlKind::DateTime => "datetime",
            ControlKind::Day => "day",
            ControlKind::Month => "month",
            ControlKind::Progress => "progress",
            ControlKind::Radio => "radio",
            ControlKind::Range => "range",
            ControlKind::Select => "select",
            ControlKind::Time => "time",
            ControlKind::UpDown => "updown",
            ControlKind::Year => "year",
            ControlKind::TextArea => "textarea",
            ControlKind::Hidden => "hidden",
        }
    }
}

/// Something a control asks the form to do.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    Change { path: String, value: FormValue },
    Submit,
    Reset,
}

/// A callback bound to one field path.
///
/// Custom fields and widgets only ever see values; the handle carries the
/// path for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHandle {
    path: String,
}

impl ActionHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn change(&self, value: impl Into<FormValue>) -> FormAction {
        FormAction::Change {
            path: self.path.clone(),
            value: value.into(),
        }
    }

    pub fn submit(&self) -> FormAction {
        FormAction::Submit
    }
}

/// Props for a built-in control.
#[derive(Debug)]
pub struct ControlProps<'a> {
    pub schema: &'a SchemaNode,
    /// Presentation entry of this field.
    pub ui: UiNode,
    /// The whole presentation schema.
    pub ui_schema: &'a UiSchema,
    pub form_data: &'a FlatState,
    pub errors: &'a ErrorMap,
    pub field_path: String,
    pub field_class: String,
    pub title: Option<&'a str>,
    pub layout_class: String,
    pub is_required: bool,
    pub show_label: bool,
    pub choices: Vec<Choice>,
    pub on_change: ActionHandle,
}

impl ControlProps<'_> {
    /// Current value of this field.
    pub fn value(&self) -> Option<&FormValue> {
        self.form_data.get(&self.field_path)
    }

    /// Errors reported for this field.
    pub fn field_errors(&self) -> &[String] {
        self.errors
            .get(&self.field_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Label text: the title, or the path when untitled.
    pub fn label(&self) -> &str {
        self.title.unwrap_or(&self.field_path)
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.ui.placeholder.as_deref()
    }
}

/// Props for a custom field (`ui:field`).
pub struct FieldProps<'a> {
    pub ui: &'a UiNode,
    pub on_change: ActionHandle,
    pub value: Option<&'a FormValue>,
    pub options: &'a UiOptions,
}

/// Props for a custom widget from the widget registry.
pub struct WidgetProps<'a> {
    pub schema: &'a SchemaNode,
    pub ui: &'a UiNode,
    pub field_path: &'a str,
    pub value: Option<&'a FormValue>,
    pub on_change: ActionHandle,
    pub errors: &'a [String],
    pub placeholder: Option<&'a str>,
    pub options: &'a UiOptions,
}

/// Label and error frame drawn around custom widgets.
#[derive(Debug)]
pub struct FrameProps<'a> {
    pub layout_class: &'a str,
    /// Present when a label should be shown.
    pub label: Option<&'a str>,
    pub is_required: bool,
    pub errors: &'a [String],
}

/// A nested object rendered as a group.
#[derive(Debug)]
pub struct GroupProps<'a> {
    pub field_path: &'a str,
    pub name: &'a str,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub title_class: String,
    pub class_name: Option<&'a str>,
    pub is_required: bool,
}

/// A layout section.
#[derive(Debug)]
pub struct SectionProps<'a> {
    pub title: Option<&'a str>,
    pub class_names: Option<&'a str>,
    /// Sections inside sections.
    pub nested: bool,
}

/// Props handed to the page chrome.
pub struct TemplateProps<'a, O> {
    pub schema: &'a SchemaNode,
    pub ui: &'a UiSchema,
    pub content: O,
    pub submit_button: &'a SubmitButtonOptions,
    pub reset_button: &'a ResetButtonOptions,
}

impl<O> TemplateProps<'_, O> {
    pub fn on_submit(&self) -> FormAction {
        FormAction::Submit
    }

    pub fn on_reset(&self) -> FormAction {
        FormAction::Reset
    }
}

/// Host drawing surface.
pub trait Backend {
    type Output;

    /// Draw a built-in control.
    fn control(&self, kind: ControlKind, props: &ControlProps<'_>) -> Self::Output;

    /// Wrap a custom widget with its label and errors.
    fn widget_frame(&self, frame: &FrameProps<'_>, inner: Self::Output) -> Self::Output;

    /// Wrap a custom field in its layout container.
    fn field_frame(&self, layout_class: &str, inner: Self::Output) -> Self::Output;

    /// Inline notice for a field that cannot be resolved.
    fn unsupported(&self, field: &str) -> Self::Output;

    fn group(&self, group: &GroupProps<'_>, children: Vec<Self::Output>) -> Self::Output;

    fn section(&self, section: &SectionProps<'_>, children: Vec<Self::Output>) -> Self::Output;

    /// Container around all top-level fields or sections.
    fn content(&self, children: Vec<Self::Output>) -> Self::Output;

    /// Default page chrome, used when no template is selected.
    fn page(&self, props: TemplateProps<'_, Self::Output>) -> Self::Output;
}

/// The strategy chosen for one schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Group,
    CustomField(String),
    Builtin(ControlKind),
    CustomWidget(String),
    Unsupported,
}

/// `ui:widget || format || type || "string"`.
pub fn widget_kind<'a>(node: &'a SchemaNode, ui: &'a UiNode) -> &'a str {
    ui.widget
        .as_deref()
        .or(node.format.as_deref())
        .or(node.type_name.as_deref())
        .unwrap_or("string")
}

/// Pick the rendering strategy for a node.
pub fn resolve_strategy<O>(
    node: &SchemaNode,
    ui: &UiNode,
    widgets: &WidgetRegistry<O>,
    fields: &FieldRegistry<O>,
) -> Strategy {
    if node.is_object() {
        return Strategy::Group;
    }
    if let Some(name) = ui.field.as_deref()
        && fields.contains(name)
    {
        return Strategy::CustomField(name.to_string());
    }
    let kind = widget_kind(node, ui);
    if let Some(control) = ControlKind::from_widget(kind) {
        return Strategy::Builtin(control);
    }
    if widgets.contains(kind) {
        return Strategy::CustomWidget(kind.to_string());
    }
    Strategy::Unsupported
}

/// Everything a recursive render needs, passed down explicitly.
pub struct RenderContext<'a, O> {
    pub schema: &'a SchemaNode,
    pub ui: &'a UiSchema,
    pub form_data: &'a FlatState,
    pub errors: &'a ErrorMap,
    pub widgets: &'a WidgetRegistry<O>,
    pub fields: &'a FieldRegistry<O>,
    pub templates: &'a TemplateRegistry<O>,
    required: IndexSet<String>,
}

impl<'a, O> RenderContext<'a, O> {
    pub fn new(
        schema: &'a SchemaNode,
        ui: &'a UiSchema,
        form_data: &'a FlatState,
        errors: &'a ErrorMap,
        widgets: &'a WidgetRegistry<O>,
        fields: &'a FieldRegistry<O>,
        templates: &'a TemplateRegistry<O>,
    ) -> Self {
        Self {
            schema,
            ui,
            form_data,
            errors,
            widgets,
            fields,
            templates,
            required: collect_required_paths(schema),
        }
    }

    pub fn is_required(&self, path: &str) -> bool {
        self.required.contains(path)
    }

    /// Render the whole form, wrapped in the selected template or the
    /// backend's default page.
    pub fn render_page<B: Backend<Output = O>>(&self, backend: &B) -> O {
        let content = self.render_content(backend);
        let props = TemplateProps {
            schema: self.schema,
            ui: self.ui,
            content,
            submit_button: &self.ui.submit_button,
            reset_button: &self.ui.reset_button,
        };

        match self.ui.template.as_deref() {
            Some(name) => match self.templates.get(name) {
                Some(template) => template.render(props),
                None => {
                    warn!("template `{name}` is not registered, using the default page");
                    backend.page(props)
                }
            },
            None => backend.page(props),
        }
    }

    /// Render all fields, following `layout` when one is declared.
    pub fn render_content<B: Backend<Output = O>>(&self, backend: &B) -> O {
        let children = if self.ui.layout.is_empty() {
            self.schema
                .properties()
                .into_iter()
                .flatten()
                .map(|(name, node)| self.render_field(backend, node, name))
                .collect()
        } else {
            self.ui
                .layout
                .iter()
                .map(|section| self.render_section(backend, section, false))
                .collect()
        };
        backend.content(children)
    }

    fn render_section<B: Backend<Output = O>>(
        &self,
        backend: &B,
        section: &LayoutSection,
        nested: bool,
    ) -> O {
        let children = section
            .fields
            .iter()
            .map(|entry| match entry {
                LayoutEntry::Field(path) => {
                    match find_field_schema_by_name(self.schema, short_name(path)) {
                        Some(node) => self.render_field(backend, node, path),
                        None => backend.unsupported(path),
                    }
                }
                LayoutEntry::Section(inner) if inner.kind.as_deref() == Some("section") => {
                    self.render_section(backend, inner, true)
                }
                LayoutEntry::Section(_) | LayoutEntry::Invalid(_) => {
                    warn!("ignoring malformed layout entry: {entry:?}");
                    backend.unsupported("<layout entry>")
                }
            })
            .collect();

        let props = SectionProps {
            title: section.title.as_deref(),
            class_names: section.class_names.as_deref(),
            nested,
        };
        backend.section(&props, children)
    }

    /// Render one node found at `path`.
    pub fn render_field<B: Backend<Output = O>>(
        &self,
        backend: &B,
        node: &'a SchemaNode,
        path: &str,
    ) -> O {
        let ui = self.ui.node(path);
        let name = short_name(path);
        let layout_class = match ui.class_name.as_deref() {
            Some(class) => format!("form-group {class}"),
            None => "form-group".to_string(),
        };
        let show_label = ui.options.label != Some(false);
        let is_required = self.is_required(path);

        match resolve_strategy(node, &ui, self.widgets, self.fields) {
            Strategy::Group => {
                let children = node
                    .properties()
                    .into_iter()
                    .flatten()
                    .map(|(key, child)| self.render_field(backend, child, &join_path(path, key)))
                    .collect();
                let group = GroupProps {
                    field_path: path,
                    name,
                    title: node.title.as_deref(),
                    description: node.description.as_deref(),
                    title_class: match ui.title_class.as_deref() {
                        Some(class) => format!("{class} mt-2"),
                        None => "mt-2".to_string(),
                    },
                    class_name: ui.class_name.as_deref(),
                    is_required,
                };
                backend.group(&group, children)
            }
            Strategy::CustomField(field_name) => {
                let Some(field) = self.fields.get(&field_name) else {
                    return backend.unsupported(name);
                };
                let inner = field.render(FieldProps {
                    ui: &ui,
                    on_change: ActionHandle::new(path),
                    value: self.form_data.get(path),
                    options: &ui.options,
                });
                backend.field_frame(&layout_class, inner)
            }
            Strategy::Builtin(kind) => {
                let field_class = match ui.options.class_name.as_deref() {
                    Some(class) => format!("form-control {class}"),
                    None => "form-control".to_string(),
                };
                let props = ControlProps {
                    schema: node,
                    ui_schema: self.ui,
                    form_data: self.form_data,
                    errors: self.errors,
                    field_path: path.to_string(),
                    field_class,
                    title: node.title.as_deref(),
                    layout_class,
                    is_required,
                    show_label,
                    choices: node.choices(),
                    on_change: ActionHandle::new(path),
                    ui,
                };
                backend.control(kind, &props)
            }
            Strategy::CustomWidget(kind) => {
                let Some(widget) = self.widgets.get(&kind) else {
                    return backend.unsupported(name);
                };
                let errors = self
                    .errors
                    .get(path)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let inner = widget.render(WidgetProps {
                    schema: node,
                    ui: &ui,
                    field_path: path,
                    value: self.form_data.get(path),
                    on_change: ActionHandle::new(path),
                    errors,
                    placeholder: ui.placeholder.as_deref(),
                    options: &ui.options,
                });
                let frame = FrameProps {
                    layout_class: &layout_class,
                    label: node.title.as_deref().filter(|_| show_label),
                    is_required,
                    errors,
                };
                backend.widget_frame(&frame, inner)
            }
            Strategy::Unsupported => {
                warn!(
                    "unsupported field schema for `{path}` (widget kind `{}`)",
                    widget_kind(node, &ui)
                );
                backend.unsupported(name)
            }
        }
    }
}
