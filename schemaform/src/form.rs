//! The form controller.
//!
//! [`FormController`] owns the flat edit state and the error state, and
//! exposes the change/submit/reset operations the rendered controls call
//! back into. It is built with a [`FormBuilder`].

use std::{collections::HashMap, fmt, sync::Arc};

use serde::Serialize;

use crate::{
    data::{
        FlatState, SchemaNode, UiSchema, build_defaults, flatten, normalize, unflatten,
        walker::{find_field_schema_by_name, resolve_schema_at_path, short_name},
    },
    error::Result,
    file::{FileRead, FileReadResult, FileReads, RawFile},
    render::{
        Backend, FieldRegistry, FormAction, RenderContext, TemplateRegistry, WidgetRegistry,
    },
    validate::{ErrorMap, Validation, Validator},
    value::FormValue,
};

/// Payload handed to the change and submit callbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormData {
    #[serde(rename = "formData")]
    pub form_data: FormValue,
}

/// A submit event coming from the host.
#[derive(Debug, Clone, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A reset event coming from the host.
#[derive(Debug, Clone, Default)]
pub struct ResetEvent;

/// Called with the nested data and the event, after a successful validation.
pub type SubmitCallback = Arc<dyn Fn(&FormData, Option<&SubmitEvent>) + Send + Sync>;

/// Called once per reset.
pub type ResetCallback = Arc<dyn Fn(Option<&ResetEvent>) + Send + Sync>;

/// Called with the nested data after every field change.
pub type ChangeCallback = Arc<dyn Fn(&FormData) + Send + Sync>;

/// Success and error notifications.
pub type NotifyCallback = Arc<dyn Fn() + Send + Sync>;

/// Host collaborators. Unset callbacks are no-ops.
#[derive(Clone)]
pub struct Callbacks {
    pub on_submit: SubmitCallback,
    pub on_reset: ResetCallback,
    pub on_change: ChangeCallback,
    pub on_success: NotifyCallback,
    pub on_error: NotifyCallback,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            on_submit: Arc::new(|_, _| {}),
            on_reset: Arc::new(|_| {}),
            on_change: Arc::new(|_| {}),
            on_success: Arc::new(|| {}),
            on_error: Arc::new(|| {}),
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

/// Something that can take input focus, registered per field path.
pub trait FocusTarget {
    fn focus(&mut self);
}

impl<F: FnMut()> FocusTarget for F {
    fn focus(&mut self) {
        self()
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation passed and `on_submit` was called with this data.
    Submitted(FormData),
    /// Validation failed; nothing was submitted.
    Rejected(Validation),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// Configures and builds a [`FormController`].
pub struct FormBuilder<O = Vec<String>> {
    schema: SchemaNode,
    ui: UiSchema,
    widgets: WidgetRegistry<O>,
    fields: FieldRegistry<O>,
    templates: TemplateRegistry<O>,
    form_data: Option<Arc<FormValue>>,
    callbacks: Callbacks,
}

impl<O> FormBuilder<O> {
    pub fn new(schema: SchemaNode) -> Self {
        Self {
            schema,
            ui: UiSchema::default(),
            widgets: WidgetRegistry::new(),
            fields: FieldRegistry::new(),
            templates: TemplateRegistry::new(),
            form_data: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Builder from raw JSON documents. `ui` may be `null`.
    pub fn from_json(schema: &serde_json::Value, ui: &serde_json::Value) -> Result<Self> {
        Ok(Self::new(SchemaNode::parse(schema)?).ui_schema(UiSchema::parse(ui)?))
    }

    pub fn ui_schema(mut self, ui: UiSchema) -> Self {
        self.ui = ui;
        self
    }

    pub fn widgets(mut self, widgets: WidgetRegistry<O>) -> Self {
        self.widgets = widgets;
        self
    }

    pub fn fields(mut self, fields: FieldRegistry<O>) -> Self {
        self.fields = fields;
        self
    }

    pub fn templates(mut self, templates: TemplateRegistry<O>) -> Self {
        self.templates = templates;
        self
    }

    /// Prefilled nested data.
    pub fn form_data(mut self, data: impl Into<Arc<FormValue>>) -> Self {
        self.form_data = Some(data.into());
        self
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn on_submit(
        mut self,
        f: impl Fn(&FormData, Option<&SubmitEvent>) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_submit = Arc::new(f);
        self
    }

    pub fn on_reset(mut self, f: impl Fn(Option<&ResetEvent>) + Send + Sync + 'static) -> Self {
        self.callbacks.on_reset = Arc::new(f);
        self
    }

    pub fn on_change(mut self, f: impl Fn(&FormData) + Send + Sync + 'static) -> Self {
        self.callbacks.on_change = Arc::new(f);
        self
    }

    pub fn on_success(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_success = Arc::new(f);
        self
    }

    pub fn on_error(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Arc::new(f);
        self
    }

    pub fn build(self) -> FormController<O> {
        let defaults = build_defaults(&self.schema);
        let mut form = FormController {
            schema: self.schema,
            ui: self.ui,
            widgets: self.widgets,
            fields: self.fields,
            templates: self.templates,
            callbacks: self.callbacks,
            defaults,
            form_data: None,
            state: FlatState::new(),
            errors: ErrorMap::new(),
            field_refs: HashMap::new(),
            file_reads: FileReads::default(),
        };
        form.load(self.form_data);
        form
    }
}

/// Live form: edit state, errors and the operations acting on them.
pub struct FormController<O = Vec<String>> {
    schema: SchemaNode,
    ui: UiSchema,
    widgets: WidgetRegistry<O>,
    fields: FieldRegistry<O>,
    templates: TemplateRegistry<O>,
    callbacks: Callbacks,
    defaults: FormValue,
    form_data: Option<Arc<FormValue>>,
    state: FlatState,
    errors: ErrorMap,
    field_refs: HashMap<String, Box<dyn FocusTarget>>,
    file_reads: FileReads,
}

impl<O> FormController<O> {
    pub fn builder(schema: SchemaNode) -> FormBuilder<O> {
        FormBuilder::new(schema)
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn ui_schema(&self) -> &UiSchema {
        &self.ui
    }

    /// The flat edit state.
    pub fn state(&self) -> &FlatState {
        &self.state
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// The nested output tree built from the current state.
    pub fn output(&self) -> FormValue {
        unflatten(&self.state, &self.schema)
    }

    pub fn form_data(&self) -> FormData {
        FormData {
            form_data: self.output(),
        }
    }

    /// Replace the prefilled data.
    ///
    /// Passing the same `Arc` again is a no-op; any other value replaces
    /// the whole edit state with defaults merged with the new data.
    pub fn set_form_data(&mut self, data: Arc<FormValue>) {
        if let Some(current) = &self.form_data
            && Arc::ptr_eq(current, &data)
        {
            return;
        }
        self.load(Some(data));
    }

    fn load(&mut self, data: Option<Arc<FormValue>>) {
        let mut merged = self.defaults.clone();
        if let (Some(target), Some(FormValue::Object(prefilled))) =
            (merged.as_object_mut(), data.as_deref())
        {
            for (key, value) in prefilled {
                target.insert(key.clone(), value.clone());
            }
        }
        let normalized = normalize(&self.schema, &merged, &self.ui);
        self.state = flatten(&normalized);
        self.form_data = data;
        self.file_reads.clear();
        debug!("form data loaded, {} field(s) in edit state", self.state.len());
    }

    fn field_schema(&self, path: &str) -> Option<&SchemaNode> {
        resolve_schema_at_path(&self.schema, path)
            .or_else(|| find_field_schema_by_name(&self.schema, short_name(path)))
    }

    /// Store a new value for one field.
    ///
    /// Array fields only take arrays, anything else becomes `[]`. Other
    /// fields store falsy input (`null`, `""`, `0`, `false`) as `null`.
    pub fn on_field_change(&mut self, path: &str, value: impl Into<FormValue>) {
        let value = value.into();
        let is_array = self.field_schema(path).is_some_and(SchemaNode::is_array);
        let value = match value {
            FormValue::Array(items) => FormValue::Array(items),
            _ if is_array => FormValue::Array(Vec::new()),
            v if v.is_falsy() => FormValue::Null,
            other => other,
        };

        debug!("field `{path}` changed");
        self.state.insert(path.to_string(), value);
        (self.callbacks.on_change)(&self.form_data());
        self.errors.shift_remove(path);
    }

    /// Validate the current state without submitting.
    pub fn validate(&self) -> Validation {
        Validator::new(&self.schema, &self.ui).validate(&self.state)
    }

    /// Handle a submit event.
    pub fn on_submit(&mut self, mut event: Option<&mut SubmitEvent>) -> SubmitOutcome {
        if let Some(event) = event.as_deref_mut() {
            event.prevent_default();
        }

        let validation = self.validate();
        self.errors = validation.errors.clone();

        if !validation.is_valid() {
            debug!("submit rejected: {} invalid field(s)", validation.errors.len());
            (self.callbacks.on_error)();
            if let Some(path) = validation.first_error_path()
                && let Some(target) = self.field_refs.get_mut(path)
            {
                target.focus();
            }
            return SubmitOutcome::Rejected(validation);
        }

        (self.callbacks.on_success)();
        let data = self.form_data();
        (self.callbacks.on_submit)(&data, event.as_deref());
        debug!("form submitted");
        SubmitOutcome::Submitted(data)
    }

    /// Imperative submit, without an event.
    pub fn submit(&mut self) -> SubmitOutcome {
        self.on_submit(None)
    }

    /// Handle a reset event: the edit state is emptied, defaults included.
    pub fn on_reset(&mut self, event: Option<&ResetEvent>) {
        self.state.clear();
        self.file_reads.clear();
        (self.callbacks.on_reset)(event);
        debug!("form reset");
    }

    /// Imperative reset, without an event.
    pub fn reset(&mut self) {
        self.on_reset(None)
    }

    /// Register the focus target of a field, used to focus the first
    /// failing field after a rejected submit.
    pub fn register_field_ref(&mut self, path: impl Into<String>, target: Box<dyn FocusTarget>) {
        self.field_refs.insert(path.into(), target);
    }

    /// Apply an action produced by a rendered control.
    pub fn dispatch(&mut self, action: FormAction) -> Option<SubmitOutcome> {
        match action {
            FormAction::Change { path, value } => {
                self.on_field_change(&path, value);
                None
            }
            FormAction::Submit => Some(self.submit()),
            FormAction::Reset => {
                self.reset();
                None
            }
        }
    }

    /// A file was picked for `path`.
    ///
    /// Fields asking for base64 output get a pending `null` and a read
    /// ticket to complete with [`FormController::complete_file_read`];
    /// other fields store the raw file directly.
    pub fn select_file(&mut self, path: &str, file: RawFile) -> Option<FileRead> {
        if self.ui.node(path).options.wants_base64() {
            self.on_field_change(path, FormValue::Null);
            Some(self.file_reads.begin(path, file))
        } else {
            self.file_reads.cancel(path);
            self.on_field_change(path, file);
            None
        }
    }

    /// Store a finished read. Stale results are dropped and `false` returned.
    pub fn complete_file_read(&mut self, result: FileReadResult) -> bool {
        if !self.file_reads.finish(&result) {
            debug!("dropping superseded file read for `{}`", result.path);
            return false;
        }
        self.on_field_change(&result.path, result.data_url);
        true
    }

    /// Render the form with `backend`.
    pub fn render<B: Backend<Output = O>>(&self, backend: &B) -> O {
        RenderContext::new(
            &self.schema,
            &self.ui,
            &self.state,
            &self.errors,
            &self.widgets,
            &self.fields,
            &self.templates,
        )
        .render_page(backend)
    }
}

impl<O> fmt::Debug for FormController<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("state", &self.state)
            .field("errors", &self.errors)
            .field("widgets", &self.widgets)
            .field("fields", &self.fields)
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::TextBackend;
    use serde_json::json;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    fn schema() -> SchemaNode {
        SchemaNode::parse(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "default": "anon"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "when": {"type": "string", "format": "date"},
                "address": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_then_prefilled() {
        let form: FormController = FormBuilder::new(schema()).build();
        assert_eq!(form.state().get("name"), Some(&FormValue::from("anon")));

        let prefilled = FormValue::from(json!({
            "when": "2024-03-05T10:00:00Z",
            "address": {"city": "Oslo"},
            "extra": 1
        }));
        let form: FormController = FormBuilder::new(schema()).form_data(prefilled).build();
        assert_eq!(form.state().get("name"), Some(&FormValue::from("anon")));
        assert_eq!(form.state().get("when"), Some(&FormValue::from("2024-03-05")));
        assert_eq!(form.state().get("address.city"), Some(&FormValue::from("Oslo")));
        assert_eq!(form.state().get("extra"), Some(&FormValue::from(1i64)));
    }

    #[test]
    fn test_set_form_data_identity() {
        let mut form: FormController = FormBuilder::new(schema()).build();
        let data = Arc::new(FormValue::from(json!({"name": "zed"})));
        form.set_form_data(data.clone());
        assert_eq!(form.state().get("name"), Some(&FormValue::from("zed")));

        form.on_field_change("name", "edited");
        // 同一个 Arc 不会覆盖编辑状态
        form.set_form_data(data.clone());
        assert_eq!(form.state().get("name"), Some(&FormValue::from("edited")));

        form.set_form_data(Arc::new(FormValue::from(json!({"name": "zed"}))));
        assert_eq!(form.state().get("name"), Some(&FormValue::from("zed")));
    }

    #[test]
    fn test_field_change_coercion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut form: FormController = FormBuilder::new(schema())
            .on_change(move |data| sink.lock().unwrap().push(data.clone()))
            .build();

        form.on_field_change("tags", "oops");
        assert_eq!(form.state().get("tags"), Some(&FormValue::Array(vec![])));

        form.on_field_change("tags", vec!["x", "y"]);
        assert_eq!(form.state().get("tags"), Some(&FormValue::from(vec!["x", "y"])));

        form.on_field_change("name", "");
        assert_eq!(form.state().get("name"), Some(&FormValue::Null));

        // 0 和 false 也按空值处理
        form.on_field_change("address.city", 0i64);
        assert_eq!(form.state().get("address.city"), Some(&FormValue::Null));

        form.on_field_change("name", false);
        assert_eq!(form.state().get("name"), Some(&FormValue::Null));

        form.on_field_change("name", "zoe");
        assert_eq!(form.state().get("name"), Some(&FormValue::from("zoe")));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        let last = serde_json::to_value(&seen[5]).unwrap();
        assert_eq!(last["formData"]["name"], json!("zoe"));
        assert_eq!(last["formData"]["address"]["city"], json!(null));
    }

    #[test]
    fn test_submit_gating_and_error_clearing() {
        let submits = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let (s, e) = (submits.clone(), errors.clone());
        let focused = Arc::new(AtomicUsize::new(0));
        let f = focused.clone();

        let mut form: FormController = FormBuilder::new(schema())
            .on_submit(move |_, _| {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move || {
                e.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        form.register_field_ref(
            "name",
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        );

        form.on_field_change("name", "");
        let mut event = SubmitEvent::default();
        let outcome = form.on_submit(Some(&mut event));
        assert!(event.default_prevented());
        assert!(!outcome.is_submitted());
        assert_eq!(submits.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(focused.load(Ordering::SeqCst), 1);
        assert!(form.errors().contains_key("name"));

        form.on_field_change("name", "ann");
        assert!(!form.errors().contains_key("name"));

        let outcome = form.submit();
        assert!(outcome.is_submitted());
        assert_eq!(submits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_and_dispatch() {
        let resets = Arc::new(AtomicUsize::new(0));
        let r = resets.clone();
        let mut form: FormController = FormBuilder::new(schema())
            .on_reset(move |_| {
                r.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        assert!(!form.state().is_empty());

        form.dispatch(FormAction::Reset);
        assert!(form.state().is_empty());
        assert_eq!(resets.load(Ordering::SeqCst), 1);

        form.dispatch(FormAction::Change {
            path: "name".into(),
            value: "bo".into(),
        });
        let outcome = form.dispatch(FormAction::Submit).unwrap();
        assert!(outcome.is_submitted());
    }

    #[test]
    fn test_select_file() {
        let ui = UiSchema::parse(&json!({
            "avatar": {"ui:options": {"output": "base64"}}
        }))
        .unwrap();
        let schema = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "avatar": {"type": "string", "format": "file"},
                "doc": {"type": "string", "format": "file"}
            }
        }))
        .unwrap();
        let mut form: FormController = FormBuilder::new(schema).ui_schema(ui).build();

        let doc = RawFile::new("a.txt", "text/plain", b"hi".to_vec());
        assert!(form.select_file("doc", doc.clone()).is_none());
        assert_eq!(form.state().get("doc"), Some(&FormValue::File(doc)));

        let first = form
            .select_file("avatar", RawFile::new("1.png", "image/png", vec![1]))
            .unwrap();
        let second = form
            .select_file("avatar", RawFile::new("2.png", "image/png", vec![2]))
            .unwrap();
        assert_eq!(form.state().get("avatar"), Some(&FormValue::Null));

        let second = tokio_test::block_on(second.read()).unwrap();
        let first = tokio_test::block_on(first.read()).unwrap();
        assert!(form.complete_file_read(second));
        assert!(!form.complete_file_read(first));
        assert_eq!(
            form.state().get("avatar"),
            Some(&FormValue::from("data:image/png;base64,Ag=="))
        );
    }

    #[test]
    fn test_render_through_controller() {
        let form: FormController = FormBuilder::new(schema()).build();
        let lines = form.render(&TextBackend);
        assert!(lines.contains(&"name* (text) = \"anon\"".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("[Submit]"));
    }
}
