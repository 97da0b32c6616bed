use super::{
    Backend, ControlKind, ControlProps, FrameProps, GroupProps, SectionProps, TemplateProps,
};
use crate::value::FormValue;

const INDENT: &str = "  ";

/// Renders a form as an indented plain-text outline, one line per item.
///
/// Used by the `outline` command and handy in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBackend;

fn indent(lines: Vec<String>) -> impl Iterator<Item = String> {
    lines.into_iter().map(|l| format!("{INDENT}{l}"))
}

fn describe(value: &FormValue) -> String {
    match value {
        FormValue::File(file) => format!("<file {} ({} bytes)>", file.name, file.size()),
        other => other.to_json().to_string(),
    }
}

fn errors(errors: &[String]) -> impl Iterator<Item = String> + '_ {
    errors.iter().map(|e| format!("{INDENT}! {e}"))
}

impl Backend for TextBackend {
    type Output = Vec<String>;

    fn control(&self, kind: ControlKind, props: &ControlProps<'_>) -> Self::Output {
        let mut line = String::new();
        if props.show_label {
            line.push_str(props.label());
            if props.is_required {
                line.push('*');
            }
            line.push(' ');
        }
        line.push_str(&format!("({})", kind.name()));
        if let Some(value) = props.value().filter(|v| !v.is_null()) {
            line.push_str(&format!(" = {}", describe(value)));
        } else if let Some(placeholder) = props.placeholder() {
            line.push_str(&format!(" [{placeholder}]"));
        }

        let mut out = vec![line];
        out.extend(
            props
                .choices
                .iter()
                .map(|c| format!("{INDENT}- {}", c.label)),
        );
        out.extend(errors(props.field_errors()));
        out
    }

    fn widget_frame(&self, frame: &FrameProps<'_>, inner: Self::Output) -> Self::Output {
        let mut out = Vec::new();
        if let Some(label) = frame.label {
            let star = if frame.is_required { "*" } else { "" };
            out.push(format!("{label}{star}"));
        }
        out.extend(indent(inner));
        out.extend(errors(frame.errors));
        out
    }

    fn field_frame(&self, _layout_class: &str, inner: Self::Output) -> Self::Output {
        inner
    }

    fn unsupported(&self, field: &str) -> Self::Output {
        vec![format!("Unsupported field schema for field {field}")]
    }

    fn group(&self, group: &GroupProps<'_>, children: Vec<Self::Output>) -> Self::Output {
        let star = if group.is_required { "*" } else { "" };
        let mut out = vec![format!("{}{star}:", group.title.unwrap_or(group.name))];
        if let Some(description) = group.description {
            out.push(format!("{INDENT}# {description}"));
        }
        out.extend(indent(children.concat()));
        out
    }

    fn section(&self, section: &SectionProps<'_>, children: Vec<Self::Output>) -> Self::Output {
        let rule = if section.nested { "--" } else { "==" };
        let head = match section.title {
            Some(title) => format!("{rule} {title} {rule}"),
            None => rule.to_string(),
        };
        let mut out = vec![head];
        out.extend(indent(children.concat()));
        out
    }

    fn content(&self, children: Vec<Self::Output>) -> Self::Output {
        children.concat()
    }

    fn page(&self, props: TemplateProps<'_, Self::Output>) -> Self::Output {
        let mut out = Vec::new();
        if let Some(title) = props.schema.title.as_deref() {
            out.push(format!("# {title}"));
        }
        if let Some(description) = props.schema.description.as_deref() {
            out.push(description.to_string());
        }
        out.extend(props.content);
        if !props.submit_button.hide {
            out.push(format!("[{}]", props.submit_button.text()));
        }
        if props.reset_button.show {
            out.push(format!("[{}]", props.reset_button.text()));
        }
        if let Some(footer) = props.schema.footer_content.as_deref() {
            out.push(footer.to_string());
        }
        out
    }
}
