//! Email template registry and rendering.
//!
//! Templates are addressed by a closed enum, so a missing template is a
//! configuration error caught at startup rather than a runtime lookup miss.
//! Rendering substitutes `{{field}}` and `{{nested.field}}` placeholders
//! from a JSON context, then wraps the fragment in a fixed HTML layout.

use std::collections::HashMap;

use thiserror::Error;

/// Identifier for every email template the system can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    PaymentConfirmation,
    PaymentFailure,
    PaymentRefund,
}

impl TemplateId {
    /// All known templates, used for startup validation.
    pub const ALL: [TemplateId; 3] = [
        TemplateId::PaymentConfirmation,
        TemplateId::PaymentFailure,
        TemplateId::PaymentRefund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentConfirmation => "payment_confirmation",
            Self::PaymentFailure => "payment_failure",
            Self::PaymentRefund => "payment_refund",
        }
    }
}

/// Errors from template registration and rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not registered: {0}")]
    MissingTemplate(&'static str),
}

const PAYMENT_CONFIRMATION_BODY: &str = r#"<h2>Potwierdzenie płatności</h2>
<p>Dziękujemy! Twoja płatność została zrealizowana pomyślnie.</p>
<table>
  <tr><td><strong>Intencja:</strong></td><td>{{intention}}</td></tr>
  <tr><td><strong>Data Mszy:</strong></td><td>{{mass_date}}</td></tr>
  <tr><td><strong>Godzina:</strong></td><td>{{mass_time}}</td></tr>
  <tr><td><strong>Kwota:</strong></td><td>{{amount}}</td></tr>
  <tr><td><strong>Metoda płatności:</strong></td><td>{{method}}</td></tr>
</table>
<p>Numer płatności: {{payment.id}}</p>"#;

const PAYMENT_FAILURE_BODY: &str = r#"<h2>Problem z płatnością</h2>
<p>Niestety nie udało się zrealizować Twojej płatności.</p>
<p><strong>Powód:</strong> {{error}}</p>
<p><strong>Kwota:</strong> {{amount}}</p>
<p>Prosimy spróbować ponownie lub skontaktować się z kancelarią parafialną.</p>
<p>Numer płatności: {{payment.id}}</p>"#;

const PAYMENT_REFUND_BODY: &str = r#"<h2>Potwierdzenie zwrotu płatności</h2>
<p>Twoja płatność została zwrócona.</p>
<p><strong>Intencja:</strong> {{intention}}</p>
<p><strong>Kwota zwrotu:</strong> {{amount}}</p>
<p>Środki powinny pojawić się na Twoim koncie w ciągu kilku dni roboczych.</p>
<p>Numer płatności: {{payment.id}}</p>"#;

/// Mapping from template identifiers to template bodies.
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, &'static str>,
}

impl TemplateRegistry {
    /// Registry with the built-in payment templates.
    pub fn with_defaults() -> Self {
        let mut templates = HashMap::new();
        templates.insert(TemplateId::PaymentConfirmation, PAYMENT_CONFIRMATION_BODY);
        templates.insert(TemplateId::PaymentFailure, PAYMENT_FAILURE_BODY);
        templates.insert(TemplateId::PaymentRefund, PAYMENT_REFUND_BODY);
        Self { templates }
    }

    /// Verifies every known template id has a registered body.
    ///
    /// Run at startup; a missing template aborts the process before the
    /// webhook route is served.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for id in TemplateId::ALL {
            if !self.templates.contains_key(&id) {
                return Err(TemplateError::MissingTemplate(id.as_str()));
            }
        }
        Ok(())
    }

    /// Renders a template fragment against the given context.
    pub fn render(
        &self,
        id: TemplateId,
        context: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        let body = self
            .templates
            .get(&id)
            .ok_or(TemplateError::MissingTemplate(id.as_str()))?;
        Ok(substitute_placeholders(body, context))
    }

    /// Renders a template and wraps it in the standard email layout.
    pub fn render_page(
        &self,
        id: TemplateId,
        title: &str,
        context: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        let fragment = self.render(id, context)?;
        Ok(wrap_layout(title, &fragment))
    }
}

/// Replaces `{{path}}` placeholders with values looked up in `context`.
///
/// Paths are flat keys or dot-separated for nested objects. Missing or
/// non-scalar values render as an empty string.
pub fn substitute_placeholders(template: &str, context: &serde_json::Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let path = after[..end].trim();
                out.push_str(&lookup_path(context, path));
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder, emit verbatim
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn lookup_path(context: &serde_json::Value, path: &str) -> String {
    let mut current = context;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(value) => current = value,
            None => return String::new(),
        }
    }
    match current {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Wraps rendered content in the fixed Oremus email layout.
pub fn wrap_layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pl">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
</head>
<body style="margin:0;padding:0;background-color:#f4f4f4;font-family:Arial,sans-serif;">
  <div style="max-width:600px;margin:0 auto;background-color:#ffffff;">
    <div style="background-color:#1a237e;color:#ffffff;padding:24px;text-align:center;">
      <h1 style="margin:0;font-size:24px;">Oremus</h1>
    </div>
    <div style="padding:24px;color:#333333;line-height:1.6;">
{body}
    </div>
    <div style="padding:16px 24px;background-color:#f4f4f4;color:#888888;font-size:12px;text-align:center;">
      <p>Wiadomość wygenerowana automatycznie, prosimy na nią nie odpowiadać.</p>
    </div>
  </div>
</body>
</html>"#
    )
}

/// Derives a plain-text body by stripping markup from rendered HTML.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                in_tag = true;
            }
            '>' if in_tag => {
                in_tag = false;
            }
            '&' if !in_tag => {
                // Decode the handful of entities our templates produce
                let mut entity = String::new();
                while let Some(&next) = chars.peek() {
                    if next == ';' {
                        chars.next();
                        break;
                    }
                    if entity.len() > 8 || next == '&' || next == '<' {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                match entity.as_str() {
                    "amp" => text.push('&'),
                    "lt" => text.push('<'),
                    "gt" => text.push('>'),
                    "nbsp" => text.push(' '),
                    "quot" => text.push('"'),
                    other => {
                        text.push('&');
                        text.push_str(other);
                    }
                }
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    // Collapse runs of blank lines and trim each line
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
