//! Template rendering for dynamic responses.
//!
//! When templating is enabled, a response file is treated as a Handlebars
//! template and rendered against the request body parsed as JSON, so
//! `Hello {{name}}` with body `{"name":"world"}` produces `Hello world`.
//! Any failure (non-UTF-8 template, unparsable body, bad template syntax)
//! falls back to the verbatim file bytes.

use handlebars::Handlebars;
use tracing::debug;

/// Handlebars-backed renderer. The template source comes from the cache or
/// disk per request; only the engine itself is long-lived.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.register_helper("now", Box::new(now_helper));
        handlebars.register_helper("uuid", Box::new(uuid_helper));

        // Responses are raw bodies, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render `template` against `body` parsed as JSON.
    ///
    /// Returns `None` when rendering is not possible; the caller serves the
    /// template bytes verbatim in that case.
    pub fn render(&self, template: &[u8], body: &[u8]) -> Option<Vec<u8>> {
        let source = std::str::from_utf8(template).ok()?;
        let context: serde_json::Value = serde_json::from_slice(body).ok()?;

        match self.handlebars.render_template(source, &context) {
            Ok(rendered) => Some(rendered.into_bytes()),
            Err(err) => {
                debug!(error = %err, "template render failed, serving verbatim");
                None
            }
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn now_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let format = h
        .param(0)
        .and_then(|v| v.value().as_str())
        .unwrap_or("%Y-%m-%dT%H:%M:%S%.3fZ");
    out.write(&chrono::Utc::now().format(format).to_string())?;
    Ok(())
}

fn uuid_helper(
    _: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let uuid = format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        rng.gen::<u32>(),
        rng.gen::<u16>(),
        rng.gen::<u16>() & 0x0fff,
        (rng.gen::<u16>() & 0x3fff) | 0x8000,
        rng.gen::<u64>() & 0xffffffffffff,
    );
    out.write(&uuid)?;
    Ok(())
}
