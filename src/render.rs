use minijinja::Environment;
use serde_json::Value;

/// Writes a named template filled with `data` into `out`.
pub trait Renderer: Send + Sync {
    fn render(&self, out: &mut Vec<u8>, name: &str, data: &Value) -> anyhow::Result<()>;
}

/// [`Renderer`] backed by a `minijinja` environment.
///
/// Templates are registered up front, before the renderer is installed on
/// the app.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Compile and register a template under `name`.
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) -> anyhow::Result<()> {
        self.env.add_template_owned(name.into(), source.into())?;
        Ok(())
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, out: &mut Vec<u8>, name: &str, data: &Value) -> anyhow::Result<()> {
        let rendered = self.env.get_template(name)?.render(data)?;
        out.extend_from_slice(rendered.as_bytes());
        Ok(())
    }
}
