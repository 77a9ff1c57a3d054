use core::panic;
use std::sync::OnceLock;

use tera::Tera;
use tracing::info;

#[cfg(not(test))]
const TEMPLATES_GLOB: &str = "templates/**/*";
#[cfg(test)]
const TEMPLATES_GLOB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*");

#[derive(Debug)]
pub struct TemplateManager {
    tera: &'static Tera,
}

impl TemplateManager {
    pub fn init() -> Self {
        info!(
            "{:<20} - Initializing the Template manager",
            "templ manager"
        );
        static TERA: OnceLock<Tera> = OnceLock::new();
        let tera = TERA.get_or_init(|| {
            Tera::new(TEMPLATES_GLOB).unwrap_or_else(|e| panic!("Parsing error(s): {e}"))
        });
        Self { tera }
    }

    /// A helper function to render a template file from 'html/' directory to String
    pub fn render_html_to_string(
        &self,
        ctx: &tera::Context,
        template_file: &str,
    ) -> Result<String, tera::Error> {
        let template = format!("html/{template_file}");
        self.tera.render(&template, ctx)
    }
}
