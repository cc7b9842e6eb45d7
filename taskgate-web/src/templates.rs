/// HTML views
///
/// Templates are embedded at compile time and rendered with minijinja, with
/// HTML auto-escaping on. Every view receives:
///
/// - `user`: email of the signed-in user, or none
/// - `success` / `error`: flash texts drained for this request
///
/// plus its own data (see [`View`]).

use minijinja::{Environment, Value};

/// Renders a named template with a data context
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error>;
}

/// The pages the app can render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Main,
    Register,
    /// Extra context: `login_error`
    Login,
    /// Extra context: `tasks`
    Dashboard,
}

impl View {
    pub fn template_name(self) -> &'static str {
        match self {
            View::Main => "main.html",
            View::Register => "register.html",
            View::Login => "login.html",
            View::Dashboard => "dashboard.html",
        }
    }
}

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("main.html", include_str!("../templates/main.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
];

/// [`TemplateEngine`] over the embedded templates
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// Compiles the embedded templates
    ///
    /// # Errors
    ///
    /// Returns an error if a template has a syntax error.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error> {
        self.env.get_template(template_name)?.render(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn engine() -> MiniJinjaEngine {
        MiniJinjaEngine::new().expect("embedded templates should compile")
    }

    #[test]
    fn test_every_view_renders_anonymous() {
        let engine = engine();
        for view in [View::Main, View::Register, View::Login, View::Dashboard] {
            let html = engine
                .render(
                    view.template_name(),
                    context! { user => Value::from(()), success => Vec::<String>::new(), error => Vec::<String>::new(), tasks => Vec::<String>::new() },
                )
                .unwrap_or_else(|e| panic!("{} failed: {:#}", view.template_name(), e));
            assert!(html.contains("<html"));
        }
    }

    #[test]
    fn test_flash_messages_rendered_and_escaped() {
        let html = engine()
            .render(
                "login.html",
                context! {
                    success => vec!["user created successfully, please login"],
                    error => vec!["<script>alert(1)</script>"],
                },
            )
            .unwrap();

        assert!(html.contains("user created successfully, please login"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_nav_reflects_user() {
        let engine = engine();

        let anonymous = engine.render("main.html", context! {}).unwrap();
        assert!(anonymous.contains("href=\"/login\""));
        assert!(!anonymous.contains("href=\"/logout\""));

        let signed_in = engine
            .render("main.html", context! { user => "u@x.com" })
            .unwrap();
        assert!(signed_in.contains("href=\"/logout\""));
        assert!(signed_in.contains("u@x.com"));
    }

    #[test]
    fn test_unknown_template_is_error() {
        assert!(engine().render("missing.html", context! {}).is_err());
    }
}
