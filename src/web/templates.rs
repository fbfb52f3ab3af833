use minijinja::Environment;
use tracing::error;

pub fn init_templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();

    env.add_template("index.html", include_str!("../../templates/index.html"))?;
    env.add_template("error.html", include_str!("../../templates/error.html"))?;

    Ok(env)
}

pub fn render_template<S: serde::Serialize>(
    env: &Environment,
    template_name: &str,
    context: S,
) -> Result<String, String> {
    let template = env.get_template(template_name).map_err(|e| {
        error!("Template not found: {} ({})", template_name, e);
        format!("Template not found: {}", template_name)
    })?;

    template.render(context).map_err(|e| {
        error!("Template render error: {}", e);
        e.to_string()
    })
}
