//! `template`: render inline `template` and either write it to `output`
//! or store it in `vars[var]`.

use crate::error::EngineError;
use crate::model::Context;
use crate::Result;

pub fn template(ctx: &mut Context, rendered: &str, output: Option<&str>, var: Option<&str>) -> Result<()> {
    if output.is_none() && var.is_none() {
        return Err(EngineError::bad_step(
            "template requires either `output` or `var`",
        ));
    }
    if let Some(path) = output {
        std::fs::write(path, rendered).map_err(EngineError::Io)?;
    }
    if let Some(var) = var {
        ctx.vars.insert(var.to_string(), serde_json::Value::String(rendered.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_rendered_text_in_vars() {
        let mut ctx = Context::new("default", None);
        template(&mut ctx, "hello world", None, Some("greeting")).unwrap();
        assert_eq!(ctx.vars["greeting"], "hello world");
    }

    #[test]
    fn requires_output_or_var() {
        let mut ctx = Context::new("default", None);
        assert!(template(&mut ctx, "hello", None, None).is_err());
    }
}
