//! `eval`: evaluate a small, safe expression subset against the
//! already-rendered `expression` text and store the result in
//! `vars[var]`. Grounded in `pseudoflow/steps/eval.py`: the original
//! supports `json(...)`, `str(...)`, `int(...)`, `bool(...)`, bare
//! list/dict literals, and a fallback that stores the text as-is when
//! nothing else parses.

use crate::error::EngineError;
use crate::model::Context;
use crate::Result;
use serde_json::Value;

pub fn eval(ctx: &mut Context, var: &str, rendered_expression: &str) -> Result<()> {
    let value = evaluate(rendered_expression)?;
    ctx.vars.insert(var.to_string(), value);
    Ok(())
}

fn evaluate(expr: &str) -> Result<Value> {
    let trimmed = expr.trim();

    if let Some(inner) = call_body(trimmed, "json") {
        return serde_json::from_str(inner.trim()).map_err(EngineError::Json);
    }
    if let Some(inner) = call_body(trimmed, "str") {
        return Ok(Value::String(inner.trim().to_string()));
    }
    if let Some(inner) = call_body(trimmed, "int") {
        let n: i64 = inner
            .trim()
            .parse()
            .map_err(|_| EngineError::bad_step(format!("eval: int(...) argument is not an integer: {inner}")))?;
        return Ok(Value::from(n));
    }
    if let Some(inner) = call_body(trimmed, "bool") {
        return match inner.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(EngineError::bad_step(format!(
                "eval: bool(...) argument is not true/false: {other}"
            ))),
        };
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).map_err(EngineError::Json);
    }

    // Fallback: try to parse as JSON (numbers, booleans, quoted strings);
    // otherwise keep the text verbatim, matching the Python original's
    // `json.dumps`-on-failure behavior of never raising on plain text.
    Ok(serde_json::from_str::<Value>(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
}

/// `name(body)` → `Some(body)`, else `None`.
fn call_body<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let prefix_len = name.len() + 1;
    if s.len() >= prefix_len + 1 && s.starts_with(name) && s.as_bytes()[name.len()] == b'(' && s.ends_with(')') {
        Some(&s[prefix_len..s.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_call_parses_structured_value() {
        let mut ctx = Context::new("default", None);
        eval(&mut ctx, "v", "json([1, 2, 3])").unwrap();
        assert_eq!(ctx.vars["v"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn str_call_keeps_text_as_string() {
        let mut ctx = Context::new("default", None);
        eval(&mut ctx, "v", "str(42)").unwrap();
        assert_eq!(ctx.vars["v"], serde_json::json!("42"));
    }

    #[test]
    fn int_call_parses_integer() {
        let mut ctx = Context::new("default", None);
        eval(&mut ctx, "v", "int(42)").unwrap();
        assert_eq!(ctx.vars["v"], serde_json::json!(42));
    }

    #[test]
    fn int_call_rejects_non_integer() {
        let mut ctx = Context::new("default", None);
        assert!(eval(&mut ctx, "v", "int(abc)").is_err());
    }

    #[test]
    fn bool_call_parses_true_false() {
        let mut ctx = Context::new("default", None);
        eval(&mut ctx, "v", "bool(true)").unwrap();
        assert_eq!(ctx.vars["v"], serde_json::json!(true));
    }

    #[test]
    fn bare_list_literal_parses_as_json() {
        let mut ctx = Context::new("default", None);
        eval(&mut ctx, "v", "[1, 2]").unwrap();
        assert_eq!(ctx.vars["v"], serde_json::json!([1, 2]));
    }

    #[test]
    fn unrecognized_text_falls_back_to_string() {
        let mut ctx = Context::new("default", None);
        eval(&mut ctx, "v", "not json at all").unwrap();
        assert_eq!(ctx.vars["v"], serde_json::json!("not json at all"));
    }
}
