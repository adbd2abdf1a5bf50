use serde::Serialize;

use crate::cli::OutputFormat;

pub mod views;

pub use views::{AuditResponse, InitResponse, StatusResponse};

/// Human-readable rendering used by `--format text`.
pub trait TextView {
    fn text_view(&self) -> String;
}

/// Render a response to a string in the requested format.
pub fn render<T: Serialize + TextView>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(value.text_view()),
    }
}

/// Print a response in the requested format.
pub fn output<T: Serialize + TextView>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::{TextView, render};
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Example {
        id: &'static str,
        value: u32,
    }

    impl TextView for Example {
        fn text_view(&self) -> String {
            format!("{} = {}", self.id, self.value)
        }
    }

    #[test]
    fn json_render_is_valid_json() {
        let value = Example { id: "x", value: 7 };
        let out = render(&value, OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["id"], "x");
        assert_eq!(parsed["value"], 7);
    }

    #[test]
    fn text_render_uses_text_view() {
        let value = Example { id: "x", value: 7 };
        let out = render(&value, OutputFormat::Text).expect("text render should work");
        assert_eq!(out, "x = 7");
    }
}
