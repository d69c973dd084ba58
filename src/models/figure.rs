//! JSON figure served by the returns-graph endpoint

use serde::Deserialize;
use serde_json::Value;

/// A figure: traces plus layout. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Figure {
    #[serde(default)]
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Layout,
}

/// One named series, typically one person's returns or the index
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub x: Vec<Value>,
    #[serde(default)]
    pub y: Vec<Option<f64>>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// `true`, `false` or `"legendonly"`
    #[serde(default)]
    pub visible: Option<Value>,
}

impl Trace {
    pub fn is_visible(&self) -> bool {
        match &self.visible {
            Some(Value::Bool(false)) => false,
            Some(Value::String(s)) if s == "legendonly" => false,
            _ => true,
        }
    }

    /// Only line-like scatter traces are drawn; a missing type means scatter
    pub fn is_line(&self) -> bool {
        matches!(self.kind.as_deref(), None | Some("scatter") | Some("scattergl"))
    }

    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("trace {}", index))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Layout {
    /// Either a plain string or `{"text": ...}`
    #[serde(default)]
    pub title: Option<Value>,
}

impl Layout {
    pub fn title_text(&self) -> Option<String> {
        match &self.title {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(obj)) => obj.get("text").and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_figure_from_json() {
        let figure: Figure = serde_json::from_value(json!({
            "data": [
                {"name": "My Returns", "type": "scatter", "x": ["2021-01-04", "2021-01-05"], "y": [1.5, null]},
                {"name": "S&P500", "visible": "legendonly", "x": [], "y": []}
            ],
            "layout": {"title": {"text": "All"}, "showlegend": true}
        }))
        .unwrap();

        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[0].y, vec![Some(1.5), None]);
        assert!(figure.data[0].is_visible());
        assert!(!figure.data[1].is_visible());
        assert!(figure.data[0].is_line() && figure.data[1].is_line());
        assert_eq!(figure.layout.title_text().as_deref(), Some("All"));
    }

    #[test]
    fn test_missing_sections_default() {
        let figure: Figure = serde_json::from_value(json!({})).unwrap();
        assert!(figure.data.is_empty());
        assert_eq!(figure.layout.title_text(), None);
    }
}
