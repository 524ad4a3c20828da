//! Extraction of server-rendered form defaults.
//!
//! The app creation form pre-selects volume, flavor and environment options
//! server-side; the creation workflow reads the first option value of each
//! named `<select>` before submitting.

use scraper::{Html, Selector};

/// Extract the value of the first `<option>` under `<select name="field">`.
///
/// Returns `None` when the select or its options are absent, or the option
/// carries no value attribute.
pub fn extract_option_value(html: &str, field: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(r#"select[name="{}"] option"#, field)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|option| option.value().attr("value"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <html><body><form>
          <select name="volume" class="form-control" id="id_volume">
            <option value="12">1 GB</option>
            <option value="13">5 GB</option>
          </select>
          <select name="flavor" class="form-control" id="id_flavor">
            <option value="28" selected>2 vCPU, 4 GB RAM</option>
          </select>
          <select name="environment" id="id_environment">
            <option value="7">Default environment</option>
          </select>
        </form></body></html>
    "#;

    #[test]
    fn test_extracts_first_option_value() {
        assert_eq!(extract_option_value(FORM, "volume"), Some("12".to_string()));
        assert_eq!(extract_option_value(FORM, "flavor"), Some("28".to_string()));
        assert_eq!(
            extract_option_value(FORM, "environment"),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_missing_select_yields_none() {
        assert_eq!(extract_option_value(FORM, "accelerator"), None);
    }

    #[test]
    fn test_option_without_value_yields_none() {
        let html = r#"<select name="volume"><option>unlabelled</option></select>"#;
        assert_eq!(extract_option_value(html, "volume"), None);
    }

    #[test]
    fn test_malformed_html_is_tolerated() {
        let html = r#"<select name="volume"><option value="9">ok"#;
        assert_eq!(extract_option_value(html, "volume"), Some("9".to_string()));
    }
}
