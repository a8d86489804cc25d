use actix_web::{http, HttpResponse};
use serde::Serialize;

/// Describes an empty form page: which form it is and the fields it submits.
#[derive(Serialize)]
pub struct FormView {
    pub form: &'static str,
    pub fields: &'static [&'static str],
}

impl FormView {
    pub const fn new(form: &'static str, fields: &'static [&'static str]) -> FormView {
        FormView { form, fields }
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((http::header::LOCATION, location))
        .finish()
}

/// Returns `None` for missing or blank form values.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Like [non_blank] but keeps the value untouched, for secrets.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{non_blank, non_empty};

    #[test]
    async fn blank_values() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" aapl ".to_string())), Some("aapl".to_string()));
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some(" pw ".to_string())), Some(" pw ".to_string()));
    }
}
