use std::{any::Any, fmt};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;
use uuid::Uuid;

use crate::scheduler::job::panic_message;

use super::document;

/// Recovery page shown when rendering a page fails.
///
/// Building one logs the error together with a reference that is also shown
/// to the user, so reports can be matched to log lines.
#[derive(Debug)]
pub struct ErrorPage {
    reference: Uuid,
}

impl ErrorPage {
    pub fn new(error: &dyn fmt::Display) -> Self {
        let reference = Uuid::new_v4();
        error!(%reference, "{error}");
        Self { reference }
    }

    pub fn reference(&self) -> Uuid {
        self.reference
    }

    fn render(&self) -> String {
        document(
            "Bir şeyler ters gitti!",
            &format!(
                "<main class=\"error\">\
                 <h2>Bir şeyler ters gitti!</h2>\
                 <p>Beklenmeyen bir hata oluştu. Lütfen tekrar deneyin.</p>\
                 <p class=\"error-reference\">Hata kodu: {reference}</p>\
                 <button type=\"button\" onclick=\"window.location.reload()\">\
                 Tekrar Dene\
                 </button>\
                 </main>",
                reference = self.reference,
            ),
        )
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Html(self.render())).into_response()
    }
}

/// Turns a handler panic into the error page.
pub fn from_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(panic.as_ref());
    ErrorPage::new(&format_args!("page handler panicked: {message}"))
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_retry_action_and_reference() {
        let page = ErrorPage::new(&"boom");
        let html = page.render();

        assert!(html.contains("Bir şeyler ters gitti!"));
        assert!(html.contains("Tekrar Dene"));
        assert!(html.contains(&page.reference().to_string()));
        assert!(!html.contains("boom"));
    }

    #[test]
    fn panic_becomes_internal_server_error() {
        let response = from_panic(Box::new("kaboom"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
