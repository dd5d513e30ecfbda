use axum::{http::StatusCode, response::Html};

use super::document;

pub async fn not_found() -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(document(
            "Sayfa Bulunamadı",
            "<main class=\"not-found\">\
             <h1>404</h1>\
             <h2>Sayfa Bulunamadı</h2>\
             <p>Aradığınız sayfa mevcut değil veya taşınmış olabilir.</p>\
             <a href=\"/\">Ana Sayfaya Dön</a>\
             </main>",
        )),
    )
}
