use axum::response::Html;

use super::document;

const CARD: &str = "<div class=\"skeleton-card\">\
                    <div class=\"skeleton-line skeleton-line--title\"></div>\
                    <div class=\"skeleton-line\"></div>\
                    <div class=\"skeleton-line skeleton-line--short\"></div>\
                    </div>";

/// Placeholder for the weekly check-in page while its data loads.
pub async fn weekly_checkin() -> Html<String> {
    let body = format!(
        "<main class=\"skeleton\" aria-busy=\"true\" aria-label=\"Yükleniyor\">\
         <div class=\"skeleton-line skeleton-line--heading\"></div>\
         {cards}\
         </main>",
        cards = CARD.repeat(3),
    );
    Html(document("Yükleniyor", &body))
}
