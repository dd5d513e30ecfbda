//! HTML fallback surfaces: the error page, the 404 page and loading
//! skeletons. All user-facing text is Turkish.

pub mod error;
pub mod loading;
pub mod not_found;

pub use self::not_found::not_found;

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html lang=\"tr\">\
         <head>\
         <meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title>\
         </head>\
         <body>{body}</body>\
         </html>"
    )
}
