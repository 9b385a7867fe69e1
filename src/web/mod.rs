pub mod admin;
pub mod channels;
pub mod error;
pub mod reviews;
pub mod tags;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    admin::configure(conf);
    channels::configure(conf);
    reviews::configure(conf);
    tags::configure(conf);
}
