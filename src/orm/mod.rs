pub mod admin_users;
pub mod channel_tags;
pub mod channels;
pub mod reviews;
pub mod sessions;
pub mod tag_suggestions;
pub mod tags;
