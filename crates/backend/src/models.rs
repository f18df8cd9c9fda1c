// Database models for Diesel
use diesel::prelude::*;

/// Insertable struct for users created on first sign-in.
/// `id` and `created_at` are filled in by column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
}
