pub mod auth_header;
