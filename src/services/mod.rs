pub mod catalog;
pub mod categorizer;
pub mod fetcher;
pub mod m3u_parser;
pub mod merger;
pub mod url_validator;
