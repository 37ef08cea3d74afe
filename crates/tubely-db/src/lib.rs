//! Tubely database access

pub mod db;

pub use db::{PgVideoRepository, VideoRepository};
