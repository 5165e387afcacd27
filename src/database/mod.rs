pub mod db;

pub use db::{BatchFailure, BatchReport};
