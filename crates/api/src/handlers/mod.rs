pub mod connections;
pub mod migrations;
