pub mod config;
pub mod embed;
pub mod matching;
pub mod semantic;
pub mod visual;
