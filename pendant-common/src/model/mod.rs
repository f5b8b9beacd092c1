// src/model/mod.rs
pub mod module;

pub use module::ModuleIdentity;
