#![forbid(unsafe_code)]

pub mod admm;
pub mod kkt;
pub mod prox;
pub mod term;

pub use admm::{admm_step, objective, optimize, residual, Workspace};
pub use kkt::KktSystem;
pub use prox::{prox_step, ProxCache};
pub use term::{term_cache_for, ConvergeTermCache, FirstVarsTermCache, TermCache, TermStatus};
