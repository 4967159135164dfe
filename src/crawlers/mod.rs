pub mod crawler;
pub mod engine;
pub mod pool;
pub mod web;

#[cfg(test)]
pub(crate) mod stub;
