pub mod clock;
pub mod job;
pub mod pipeline;
pub mod sizing;

#[cfg(test)]
pub(crate) mod testing;
