pub mod graph;
pub mod relay;

#[cfg(test)]
pub mod testing;
