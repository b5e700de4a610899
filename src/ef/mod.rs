pub mod consumption;
/// Ordered pipeline over all timesteps.
pub mod engine;
pub mod interchange;
pub mod summary;
pub mod supply;
/// Emission-rate and neighbour-factor tables.
pub mod tables;
/// Technology vocabulary and the per-timestep aggregator.
pub mod technology;
pub mod timestep;
