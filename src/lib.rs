pub mod assemble;
pub mod batch;
pub mod error;
pub mod measure;
pub mod musicxml;
pub mod palette;
pub mod partition;
pub mod random;
pub mod render;
pub mod score;
pub mod validate;

pub use assemble::{assemble_score, assemble_score_in};
pub use batch::{run_batch, run_batch_with, BatchConfig, BatchReport, RawBatchConfig};
pub use error::*;
pub use measure::{generate_measure, generate_measure_from};
pub use musicxml::to_musicxml;
pub use partition::{partition, partition_from};
pub use random::{create_rng, derive_piece_seed, RandomSource};
pub use render::{Renderer, VerovioCli};
pub use score::*;
pub use validate::validate;

/// Generate one score from a seed.
/// This is the main entry point for the library.
pub fn generate(seed: u64) -> Result<Score, IncipitError> {
    assemble_score(&mut create_rng(seed))
}

/// Generate one score from a seed and serialize it to MusicXML.
pub fn generate_musicxml(seed: u64) -> Result<String, IncipitError> {
    let score = generate(seed)?;
    to_musicxml(&score)
}
