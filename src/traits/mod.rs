mod transforms;

pub use transforms::Transforms;
