pub mod analyser;
pub mod decode;
pub mod graph;
pub mod media;
