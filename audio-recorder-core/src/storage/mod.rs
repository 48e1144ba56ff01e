pub mod container_writer;
pub mod segment;
pub mod segment_sink;
