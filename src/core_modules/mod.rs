pub mod color_metric;
pub mod edge_detection;
pub mod neighbor_settle;
pub mod pixel;
pub mod pixel_buffer;
pub mod region;
pub mod region_enumerator;
pub mod region_sorter;
pub mod sort_algorithm;
pub mod utils;
