pub mod aim_vector;
pub mod blob_locator;
pub mod color;
pub mod color_mask;
pub mod frame;
