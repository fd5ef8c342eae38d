pub mod allocator;
pub mod product;
pub mod user;
