// Hosted table shapes, as the backend sends and accepts them
pub mod raw;
// Canonical shape used by filtering, sorting and display
pub mod product;
