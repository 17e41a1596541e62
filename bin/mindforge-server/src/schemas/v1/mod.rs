pub mod content;
pub mod task;

/// Conversion from a core record to its wire representation.
pub trait ToResponse {
    type Response;

    fn to_response(&self) -> Self::Response;
}
