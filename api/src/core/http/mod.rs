pub mod response_envelope;
pub mod sse;
