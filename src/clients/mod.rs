pub mod submit_client;

pub use submit_client::SubmitClient;
