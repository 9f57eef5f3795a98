pub mod cohere_service;
pub mod ollama_service;
pub mod open_ai_service;
