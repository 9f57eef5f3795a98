pub mod forge;
pub mod health_route;
pub mod knowledgebase;
