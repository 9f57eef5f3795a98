pub mod forge_request;
pub mod forge_route;
