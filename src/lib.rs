// Module layout (Clean Architecture style)
// - bootstrap: configuration and service wiring
// - infrastructure: Postgres repositories, object storage, code delivery
// - presentation: HTTP handlers and routing
// - application: ports, use cases and shared services (jwt, passwords, uploads)
// - domain: users, images, tokens, roles, verification codes

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
